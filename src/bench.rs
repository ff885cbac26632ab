use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::dstore::DomainStore;
use crate::error::BenchError;
use crate::nsstore::{NameserverRecord, NameserverStore};
use crate::transport::{BenchmarkConfig, DnsExchange, ExchangeOutcome, ProgressReporter};

/// Drives the domain x nameserver measurement matrix.
///
/// For a fixed domain every nameserver is queried before the next domain
/// starts, so no nameserver sees a burst of distinct domains back to back.
pub struct BenchmarkRunner<C> {
	client: C,
	config: BenchmarkConfig,
	attempts: AtomicU64,
}

impl<C: DnsExchange> BenchmarkRunner<C> {
	pub fn new(client: C, config: BenchmarkConfig) -> Self {
		BenchmarkRunner {
			client,
			config,
			attempts: AtomicU64::new(0),
		}
	}

	/// Number of (domain, nameserver) pairs attempted so far.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Run every (domain, nameserver) pair exactly once.
	///
	/// Per-query failures are folded into the nameserver counters, and a
	/// domain that cannot be encoded into a query into the domain's counter.
	/// Only an empty domain or nameserver set is an error.
	pub async fn run(
		&self,
		domains: &DomainStore,
		nameservers: &NameserverStore,
		progress: &dyn ProgressReporter,
	) -> Result<(), BenchError> {
		let domain_list = domains.snapshot();
		let nameserver_list = nameservers.snapshot();
		if domain_list.is_empty() {
			return Err(BenchError::NoDomains);
		}
		if nameserver_list.is_empty() {
			return Err(BenchError::NoNameservers);
		}

		info!(
			domains = domain_list.len(),
			nameservers = nameserver_list.len(),
			concurrency = self.config.max_inflight,
			"starting benchmark"
		);

		let semaphore = Arc::new(Semaphore::new(self.config.max_inflight.max(1)));
		for domain in &domain_list {
			if self.config.max_inflight <= 1 {
				for nameserver in &nameserver_list {
					self.measure(&domain.fqdn, nameserver, domains, nameservers, progress).await;
				}
			} else {
				// Fan out across nameservers, but finish this domain before the next
				let sweep = nameserver_list.iter().map(|nameserver| {
					let sem = semaphore.clone();
					async move {
						let _permit = sem.acquire().await;
						self.measure(&domain.fqdn, nameserver, domains, nameservers, progress).await;
					}
				});
				join_all(sweep).await;
			}
		}

		info!(attempts = self.attempts(), "benchmark finished");
		Ok(())
	}

	async fn measure(
		&self,
		fqdn: &str,
		nameserver: &NameserverRecord,
		domains: &DomainStore,
		store: &NameserverStore,
		progress: &dyn ProgressReporter,
	) {
		let address = nameserver.address.as_str();
		let outcome = self.client.exchange(fqdn, address).await;
		match &outcome {
			ExchangeOutcome::Answered { elapsed, rcode } => {
				debug!(address, fqdn, ?elapsed, rcode = rcode.as_str(), "answered");
				store.record_latency(address, *elapsed);
			}
			ExchangeOutcome::Invalid { elapsed, reason } => {
				debug!(address, fqdn, ?elapsed, reason = reason.as_str(), "invalid response");
				store.record_latency(address, *elapsed);
				store.record_validation_error(address);
			}
			ExchangeOutcome::TimedOut { elapsed } => {
				debug!(address, fqdn, ?elapsed, "timed out");
				store.record_timeout(address, *elapsed);
			}
			ExchangeOutcome::ConnectionFailed { reason } => {
				warn!(address, fqdn, reason = reason.as_str(), "connection failed");
				store.record_connection_error(address);
			}
			ExchangeOutcome::BadQuery { reason } => {
				warn!(fqdn, reason = reason.as_str(), "cannot build query for domain");
				domains.record_resolution_error(fqdn);
			}
		}
		self.attempts.fetch_add(1, Ordering::Relaxed);
		progress.tick();
	}
}
