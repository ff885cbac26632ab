use std::future::Future;
use std::time::Duration;

/// Standard DNS port used when an address carries no explicit port
pub const DNS_PORT: u16 = 53;

/// Configuration for a single nameserver as supplied by a loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
	pub address: String,
	pub label: String,
	pub country: String,
}

impl ResolverConfig {
	pub fn new(address: impl Into<String>, label: impl Into<String>, country: impl Into<String>) -> Self {
		ResolverConfig {
			address: address.into(),
			label: label.into(),
			country: country.into(),
		}
	}
}

/// Outcome of a single DNS exchange against one nameserver.
///
/// Every variant except `ConnectionFailed` and `BadQuery` carries the elapsed
/// wall time.
#[derive(Debug, Clone)]
pub enum ExchangeOutcome {
	/// A well-formed response arrived
	Answered {
		elapsed: Duration,
		rcode: String,
	},
	/// A response arrived but carried an error rcode
	Invalid {
		elapsed: Duration,
		reason: String,
	},
	/// No response before the deadline
	TimedOut {
		elapsed: Duration,
	},
	/// The exchange could not be performed at all
	ConnectionFailed {
		reason: String,
	},
	/// No query could be built for the domain; nothing was sent
	BadQuery {
		reason: String,
	},
}

impl ExchangeOutcome {
	pub fn elapsed(&self) -> Option<Duration> {
		match self {
			ExchangeOutcome::Answered { elapsed, .. }
			| ExchangeOutcome::Invalid { elapsed, .. }
			| ExchangeOutcome::TimedOut { elapsed } => Some(*elapsed),
			ExchangeOutcome::ConnectionFailed { .. } | ExchangeOutcome::BadQuery { .. } => None,
		}
	}
}

/// The DNS client capability the benchmark runner drives.
///
/// Sends one A/IN query for `fqdn` to the nameserver at `address`.
pub trait DnsExchange: Send + Sync {
	fn exchange(&self, fqdn: &str, address: &str) -> impl Future<Output = ExchangeOutcome> + Send;
}

/// Receives one notification per attempted (domain, nameserver) pair
pub trait ProgressReporter: Send + Sync {
	fn tick(&self);
}

impl ProgressReporter for () {
	fn tick(&self) {}
}

impl ProgressReporter for indicatif::ProgressBar {
	fn tick(&self) {
		self.inc(1);
	}
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
	pub timeout: Duration,
	/// Maximum in-flight queries per domain sweep; 1 means strictly sequential
	pub max_inflight: usize,
}

impl Default for BenchmarkConfig {
	fn default() -> Self {
		BenchmarkConfig {
			timeout: Duration::from_secs(2),
			max_inflight: 1,
		}
	}
}

/// Configuration for the preparation phase (what gets loaded into the stores)
#[derive(Debug, Clone, Default)]
pub struct PrepareConfig {
	pub number_of_domains: usize,
	pub nameserver: Option<String>,
	pub nameserver_file: Option<String>,
	pub domain_file: Option<String>,
	pub contest: bool,
	pub seed: Option<u64>,
}
