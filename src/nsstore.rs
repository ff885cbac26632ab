use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::trace;

use crate::stats::RttStats;

/// Accumulated measurements for a single nameserver
#[derive(Debug, Clone, PartialEq)]
pub struct NameserverRecord {
	pub address: String,
	pub label: String,
	pub country: String,
	/// Number of queries that produced a timing
	pub query_count: u64,
	pub connection_errors: u64,
	pub validation_errors: u64,
	/// Queries that hit the deadline; also counted in `query_count`
	pub timeouts: u64,
	pub rtt: RttStats,
}

impl NameserverRecord {
	pub fn new(address: &str, label: &str, country: &str) -> Self {
		NameserverRecord {
			address: address.to_string(),
			label: label.to_string(),
			country: country.to_string(),
			query_count: 0,
			connection_errors: 0,
			validation_errors: 0,
			timeouts: 0,
			rtt: RttStats::default(),
		}
	}
}

#[derive(Debug, Default)]
struct Inner {
	records: Vec<NameserverRecord>,
	index: HashMap<String, usize>,
}

impl Inner {
	fn get_mut(&mut self, address: &str) -> Option<&mut NameserverRecord> {
		let idx = *self.index.get(address)?;
		self.records.get_mut(idx)
	}
}

/// Thread-safe store of nameserver records keyed by address.
///
/// Lookups take the read lock and mutations the write lock. Every update
/// touching more than one field happens under a single write acquisition.
#[derive(Debug, Default)]
pub struct NameserverStore {
	inner: RwLock<Inner>,
}

impl NameserverStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a nameserver, or refresh label and country of a known one.
	///
	/// Counters and latency statistics of an existing record are kept.
	pub fn add_or_update(&self, address: &str, label: &str, country: &str) {
		let mut inner = self.inner.write();
		if let Some(record) = inner.get_mut(address) {
			record.label = label.to_string();
			record.country = country.to_string();
			return;
		}
		let idx = inner.records.len();
		inner.records.push(NameserverRecord::new(address, label, country));
		inner.index.insert(address.to_string(), idx);
	}

	/// Fold one latency observation into the record of `address`.
	pub fn record_latency(&self, address: &str, rtt: Duration) {
		self.update(address, |record| {
			record.query_count += 1;
			record.rtt.add(rtt);
		});
	}

	/// Record a query that ran into its deadline after `rtt`.
	pub fn record_timeout(&self, address: &str, rtt: Duration) {
		self.update(address, |record| {
			record.query_count += 1;
			record.timeouts += 1;
			record.rtt.add(rtt);
		});
	}

	pub fn record_connection_error(&self, address: &str) {
		self.update(address, |record| record.connection_errors += 1);
	}

	pub fn record_validation_error(&self, address: &str) {
		self.update(address, |record| record.validation_errors += 1);
	}

	fn update(&self, address: &str, f: impl FnOnce(&mut NameserverRecord)) {
		let mut inner = self.inner.write();
		match inner.get_mut(address) {
			Some(record) => f(record),
			None => trace!(address, "ignoring update for unknown nameserver"),
		}
	}

	pub fn get(&self, address: &str) -> Option<NameserverRecord> {
		let inner = self.inner.read();
		let idx = *inner.index.get(address)?;
		inner.records.get(idx).cloned()
	}

	/// Copy all records in insertion order.
	pub fn snapshot(&self) -> Vec<NameserverRecord> {
		self.inner.read().records.clone()
	}

	pub fn len(&self) -> usize {
		self.inner.read().records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;

	fn ms(v: u64) -> Duration {
		Duration::from_millis(v)
	}

	#[test]
	fn test_unique_addresses() {
		let store = NameserverStore::new();
		for addr in ["1.1.1.1", "8.8.8.8", "1.1.1.1", "9.9.9.9", "8.8.8.8", "1.1.1.1"] {
			store.add_or_update(addr, "x", "");
		}
		let snapshot = store.snapshot();
		let addrs: Vec<&str> = snapshot.iter().map(|r| r.address.as_str()).collect();
		assert_eq!(addrs, vec!["1.1.1.1", "8.8.8.8", "9.9.9.9"]);
	}

	#[test]
	fn test_update_keeps_counters() {
		let store = NameserverStore::new();
		store.add_or_update("1.1.1.1", "first", "");
		store.record_latency("1.1.1.1", ms(10));
		store.record_connection_error("1.1.1.1");
		store.add_or_update("1.1.1.1", "Cloudflare", "US");

		let record = store.get("1.1.1.1").unwrap();
		assert_eq!(record.label, "Cloudflare");
		assert_eq!(record.country, "US");
		assert_eq!(record.query_count, 1);
		assert_eq!(record.connection_errors, 1);
		assert_eq!(record.rtt.mean(), Some(ms(10)));
	}

	#[test]
	fn test_latency_aggregate() {
		let store = NameserverStore::new();
		store.add_or_update("9.9.9.9", "Quad9", "");
		for v in [30, 10, 20, 40] {
			store.record_latency("9.9.9.9", ms(v));
		}
		let record = store.get("9.9.9.9").unwrap();
		assert_eq!(record.query_count, 4);
		assert_eq!(record.rtt.min(), Some(ms(10)));
		assert_eq!(record.rtt.max(), Some(ms(40)));
		assert_eq!(record.rtt.mean(), Some(ms(25)));
	}

	#[test]
	fn test_timeout_counts_as_sample() {
		let store = NameserverStore::new();
		store.add_or_update("9.9.9.9", "Quad9", "");
		store.record_timeout("9.9.9.9", ms(2000));
		let record = store.get("9.9.9.9").unwrap();
		assert_eq!(record.query_count, 1);
		assert_eq!(record.timeouts, 1);
		assert_eq!(record.rtt.max(), Some(ms(2000)));
	}

	#[test]
	fn test_unknown_address_is_noop() {
		let store = NameserverStore::new();
		store.add_or_update("1.1.1.1", "x", "");
		store.record_latency("6.6.6.6", ms(10));
		store.record_connection_error("6.6.6.6");
		store.record_validation_error("6.6.6.6");
		store.record_timeout("6.6.6.6", ms(10));
		assert_eq!(store.len(), 1);
		assert!(store.get("6.6.6.6").is_none());
		assert_eq!(store.get("1.1.1.1").unwrap().query_count, 0);
	}

	#[test]
	fn test_error_isolation() {
		let store = NameserverStore::new();
		store.add_or_update("1.1.1.1", "a", "");
		store.add_or_update("8.8.8.8", "b", "");
		store.record_latency("8.8.8.8", ms(15));
		let before = store.get("8.8.8.8").unwrap();

		store.record_connection_error("1.1.1.1");
		store.record_validation_error("1.1.1.1");

		assert_eq!(store.get("8.8.8.8").unwrap(), before);
		let failed = store.get("1.1.1.1").unwrap();
		assert_eq!(failed.connection_errors, 1);
		assert_eq!(failed.validation_errors, 1);
	}

	#[test]
	fn test_snapshot_is_detached() {
		let store = NameserverStore::new();
		store.add_or_update("1.1.1.1", "a", "");
		let snapshot = store.snapshot();
		store.record_latency("1.1.1.1", ms(5));
		assert_eq!(snapshot[0].query_count, 0);
		assert_eq!(store.get("1.1.1.1").unwrap().query_count, 1);
	}

	#[test]
	fn test_concurrent_updates() {
		let store = Arc::new(NameserverStore::new());
		store.add_or_update("1.1.1.1", "a", "");

		let handles: Vec<_> = (0..8)
			.map(|t| {
				let store = store.clone();
				std::thread::spawn(move || {
					for i in 0..100u64 {
						store.record_latency("1.1.1.1", ms(t * 100 + i + 1));
						store.add_or_update("1.1.1.1", "a", "");
						let _ = store.get("1.1.1.1");
					}
				})
			})
			.collect();
		for h in handles {
			h.join().unwrap();
		}

		let record = store.get("1.1.1.1").unwrap();
		assert_eq!(record.query_count, 800);
		assert_eq!(record.rtt.count(), 800);
		assert_eq!(record.rtt.min(), Some(ms(1)));
		assert_eq!(record.rtt.max(), Some(ms(800)));
		assert!((record.rtt.mean_ms().unwrap() - 400.5).abs() < 1e-6);
	}
}
