use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::trace;

/// A domain selected for the benchmark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecord {
	pub fqdn: String,
	pub resolution_errors: u64,
}

#[derive(Debug, Default)]
struct Inner {
	records: Vec<DomainRecord>,
	index: HashMap<String, usize>,
}

/// Thread-safe store of domains keyed by FQDN.
///
/// Populated during preparation and read-only for the run, apart from the
/// resolution error counter.
#[derive(Debug, Default)]
pub struct DomainStore {
	inner: RwLock<Inner>,
}

impl DomainStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a domain. Re-adding a known FQDN leaves its record unchanged.
	pub fn add_fqdn(&self, fqdn: &str) {
		let mut inner = self.inner.write();
		Self::insert(&mut inner, fqdn);
	}

	pub fn add_many<S: AsRef<str>>(&self, fqdns: &[S]) {
		let mut inner = self.inner.write();
		for fqdn in fqdns {
			Self::insert(&mut inner, fqdn.as_ref());
		}
	}

	fn insert(inner: &mut Inner, fqdn: &str) {
		if let Some(&idx) = inner.index.get(fqdn) {
			inner.records[idx].fqdn = fqdn.to_string();
			return;
		}
		let idx = inner.records.len();
		inner.records.push(DomainRecord {
			fqdn: fqdn.to_string(),
			resolution_errors: 0,
		});
		inner.index.insert(fqdn.to_string(), idx);
	}

	pub fn record_resolution_error(&self, fqdn: &str) {
		let mut inner = self.inner.write();
		match inner.index.get(fqdn).copied() {
			Some(idx) => inner.records[idx].resolution_errors += 1,
			None => trace!(fqdn, "ignoring update for unknown domain"),
		}
	}

	pub fn get(&self, fqdn: &str) -> Option<DomainRecord> {
		let inner = self.inner.read();
		let idx = *inner.index.get(fqdn)?;
		inner.records.get(idx).cloned()
	}

	/// Copy all domains in insertion order.
	pub fn snapshot(&self) -> Vec<DomainRecord> {
		self.inner.read().records.clone()
	}

	pub fn len(&self) -> usize {
		self.inner.read().records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
