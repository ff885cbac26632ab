use std::cmp::Ordering;
use std::time::Duration;

use crate::nsstore::NameserverRecord;

/// Running latency aggregate for one nameserver.
///
/// Keeps count, min, max, mean and the sum of squared deviations (Welford),
/// so folding in a sample is O(1) in time and memory.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RttStats {
	count: u64,
	min: Duration,
	max: Duration,
	mean_ns: f64,
	m2: f64,
}

impl RttStats {
	/// Fold one observation into the aggregate.
	pub fn add(&mut self, rtt: Duration) {
		self.count += 1;
		if self.count == 1 {
			self.min = rtt;
			self.max = rtt;
		} else {
			self.min = self.min.min(rtt);
			self.max = self.max.max(rtt);
		}
		let x = rtt.as_nanos() as f64;
		let delta = x - self.mean_ns;
		self.mean_ns += delta / self.count as f64;
		self.m2 += delta * (x - self.mean_ns);
	}

	pub fn count(&self) -> u64 {
		self.count
	}

	pub fn is_empty(&self) -> bool {
		self.count == 0
	}

	pub fn min(&self) -> Option<Duration> {
		(!self.is_empty()).then_some(self.min)
	}

	pub fn max(&self) -> Option<Duration> {
		(!self.is_empty()).then_some(self.max)
	}

	pub fn mean(&self) -> Option<Duration> {
		(!self.is_empty()).then(|| Duration::from_nanos(self.mean_ns.round() as u64))
	}

	pub fn mean_ms(&self) -> Option<f64> {
		(!self.is_empty()).then(|| self.mean_ns / 1_000_000.0)
	}

	/// Population standard deviation in milliseconds.
	pub fn stddev_ms(&self) -> Option<f64> {
		if self.is_empty() {
			return None;
		}
		let variance = self.m2 / self.count as f64;
		Some(variance.sqrt() / 1_000_000.0)
	}

	/// Standard error of the mean in milliseconds; zero below two samples.
	pub fn std_error_ms(&self) -> f64 {
		if self.count < 2 {
			return 0.0;
		}
		self.stddev_ms().unwrap_or(0.0) / (self.count as f64).sqrt()
	}
}

/// Ranked nameserver entry
#[derive(Debug, Clone, PartialEq)]
pub struct RankedNameserver {
	pub rank: usize,
	pub record: NameserverRecord,
	/// Tie group label (e.g. "1-3") when means are within their standard errors
	pub tie_group: Option<String>,
}

impl RankedNameserver {
	/// Rank key. `None` when the nameserver produced no latency samples.
	pub fn mean_ms(&self) -> Option<f64> {
		self.record.rtt.mean_ms()
	}
}

/// Order two rank keys; nameservers without samples sort after all others.
fn compare_rank_keys(a: Option<f64>, b: Option<f64>) -> Ordering {
	match (a, b) {
		(Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	}
}

/// Rank nameservers by mean RTT, ascending.
///
/// The sort is stable, so equal keys keep their snapshot order and repeated
/// calls on the same snapshot yield identical sequences. Records without any
/// latency sample are kept and placed last.
pub fn rank_nameservers(snapshot: &[NameserverRecord]) -> Vec<RankedNameserver> {
	let mut records = snapshot.to_vec();
	records.sort_by(|a, b| compare_rank_keys(a.rtt.mean_ms(), b.rtt.mean_ms()));

	let mut ranked: Vec<RankedNameserver> = records.into_iter()
		.enumerate()
		.map(|(i, record)| RankedNameserver {
			rank: i + 1,
			record,
			tie_group: None,
		})
		.collect();
	detect_ties(&mut ranked);
	ranked
}

/// Detect ties among ranked nameservers based on overlapping error bands.
///
/// For consecutive pairs: if |mean_a - mean_b| < se_a + se_b they are tied.
/// Runs of tied neighbours share one rank label. Entries without samples
/// never tie.
pub fn detect_ties(ranked: &mut [RankedNameserver]) {
	let n = ranked.len();
	if n < 2 {
		return;
	}

	let tied_with_next: Vec<bool> = ranked.windows(2)
		.map(|pair| {
			let (a, b) = (&pair[0].record.rtt, &pair[1].record.rtt);
			match (a.mean_ms(), b.mean_ms()) {
				(Some(ma), Some(mb)) => (ma - mb).abs() < a.std_error_ms() + b.std_error_ms(),
				_ => false,
			}
		})
		.collect();

	let mut start = 0;
	while start < n {
		let mut end = start;
		while end < n - 1 && tied_with_next[end] {
			end += 1;
		}
		if end > start {
			let label = format!("{}-{}", ranked[start].rank, ranked[end].rank);
			for entry in &mut ranked[start..=end] {
				entry.tie_group = Some(label.clone());
			}
		}
		start = end + 1;
	}
}
