use std::time::Duration;

use clap::Parser;

use crate::transport::{BenchmarkConfig, PrepareConfig};

/// DNS resolver latency ranking tool
#[derive(Parser, Debug)]
#[command(name = "nameinator", version)]
#[command(about = "Rank DNS resolvers by A-record round-trip time")]
pub struct Cli {
	/// Number of domains to query against every nameserver
	#[arg(short = 'd', long = "domains", default_value = "100")]
	pub domains: usize,

	/// Benchmark only this nameserver (e.g. 1.1.1.1 or 1.1.1.1:53)
	#[arg(short = 'n', long = "nameserver")]
	pub nameserver: Option<String>,

	/// CSV file with nameservers (address,label,country)
	#[arg(short = 'f', long = "nameserver-file")]
	pub nameserver_file: Option<String>,

	/// File containing domains to sample from (one per line)
	#[arg(long = "domain-file")]
	pub domain_file: Option<String>,

	/// Let the system resolver compete (default); `--contest=false` disables it
	#[arg(
		long = "contest",
		num_args = 0..=1,
		require_equals = true,
		default_missing_value = "true",
		overrides_with = "no_contest"
	)]
	pub contest: Option<bool>,

	/// Do not let the system resolver compete
	#[arg(long = "no-contest", overrides_with = "contest")]
	pub no_contest: bool,

	/// Query timeout in milliseconds
	#[arg(short = 't', long = "timeout", default_value = "2000")]
	pub timeout: u64,

	/// Nameservers queried in parallel for each domain (1 = sequential)
	#[arg(short = 'c', long = "concurrency", default_value = "1")]
	pub concurrency: usize,

	/// Random seed for reproducible domain selection
	#[arg(short = 's', long = "seed")]
	pub seed: Option<u64>,

	/// Output CSV file path
	#[arg(short = 'o', long = "output")]
	pub output: Option<String>,

	/// Print raw nameserver records and verbose logs
	#[arg(long = "debug")]
	pub debug: bool,
}

impl Cli {
	pub fn prepare_config(&self) -> PrepareConfig {
		PrepareConfig {
			number_of_domains: self.domains,
			nameserver: self.nameserver.clone(),
			nameserver_file: self.nameserver_file.clone(),
			domain_file: self.domain_file.clone(),
			contest: self.contest.unwrap_or(!self.no_contest),
			seed: self.seed,
		}
	}

	pub fn benchmark_config(&self) -> BenchmarkConfig {
		BenchmarkConfig {
			timeout: Duration::from_millis(self.timeout),
			max_inflight: self.concurrency.max(1),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let cli = Cli::try_parse_from(["nameinator"]).unwrap();
		let prepare = cli.prepare_config();
		assert_eq!(prepare.number_of_domains, 100);
		assert!(prepare.contest);
		assert!(prepare.nameserver.is_none());

		let bench = cli.benchmark_config();
		assert_eq!(bench.timeout, Duration::from_secs(2));
		assert_eq!(bench.max_inflight, 1);
	}

	#[test]
	fn test_flags() {
		let cli = Cli::try_parse_from([
			"nameinator", "--domains", "5", "--nameserver", "9.9.9.9",
			"--no-contest", "-c", "0", "--seed", "42",
		]).unwrap();
		let prepare = cli.prepare_config();
		assert_eq!(prepare.number_of_domains, 5);
		assert_eq!(prepare.nameserver.as_deref(), Some("9.9.9.9"));
		assert!(!prepare.contest);
		assert_eq!(prepare.seed, Some(42));
		assert_eq!(cli.benchmark_config().max_inflight, 1);
	}

	#[test]
	fn test_contest_flags() {
		let contest = |args: &[&str]| {
			let argv = std::iter::once("nameinator").chain(args.iter().copied());
			Cli::try_parse_from(argv).unwrap().prepare_config().contest
		};

		assert!(contest(&[]));
		assert!(contest(&["--contest"]));
		assert!(contest(&["--contest=true"]));
		assert!(!contest(&["--contest=false"]));
		assert!(!contest(&["--no-contest"]));
		// last one wins
		assert!(contest(&["--no-contest", "--contest"]));
		assert!(!contest(&["--contest", "--no-contest"]));
		assert!(Cli::try_parse_from(["nameinator", "--contest=maybe"]).is_err());
	}

	#[test]
	fn test_default_domain_count_fits_builtin_pool() {
		let cli = Cli::try_parse_from(["nameinator"]).unwrap();
		assert!(crate::domains::default_domains().len() >= cli.domains);
	}
}
