use thiserror::Error;

/// Errors surfaced by the benchmark engine before any query is sent
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BenchError {
	#[error("no domains to query; check the domain list")]
	NoDomains,

	#[error("no nameservers to benchmark; check the nameserver list")]
	NoNameservers,
}
