//! Rank DNS resolvers by A-record round-trip time.
//!
//! Nameservers and domains are loaded into two lock-guarded stores, every
//! (domain, nameserver) pair is queried once in domain-major order, and the
//! per-nameserver latency aggregates are ranked by mean RTT.

pub mod bench;
pub mod cli;
pub mod dns;
pub mod domains;
pub mod dstore;
pub mod error;
pub mod logging;
pub mod nsstore;
pub mod output;
pub mod resolver;
pub mod stats;
pub mod transport;

pub use bench::BenchmarkRunner;
pub use dstore::{DomainRecord, DomainStore};
pub use error::BenchError;
pub use nsstore::{NameserverRecord, NameserverStore};
pub use stats::{rank_nameservers, RankedNameserver, RttStats};
pub use transport::{BenchmarkConfig, DnsExchange, ExchangeOutcome, PrepareConfig, ProgressReporter};
