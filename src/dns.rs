use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::{Name, RecordType};
use tokio::net::UdpSocket;
use tracing::debug;

use crate::transport::{DnsExchange, ExchangeOutcome, DNS_PORT};

/// DNS response information extracted from a parsed message
#[derive(Debug)]
pub struct DnsResponse {
	pub rcode: ResponseCode,
	pub answer_count: usize,
}

impl DnsResponse {
	/// NXDOMAIN is a legitimate answer for a resolver; anything else but
	/// NOERROR means the resolver failed to do its job.
	pub fn is_valid_answer(&self) -> bool {
		matches!(self.rcode, ResponseCode::NoError | ResponseCode::NXDomain)
	}
}

/// Build an A/IN query with recursion desired for the given domain.
///
/// Returns the serialized query bytes ready to send over UDP.
pub fn build_query(domain: &str, txid: u16) -> Result<Vec<u8>> {
	let name = Name::from_ascii(domain)
		.map_err(|e| anyhow!("invalid domain name '{}': {}", domain, e))?;

	let mut message = Message::new();
	message.set_id(txid);
	message.set_recursion_desired(true);
	message.add_query(Query::query(name, RecordType::A));

	let bytes = message.to_vec()
		.map_err(|e| anyhow!("failed to serialize DNS query: {}", e))?;
	Ok(bytes)
}

/// Check that a domain is a usable query name: hostname characters only
/// and accepted by the wire encoder.
pub fn is_valid_domain(domain: &str) -> bool {
	let trimmed = domain.trim_end_matches('.');
	if trimmed.is_empty() {
		return false;
	}
	let hostname_chars = trimmed.chars()
		.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
	hostname_chars && Name::from_ascii(domain).is_ok()
}

/// Parse a DNS response, validating the transaction ID and message type.
pub fn parse_response(bytes: &[u8], expected_txid: u16) -> Result<DnsResponse> {
	let message = Message::from_vec(bytes)
		.map_err(|e| anyhow!("failed to parse DNS response: {}", e))?;

	if message.id() != expected_txid {
		return Err(anyhow!(
			"txid mismatch: expected {}, got {}",
			expected_txid, message.id()
		));
	}

	if message.message_type() != MessageType::Response {
		return Err(anyhow!("received a query instead of a response"));
	}

	Ok(DnsResponse {
		rcode: message.response_code(),
		answer_count: message.answer_count() as usize,
	})
}

/// Parse a nameserver address without touching the network.
///
/// Supports formats:
///   "1.1.1.1"              -- IPv4, default port 53
///   "1.1.1.1:5353"         -- IPv4 with explicit port
///   "2606:4700::1111"      -- bare IPv6, default port 53
///   "[2606:4700::1111]:53" -- bracketed IPv6 with port
///
/// Returns None for hostnames.
pub fn parse_endpoint(address: &str) -> Option<SocketAddr> {
	let trimmed = address.trim();
	if let Ok(addr) = trimmed.parse::<SocketAddr>() {
		return Some(addr);
	}
	let bare = trimmed.trim_start_matches('[').trim_end_matches(']');
	bare.parse::<IpAddr>().ok().map(|ip| SocketAddr::new(ip, DNS_PORT))
}

/// Resolve a nameserver address to a socket address, looking up hostnames.
pub async fn resolve_endpoint(address: &str) -> Result<SocketAddr> {
	if let Some(addr) = parse_endpoint(address) {
		return Ok(addr);
	}
	let mut addrs = tokio::net::lookup_host((address.trim(), DNS_PORT)).await
		.map_err(|e| anyhow!("failed to resolve nameserver '{}': {}", address, e))?;
	addrs.next()
		.ok_or_else(|| anyhow!("nameserver '{}' resolved to no addresses", address))
}

/// DNS client over plain UDP.
///
/// Creates a dedicated socket per query to avoid response stealing between
/// concurrent exchanges against the same nameserver.
#[derive(Debug, Clone)]
pub struct UdpExchanger {
	timeout: Duration,
}

impl UdpExchanger {
	pub fn new(timeout: Duration) -> Self {
		UdpExchanger { timeout }
	}

	async fn query(&self, server: SocketAddr, query_bytes: &[u8], txid: u16, fqdn: &str) -> Result<ExchangeOutcome> {
		let bind_addr = if server.is_ipv4() {
			"0.0.0.0:0"
		} else {
			"[::]:0"
		};
		let socket = UdpSocket::bind(bind_addr).await?;
		// Connected sockets surface ICMP unreachable as a recv error
		socket.connect(server).await?;

		let start = Instant::now();
		socket.send(query_bytes).await?;

		// Use 4096-byte buffer to handle EDNS-extended responses.
		// Stray datagrams are dropped and the wait continues until the deadline.
		let mut buf = vec![0u8; 4096];
		loop {
			let elapsed = start.elapsed();
			if elapsed >= self.timeout {
				break;
			}
			let remaining = self.timeout - elapsed;

			match tokio::time::timeout(remaining, socket.recv(&mut buf)).await {
				Ok(Ok(len)) => {
					let elapsed = start.elapsed();
					match parse_response(&buf[..len], txid) {
						Ok(response) if response.is_valid_answer() => {
							return Ok(ExchangeOutcome::Answered {
								elapsed,
								rcode: response.rcode.to_string(),
							});
						}
						Ok(response) => {
							return Ok(ExchangeOutcome::Invalid {
								elapsed,
								reason: format!("rcode {}", response.rcode),
							});
						}
						Err(e) => {
							debug!(%server, fqdn, error = %e, "discarding unexpected datagram");
						}
					}
				}
				Ok(Err(e)) => return Err(e.into()),
				Err(_) => break,
			}
		}

		Ok(ExchangeOutcome::TimedOut { elapsed: start.elapsed() })
	}
}

impl DnsExchange for UdpExchanger {
	async fn exchange(&self, fqdn: &str, address: &str) -> ExchangeOutcome {
		let txid: u16 = rand::random();
		let query_bytes = match build_query(fqdn, txid) {
			Ok(bytes) => bytes,
			Err(e) => return ExchangeOutcome::BadQuery { reason: e.to_string() },
		};
		let server = match resolve_endpoint(address).await {
			Ok(server) => server,
			Err(e) => return ExchangeOutcome::ConnectionFailed { reason: e.to_string() },
		};
		match self.query(server, &query_bytes, txid, fqdn).await {
			Ok(outcome) => outcome,
			Err(e) => ExchangeOutcome::ConnectionFailed { reason: e.to_string() },
		}
	}
}
