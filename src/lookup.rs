use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::debug;

use crate::config::DEFAULT_TIMEOUT;
use crate::dns::{build_query, classify_reply};
use crate::outcome::{LookupError, LookupOutcome};

/// Standard DNS port for raw queries
pub const DNS_PORT: u16 = 53;

/// Reply buffer size, large enough for EDNS-sized datagrams
const RECV_BUFFER_SIZE: usize = 4096;

/// One name resolution, either through the platform resolver or a raw query.
///
/// Implementations capture every failure in the returned outcome; nothing is
/// propagated to the caller.
pub trait Lookup: Send + Sync + 'static {
	fn resolve(
		&self,
		nameserver: Option<&str>,
		domain: &str,
	) -> impl Future<Output = LookupOutcome> + Send;
}

/// Query engine holding the per-lookup settings; no state is kept between calls.
#[derive(Debug, Clone)]
pub struct QueryEngine {
	timeout: Duration,
	port: u16,
}

impl Default for QueryEngine {
	fn default() -> Self {
		QueryEngine::new(DEFAULT_TIMEOUT)
	}
}

impl QueryEngine {
	pub fn new(timeout: Duration) -> Self {
		QueryEngine { timeout, port: DNS_PORT }
	}

	/// Send raw queries to a loopback nameserver on an ephemeral port.
	#[cfg(test)]
	fn with_port(mut self, port: u16) -> Self {
		self.port = port;
		self
	}

	/// Resolve through the platform resolver (getaddrinfo).
	async fn resolve_system(&self, domain: &str) -> LookupOutcome {
		debug!(domain, "querying the system");
		let addrs: Vec<IpAddr> = match tokio::net::lookup_host((domain, 0)).await {
			Ok(addrs) => addrs.map(|a| a.ip()).collect(),
			Err(e) => {
				debug!(domain, error = %e, "system lookup failed");
				return LookupOutcome::Failed(LookupError::SystemResolution(e.to_string()));
			}
		};
		// Prefer IPv4 like a classic host-by-name lookup
		let addr = addrs.iter().find(|a| a.is_ipv4()).or_else(|| addrs.first());
		match addr {
			Some(ip) => LookupOutcome::Resolved(ip.to_string()),
			None => LookupOutcome::Failed(LookupError::SystemResolution(
				format!("no addresses returned for '{}'", domain),
			)),
		}
	}

	/// Send one raw query to the nameserver and wait for a single reply.
	///
	/// Creates a dedicated socket per query so concurrent lookups never
	/// see each other's replies.
	async fn resolve_raw(&self, nameserver: &str, domain: &str) -> LookupOutcome {
		debug!(nameserver, domain, "querying nameserver");
		let txid: u16 = rand::random();

		let query_bytes = match build_query(domain, txid) {
			Ok(bytes) => bytes,
			Err(e) => {
				debug!(nameserver, domain, error = %e, "failed to encode query");
				return LookupOutcome::Failed(LookupError::Unexpected(e.to_string()));
			}
		};

		// A colon in the literal is taken to mean IPv6
		let bind_addr = if nameserver.contains(':') {
			"[::]:0"
		} else {
			"0.0.0.0:0"
		};
		let socket = match UdpSocket::bind(bind_addr).await {
			Ok(s) => s,
			Err(e) => {
				return self.transport_failure(nameserver, format!("failed to bind socket: {}", e));
			}
		};

		if let Err(e) = socket.send_to(&query_bytes, (nameserver, self.port)).await {
			return self.transport_failure(nameserver, format!("failed to send query: {}", e));
		}

		let mut buf = vec![0u8; RECV_BUFFER_SIZE];
		let outcome = match tokio::time::timeout(self.timeout, socket.recv_from(&mut buf)).await {
			Ok(Ok((len, _src))) => classify_reply(&buf[..len], txid),
			Ok(Err(e)) => {
				return self.transport_failure(nameserver, format!("failed to receive reply: {}", e));
			}
			Err(_) => {
				return self.transport_failure(
					nameserver,
					format!("no reply within {} ms", self.timeout.as_millis()),
				);
			}
		};

		if let LookupOutcome::Failed(e) = &outcome {
			debug!(nameserver, domain, error = %e, "DNS lookup failed");
		}
		outcome
	}

	fn transport_failure(&self, nameserver: &str, message: String) -> LookupOutcome {
		debug!(nameserver, error = %message, "DNS lookup failed");
		LookupOutcome::Failed(LookupError::Transport(message))
	}
}

impl Lookup for QueryEngine {
	async fn resolve(&self, nameserver: Option<&str>, domain: &str) -> LookupOutcome {
		match nameserver {
			Some(ns) => self.resolve_raw(ns, domain).await,
			None => self.resolve_system(domain).await,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hickory_proto::op::{Message, MessageType, ResponseCode};
	use hickory_proto::rr::rdata::A;
	use hickory_proto::rr::{Name, RData, Record};
	use std::net::{Ipv4Addr, SocketAddr};
	use std::time::Instant;

	/// Scripted nameserver answering exactly one query on loopback.
	///
	/// `respond` gets the decoded query and returns the reply bytes, or None
	/// to stay silent.
	async fn spawn_nameserver<F>(respond: F) -> SocketAddr
	where
		F: FnOnce(Message) -> Option<Vec<u8>> + Send + 'static,
	{
		let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
		let addr = socket.local_addr().unwrap();
		tokio::spawn(async move {
			let mut buf = vec![0u8; 512];
			let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
			let query = Message::from_vec(&buf[..len]).unwrap();
			match respond(query) {
				Some(reply) => {
					socket.send_to(&reply, peer).await.unwrap();
				}
				None => {
					// Hold the socket open past the client's deadline
					tokio::time::sleep(Duration::from_secs(10)).await;
				}
			}
		});
		addr
	}

	fn reply_to(query: &Message) -> Message {
		let mut response = query.clone();
		response.set_message_type(MessageType::Response);
		response
	}

	fn engine_for(addr: SocketAddr) -> QueryEngine {
		QueryEngine::new(Duration::from_millis(300)).with_port(addr.port())
	}

	#[tokio::test]
	async fn test_raw_resolved() {
		let addr = spawn_nameserver(|query| {
			let mut response = reply_to(&query);
			let name = Name::from_ascii("example.com").unwrap();
			response.add_answer(Record::from_rdata(
				name, 300, RData::A(A(Ipv4Addr::new(192, 0, 2, 80))),
			));
			Some(response.to_vec().unwrap())
		}).await;

		let outcome = engine_for(addr).resolve(Some("127.0.0.1"), "example.com").await;
		assert_eq!(outcome, LookupOutcome::Resolved("192.0.2.80".to_string()));
	}

	#[tokio::test]
	async fn test_raw_nxdomain() {
		let addr = spawn_nameserver(|query| {
			let mut response = reply_to(&query);
			response.set_response_code(ResponseCode::NXDomain);
			Some(response.to_vec().unwrap())
		}).await;

		let outcome = engine_for(addr).resolve(Some("127.0.0.1"), "qwerty12345").await;
		assert_eq!(outcome, LookupOutcome::Failed(LookupError::Protocol(ResponseCode::NXDomain)));
	}

	#[tokio::test]
	async fn test_raw_empty_answer() {
		let addr = spawn_nameserver(|query| Some(reply_to(&query).to_vec().unwrap())).await;

		let outcome = engine_for(addr).resolve(Some("127.0.0.1"), "example.com").await;
		assert_eq!(outcome, LookupOutcome::Failed(LookupError::EmptyAnswer));
	}

	#[tokio::test]
	async fn test_raw_malformed_reply() {
		let addr = spawn_nameserver(|_| Some(vec![0xde, 0xad, 0xbe, 0xef])).await;

		let outcome = engine_for(addr).resolve(Some("127.0.0.1"), "example.com").await;
		assert!(matches!(outcome, LookupOutcome::Failed(LookupError::Transport(_))));
	}

	#[tokio::test]
	async fn test_raw_timeout_is_bounded() {
		let addr = spawn_nameserver(|_| None).await;

		let start = Instant::now();
		let outcome = engine_for(addr).resolve(Some("127.0.0.1"), "example.com").await;
		let elapsed = start.elapsed();

		assert!(matches!(outcome, LookupOutcome::Failed(LookupError::Transport(_))));
		assert!(elapsed >= Duration::from_millis(300));
		assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);
	}

	#[tokio::test]
	async fn test_raw_invalid_domain_is_unexpected() {
		let engine = QueryEngine::new(Duration::from_millis(100));
		let domain = format!("{}.com", "a".repeat(64));
		let outcome = engine.resolve(Some("127.0.0.1"), &domain).await;
		assert!(matches!(outcome, LookupOutcome::Failed(LookupError::Unexpected(_))));
	}

	#[tokio::test]
	async fn test_system_localhost() {
		let outcome = QueryEngine::default().resolve(None, "localhost").await;
		assert!(matches!(outcome, LookupOutcome::Resolved(_)), "{:?}", outcome);
	}

	#[test]
	fn test_with_port_overrides_only_port() {
		let engine = QueryEngine::new(Duration::from_millis(300)).with_port(5353);
		assert_eq!(engine.port, 5353);
		assert_eq!(engine.timeout, Duration::from_millis(300));
	}

	#[test]
	fn test_default_port_and_timeout() {
		let engine = QueryEngine::default();
		assert_eq!(engine.port, DNS_PORT);
		assert_eq!(engine.timeout, DEFAULT_TIMEOUT);
	}
}
