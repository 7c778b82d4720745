//! Query multiplexer: many concurrent queries over one UDP socket per
//! address family.
//!
//! Each attempt registers an in-flight entry under a random transaction id,
//! sends the query and waits on a oneshot channel. A background receive
//! loop per socket decodes every datagram and completes the entry it
//! answers. Truncated answers are retried over TCP with the same bytes.

mod inflight;

use crate::dns::codec::{decode_message, encode_query, Message, ResponseCode};
use crate::dns::transport::{tcp, UdpTransport};
use crate::dns::upstream::UpstreamPool;
use ferrous_resolver_domain::{
    DnsQuery, DomainError, Question, ResolutionErrorKind, ResolverConfig,
};
use inflight::InFlightTable;
use std::net::SocketAddr;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Upper bound on how long the receive loop blocks before checking whether
/// its multiplexer is still alive.
const RECEIVE_POLL_INTERVAL: Duration = Duration::from_secs(1);
const RECEIVE_ERROR_PAUSE: Duration = Duration::from_millis(50);

/// A response that ended a dispatch: NOERROR or NXDOMAIN from `server`.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub message: Message,
    pub server: SocketAddr,
    /// UDP attempts consumed across all servers, this one included.
    pub attempts: u32,
    pub via_tcp: bool,
}

enum AttemptResult {
    Answer(Message, bool),
    ServerFailure(ResponseCode),
}

pub struct QueryMultiplexer {
    table: Arc<InFlightTable>,
    udp_v4: Option<Arc<UdpTransport>>,
    udp_v6: Option<Arc<UdpTransport>>,
    receivers: Vec<JoinHandle<()>>,
    limiter: Semaphore,
    config: ResolverConfig,
}

impl QueryMultiplexer {
    /// Binds one socket for each address family present in `servers` and
    /// starts its receive loop. Must be called from within a tokio runtime.
    pub fn new(config: &ResolverConfig, servers: &[SocketAddr]) -> Result<Self, DomainError> {
        let table = Arc::new(InFlightTable::default());
        let mut receivers = Vec::new();

        let mut bind = |server: Option<&SocketAddr>| {
            let Some(server) = server else {
                return Ok::<_, DomainError>(None);
            };
            let socket = Arc::new(UdpTransport::bind_for(server)?);
            receivers.push(tokio::spawn(receive_loop(
                Arc::clone(&socket),
                Arc::downgrade(&table),
            )));
            Ok(Some(socket))
        };

        let udp_v4 = bind(servers.iter().find(|s| s.is_ipv4()))?;
        let udp_v6 = bind(servers.iter().find(|s| s.is_ipv6()))?;

        let max_in_flight = config.max_in_flight.clamp(1, usize::from(u16::MAX));
        info!(
            ipv4 = ?udp_v4.as_ref().map(|s| s.local_addr()),
            ipv6 = ?udp_v6.as_ref().map(|s| s.local_addr()),
            max_in_flight,
            "Query multiplexer started"
        );

        Ok(Self {
            table,
            udp_v4,
            udp_v6,
            receivers,
            limiter: Semaphore::new(max_in_flight),
            config: config.clone(),
        })
    }

    pub fn in_flight(&self) -> usize {
        self.table.len()
    }

    /// Resolves `question` against `pool`, failing over between servers.
    ///
    /// Transient failures are absorbed and retried. A question that cannot
    /// be encoded fails at once without consuming an attempt or touching
    /// server health.
    pub async fn dispatch(
        &self,
        question: &Question,
        pool: &UpstreamPool,
    ) -> Result<DispatchOutcome, DomainError> {
        let servers = pool.ordered();
        if servers.is_empty() {
            return Err(DomainError::resolution(ResolutionErrorKind::NoServers));
        }

        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| DomainError::IoError("query multiplexer is shutting down".to_string()))?;

        let mut attempts = 0u32;
        for server in servers {
            match self.try_server(question, server, &mut attempts).await {
                Ok((message, via_tcp)) => {
                    pool.mark_succeeded(&server);
                    return Ok(DispatchOutcome {
                        message,
                        server,
                        attempts,
                        via_tcp,
                    });
                }
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    pool.mark_failed(&server);
                    warn!(
                        server = %server,
                        name = %question.name,
                        record_type = %question.record_type,
                        error = %e,
                        "Upstream budget exhausted, failing over"
                    );
                }
            }
        }

        Err(DomainError::resolution(
            ResolutionErrorKind::AllServersExhausted { attempts },
        ))
    }

    async fn try_server(
        &self,
        question: &Question,
        server: SocketAddr,
        attempts: &mut u32,
    ) -> Result<(Message, bool), DomainError> {
        let mut last_error = DomainError::Timeout {
            server: server.to_string(),
        };

        for retry in 0..self.config.attempts_per_server {
            if retry > 0 {
                tokio::time::sleep(self.config.backoff_delay(retry)).await;
            }
            let result = match self.attempt(question, server, retry).await {
                Err(e) if !e.is_transient() => return Err(e),
                result => result,
            };
            *attempts += 1;

            match result {
                Ok(AttemptResult::Answer(message, via_tcp)) => return Ok((message, via_tcp)),
                Ok(AttemptResult::ServerFailure(rcode)) => {
                    return Err(DomainError::IoError(format!(
                        "{} answered {}",
                        server, rcode
                    )));
                }
                Err(e) => {
                    debug!(
                        server = %server,
                        name = %question.name,
                        retry,
                        error = %e,
                        "Attempt failed"
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn attempt(
        &self,
        question: &Question,
        server: SocketAddr,
        retry: u32,
    ) -> Result<AttemptResult, DomainError> {
        let socket = self.socket_for(&server)?;
        let timeout = self.config.attempt_timeout();

        let (guard, rx) = self.table.register(question, server, retry);
        let query_bytes = encode_query(&DnsQuery::new(guard.id(), question.clone()))?;
        socket.send(&query_bytes, server).await?;

        let message = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(message)) => message,
            Ok(Err(_)) => {
                return Err(DomainError::IoError(
                    "receive loop stopped before answering".to_string(),
                ))
            }
            Err(_) => {
                return Err(DomainError::Timeout {
                    server: server.to_string(),
                })
            }
        };
        drop(guard);

        let (message, via_tcp) = if message.truncated() {
            debug!(server = %server, id = message.id(), "Truncated response, retrying over TCP");
            (self.tcp_fallback(&query_bytes, question, server).await?, true)
        } else {
            (message, false)
        };

        let rcode = message.response_code();
        if rcode.ends_server_budget() {
            return Ok(AttemptResult::ServerFailure(rcode));
        }
        Ok(AttemptResult::Answer(message, via_tcp))
    }

    async fn tcp_fallback(
        &self,
        query_bytes: &[u8],
        question: &Question,
        server: SocketAddr,
    ) -> Result<Message, DomainError> {
        let bytes = tcp::exchange(query_bytes, server, self.config.attempt_timeout()).await?;
        let message = decode_message(&bytes)?;

        let expected_id = u16::from_be_bytes([query_bytes[0], query_bytes[1]]);
        let matches = message.id() == expected_id
            && message
                .question()
                .is_some_and(|answered| question.matches(answered));
        if !matches {
            return Err(DomainError::MalformedMessage(format!(
                "TCP answer from {} does not match the query",
                server
            )));
        }
        Ok(message)
    }

    fn socket_for(&self, server: &SocketAddr) -> Result<&UdpTransport, DomainError> {
        let socket = if server.is_ipv4() {
            self.udp_v4.as_deref()
        } else {
            self.udp_v6.as_deref()
        };
        socket.ok_or_else(|| {
            DomainError::IoError(format!("no UDP socket bound for the family of {}", server))
        })
    }
}

impl Drop for QueryMultiplexer {
    fn drop(&mut self) {
        for receiver in &self.receivers {
            receiver.abort();
        }
    }
}

async fn receive_loop(socket: Arc<UdpTransport>, table: Weak<InFlightTable>) {
    loop {
        let received = socket.receive(RECEIVE_POLL_INTERVAL).await;
        let Some(table) = table.upgrade() else {
            break;
        };

        match received {
            Ok((bytes, source)) => match decode_message(&bytes) {
                Ok(message) if message.header.is_response() && message.header.opcode() == 0 => {
                    table.deliver(message, source);
                }
                Ok(message) => {
                    debug!(id = message.id(), source = %source, "Ignoring datagram that is not a query response");
                }
                Err(e) => {
                    debug!(source = %source, error = %e, "Discarding undecodable datagram");
                }
            },
            Err(DomainError::Timeout { .. }) => {}
            Err(e) => {
                warn!(local = %socket.local_addr(), error = %e, "UDP receive failed");
                tokio::time::sleep(RECEIVE_ERROR_PAUSE).await;
            }
        }
    }
    debug!(local = %socket.local_addr(), "Receive loop stopped");
}
