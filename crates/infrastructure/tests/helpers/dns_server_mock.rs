#![allow(dead_code)]
use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA, CNAME, PTR};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Answer from the zone; NXDOMAIN for unknown names.
    Answer,
    /// Count queries, never reply.
    Silent,
    /// Reply TC=1 with no records over UDP, full answer over TCP.
    Truncate,
    /// Like `Truncate`, but the UDP reply stops inside its question.
    TruncateInQuestion,
    ServFail,
    /// Send a reply with the wrong id and one with the wrong question
    /// before the real answer.
    DecoysFirst,
    /// Send an undecodable reply carrying the query's id before the real
    /// answer.
    GarbageFirst,
    /// Answer from the zone, except questions of this type get no reply.
    IgnoreType(RecordType),
}

#[derive(Default, Clone)]
struct Zone {
    records: HashMap<(String, RecordType), Vec<(u32, RData)>>,
    wildcard_a: Option<Ipv4Addr>,
}

pub struct MockDnsServerBuilder {
    zone: Zone,
    behavior: MockBehavior,
}

impl MockDnsServerBuilder {
    pub fn a(mut self, name: &str, ip: &str, ttl: u32) -> Self {
        let ip: Ipv4Addr = ip.parse().unwrap();
        self.push(name, RecordType::A, ttl, RData::A(A(ip)));
        self
    }

    pub fn aaaa(mut self, name: &str, ip: &str, ttl: u32) -> Self {
        let ip: Ipv6Addr = ip.parse().unwrap();
        self.push(name, RecordType::AAAA, ttl, RData::AAAA(AAAA(ip)));
        self
    }

    pub fn cname(mut self, name: &str, target: &str, ttl: u32) -> Self {
        let target = Name::from_ascii(target).unwrap();
        self.push(name, RecordType::CNAME, ttl, RData::CNAME(CNAME(target)));
        self
    }

    pub fn ptr(mut self, name: &str, target: &str, ttl: u32) -> Self {
        let target = Name::from_ascii(target).unwrap();
        self.push(name, RecordType::PTR, ttl, RData::PTR(PTR(target)));
        self
    }

    /// Answers every A question not in the zone with `ip`.
    pub fn wildcard_a(mut self, ip: &str) -> Self {
        self.zone.wildcard_a = Some(ip.parse().unwrap());
        self
    }

    pub fn behavior(mut self, behavior: MockBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    fn push(&mut self, name: &str, record_type: RecordType, ttl: u32, rdata: RData) {
        self.zone
            .records
            .entry((normalize(name), record_type))
            .or_default()
            .push((ttl, rdata));
    }

    pub async fn start(self) -> std::io::Result<MockDnsServer> {
        let udp = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = udp.local_addr()?;
        let tcp = TcpListener::bind(addr).await?;

        let state = Arc::new(ServerState {
            zone: self.zone,
            behavior: self.behavior,
            udp_queries: AtomicUsize::new(0),
            tcp_queries: AtomicUsize::new(0),
            questions: Mutex::new(Vec::new()),
        });

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let udp_state = Arc::clone(&state);
        let tcp_state = Arc::clone(&state);

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = udp.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = result {
                            for reply in udp_state.udp_replies(&buf[..len]) {
                                let _ = udp.send_to(&reply, peer).await;
                            }
                        }
                    }
                    result = tcp.accept() => {
                        if let Ok((stream, _)) = result {
                            tokio::spawn(serve_tcp(stream, Arc::clone(&tcp_state)));
                        }
                    }
                }
            }
        });

        Ok(MockDnsServer {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        })
    }
}

struct ServerState {
    zone: Zone,
    behavior: MockBehavior,
    udp_queries: AtomicUsize,
    tcp_queries: AtomicUsize,
    questions: Mutex<Vec<(String, RecordType)>>,
}

impl ServerState {
    fn udp_replies(&self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.udp_queries.fetch_add(1, Ordering::SeqCst);
        let Ok(query) = Message::from_vec(bytes) else {
            return Vec::new();
        };
        self.record_question(&query);

        match self.behavior {
            MockBehavior::Silent => Vec::new(),
            MockBehavior::Answer => vec![self.answer(&query)],
            MockBehavior::ServFail => {
                let mut reply = reply_to(&query);
                reply.set_response_code(ResponseCode::ServFail);
                vec![reply.to_vec().unwrap()]
            }
            MockBehavior::Truncate => {
                let mut reply = reply_to(&query);
                reply.set_truncated(true);
                vec![reply.to_vec().unwrap()]
            }
            MockBehavior::DecoysFirst => {
                let mut wrong_id = Message::from_vec(&self.answer(&query)).unwrap();
                wrong_id.set_id(query.id().wrapping_add(1));
                let wrong_question = self.decoy_with_other_question(&query);
                vec![
                    wrong_id.to_vec().unwrap(),
                    wrong_question,
                    self.answer(&query),
                ]
            }
            MockBehavior::TruncateInQuestion => {
                let mut reply = reply_to(&query);
                reply.set_truncated(true);
                let mut bytes = reply.to_vec().unwrap();
                bytes.truncate(12 + 3);
                vec![bytes]
            }
            MockBehavior::GarbageFirst => {
                let answer = self.answer(&query);
                let mut garbage = answer.clone();
                // One more answer than the datagram holds, with TC clear.
                let an_count = u16::from_be_bytes([garbage[6], garbage[7]]) + 1;
                garbage[6..8].copy_from_slice(&an_count.to_be_bytes());
                vec![garbage, answer]
            }
            MockBehavior::IgnoreType(ignored) => match query.queries().first() {
                Some(q) if q.query_type() == ignored => Vec::new(),
                _ => vec![self.answer(&query)],
            },
        }
    }

    fn tcp_reply(&self, bytes: &[u8]) -> Option<Vec<u8>> {
        self.tcp_queries.fetch_add(1, Ordering::SeqCst);
        let query = Message::from_vec(bytes).ok()?;
        Some(self.answer(&query))
    }

    fn record_question(&self, query: &Message) {
        if let Some(q) = query.queries().first() {
            self.questions
                .lock()
                .unwrap()
                .push((normalize(&q.name().to_ascii()), q.query_type()));
        }
    }

    fn answer(&self, query: &Message) -> Vec<u8> {
        let mut reply = reply_to(query);
        let Some(q) = query.queries().first() else {
            reply.set_response_code(ResponseCode::FormErr);
            return reply.to_vec().unwrap();
        };

        let mut owner = normalize(&q.name().to_ascii());
        let mut found_any = false;
        for _ in 0..8 {
            if let Some(records) = self.zone.records.get(&(owner.clone(), q.query_type())) {
                for (ttl, rdata) in records {
                    reply.add_answer(record(&owner, *ttl, rdata.clone()));
                }
                found_any = true;
                break;
            }
            match self.zone.records.get(&(owner.clone(), RecordType::CNAME)) {
                Some(aliases) => {
                    let (ttl, rdata) = aliases[0].clone();
                    let next = match &rdata {
                        RData::CNAME(CNAME(target)) => normalize(&target.to_ascii()),
                        _ => break,
                    };
                    reply.add_answer(record(&owner, ttl, rdata));
                    found_any = true;
                    owner = next;
                }
                None => break,
            }
        }

        if !found_any {
            let name_known = self.zone.records.keys().any(|(name, _)| *name == owner);
            match (q.query_type(), self.zone.wildcard_a) {
                (RecordType::A, Some(ip)) => {
                    reply.add_answer(record(&owner, 60, RData::A(A(ip))));
                }
                _ if name_known => {}
                _ => {
                    reply.set_response_code(ResponseCode::NXDomain);
                }
            }
        }

        reply.to_vec().unwrap()
    }

    fn decoy_with_other_question(&self, query: &Message) -> Vec<u8> {
        let mut decoy = reply_to(query);
        decoy.take_queries();
        let mut other = query.queries()[0].clone();
        other.set_name(Name::from_ascii("decoy.invalid.").unwrap());
        decoy.add_query(other);
        decoy.add_answer(record(
            "decoy.invalid",
            60,
            RData::A(A(Ipv4Addr::new(6, 6, 6, 6))),
        ));
        decoy.to_vec().unwrap()
    }
}

async fn serve_tcp(mut stream: tokio::net::TcpStream, state: Arc<ServerState>) {
    let mut len_buf = [0u8; 2];
    if stream.read_exact(&mut len_buf).await.is_err() {
        return;
    }
    let mut query = vec![0u8; usize::from(u16::from_be_bytes(len_buf))];
    if stream.read_exact(&mut query).await.is_err() {
        return;
    }
    if let Some(reply) = state.tcp_reply(&query) {
        let _ = stream.write_all(&(reply.len() as u16).to_be_bytes()).await;
        let _ = stream.write_all(&reply).await;
    }
}

fn reply_to(query: &Message) -> Message {
    let mut reply = Message::new();
    reply
        .set_id(query.id())
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(query.recursion_desired())
        .set_recursion_available(true);
    reply.add_queries(query.queries().to_vec());
    reply
}

fn record(owner: &str, ttl: u32, rdata: RData) -> Record {
    Record::from_rdata(Name::from_ascii(format!("{}.", owner)).unwrap(), ttl, rdata)
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

pub struct MockDnsServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub fn builder() -> MockDnsServerBuilder {
        MockDnsServerBuilder {
            zone: Zone::default(),
            behavior: MockBehavior::Answer,
        }
    }

    pub async fn start(behavior: MockBehavior) -> std::io::Result<Self> {
        Self::builder().behavior(behavior).start().await
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn udp_queries(&self) -> usize {
        self.state.udp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_queries(&self) -> usize {
        self.state.tcp_queries.load(Ordering::SeqCst)
    }

    /// Questions seen over UDP, lower-cased and without the root dot.
    pub fn questions(&self) -> Vec<(String, RecordType)> {
        self.state.questions.lock().unwrap().clone()
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
