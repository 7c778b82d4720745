use crate::dns::codec::Message;
use ferrous_resolver_domain::Question;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

pub(crate) struct InFlightEntry {
    token: u64,
    question: Question,
    server: SocketAddr,
    sent_at: Instant,
    retry: u32,
    responder: oneshot::Sender<Message>,
}

/// Outstanding queries keyed by transaction id. At most one entry per id.
#[derive(Default)]
pub(crate) struct InFlightTable {
    entries: Mutex<HashMap<u16, InFlightEntry>>,
    next_token: AtomicU64,
}

impl InFlightTable {
    fn lock(&self) -> MutexGuard<'_, HashMap<u16, InFlightEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Registers `question` under a fresh random id not currently in use.
    ///
    /// The caller bounds the table size below the id space, so a free id
    /// always exists.
    pub(crate) fn register(
        self: &Arc<Self>,
        question: &Question,
        server: SocketAddr,
        retry: u32,
    ) -> (InFlightGuard, oneshot::Receiver<Message>) {
        let (tx, rx) = oneshot::channel();
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.lock();
        let id = loop {
            let candidate = fastrand::u16(..);
            if !entries.contains_key(&candidate) {
                break candidate;
            }
        };
        entries.insert(
            id,
            InFlightEntry {
                token,
                question: question.clone(),
                server,
                sent_at: Instant::now(),
                retry,
                responder: tx,
            },
        );
        drop(entries);

        let guard = InFlightGuard {
            table: Arc::clone(self),
            id,
            token,
        };
        (guard, rx)
    }

    /// Hands `message` to the query it answers. Responses that match no
    /// entry, or whose question differs from the entry's, are dropped and
    /// leave the table untouched.
    pub(crate) fn deliver(&self, message: Message, source: SocketAddr) -> bool {
        let id = message.id();
        let mut entries = self.lock();

        let Some(entry) = entries.get(&id) else {
            debug!(id, source = %source, "No in-flight query for response id");
            return false;
        };

        // A truncated reply may have lost its question section; it only
        // triggers a TCP retry whose answer is checked in full.
        let question_matches = match message.question() {
            Some(answered) => entry.question.matches(answered),
            None => message.truncated() && source == entry.server,
        };
        if !question_matches {
            debug!(
                id,
                source = %source,
                expected = %entry.question.name,
                "Response question does not match in-flight query"
            );
            return false;
        }

        if source != entry.server {
            warn!(
                id,
                expected = %entry.server,
                received_from = %source,
                "UDP response from unexpected source"
            );
        }

        let Some(entry) = entries.remove(&id) else {
            return false;
        };
        drop(entries);

        debug!(
            id,
            server = %entry.server,
            retry = entry.retry,
            rtt_ms = entry.sent_at.elapsed().as_millis() as u64,
            "Response matched"
        );
        entry.responder.send(message).is_ok()
    }

    /// Ids are reused once freed, so only the registration that owns the
    /// token may remove the entry.
    fn remove(&self, id: u16, token: u64) {
        let mut entries = self.lock();
        if entries.get(&id).is_some_and(|entry| entry.token == token) {
            entries.remove(&id);
        }
    }
}

/// Removes its entry when the waiting query finishes or is dropped, so a
/// late response finds nothing to complete.
pub(crate) struct InFlightGuard {
    table: Arc<InFlightTable>,
    id: u16,
    token: u64,
}

impl InFlightGuard {
    pub(crate) fn id(&self) -> u16 {
        self.id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.table.remove(self.id, self.token);
    }
}
