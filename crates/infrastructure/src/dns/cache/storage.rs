use super::key::CacheKey;
use dashmap::DashMap;
use ferrous_resolver_application::ports::CacheStatsSnapshot;
use ferrous_resolver_domain::{DnsRecord, RecordClass, RecordType};
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

struct CacheEntry {
    records: Arc<[DnsRecord]>,
    inserted_at: Instant,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Records with their TTL lowered to the time left on this entry.
    fn records_at(&self, now: Instant) -> Vec<DnsRecord> {
        let elapsed = now.saturating_duration_since(self.inserted_at);
        let elapsed_secs = u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX);
        self.records
            .iter()
            .map(|record| {
                let mut record = record.clone();
                record.ttl = record.remaining_ttl(elapsed_secs);
                record
            })
            .collect()
    }
}

/// TTL-bounded record cache. Entries are never served past expiry; expired
/// entries are dropped when touched and by [`ResolverCache::purge_expired`].
pub struct ResolverCache {
    entries: DashMap<CacheKey, CacheEntry, FxBuildHasher>,
    max_entries: usize,
    max_ttl: u32,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ResolverCache {
    pub fn new(max_entries: usize, max_ttl: u32) -> Self {
        info!(max_entries, max_ttl, "Resolver cache initialized");
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
            max_entries: max_entries.max(1),
            max_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn lookup(
        &self,
        name: &str,
        record_type: RecordType,
        record_class: RecordClass,
    ) -> Option<Vec<DnsRecord>> {
        self.lookup_at(name, record_type, record_class, Instant::now())
    }

    pub fn lookup_at(
        &self,
        name: &str,
        record_type: RecordType,
        record_class: RecordClass,
        now: Instant,
    ) -> Option<Vec<DnsRecord>> {
        let key = CacheKey::new(name, record_type, record_class);

        match self.entries.get(&key) {
            Some(entry) if !entry.is_expired(now) => {
                self.hits.fetch_add(1, AtomicOrdering::Relaxed);
                return Some(entry.records_at(now));
            }
            Some(_) => {}
            None => {
                self.misses.fetch_add(1, AtomicOrdering::Relaxed);
                return None;
            }
        }

        self.entries.remove_if(&key, |_, entry| entry.is_expired(now));
        self.misses.fetch_add(1, AtomicOrdering::Relaxed);
        debug!(key = %key, "Expired cache entry removed on access");
        None
    }

    /// Stores `records` under the key for `name`. Returns false when the set
    /// is empty or its minimum TTL is zero; such answers are not cached.
    pub fn store(
        &self,
        name: &str,
        record_type: RecordType,
        record_class: RecordClass,
        records: &[DnsRecord],
    ) -> bool {
        self.store_at(name, record_type, record_class, records, Instant::now())
    }

    pub fn store_at(
        &self,
        name: &str,
        record_type: RecordType,
        record_class: RecordClass,
        records: &[DnsRecord],
        now: Instant,
    ) -> bool {
        let Some(min_ttl) = records.iter().map(|r| r.ttl).min() else {
            return false;
        };
        let ttl = min_ttl.min(self.max_ttl);
        if ttl == 0 {
            return false;
        }

        let key = CacheKey::new(name, record_type, record_class);
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.make_room(now);
        }

        debug!(key = %key, ttl, records = records.len(), "Cache store");
        self.entries.insert(
            key,
            CacheEntry {
                records: Arc::from(records),
                inserted_at: now,
                expires_at: now + Duration::from_secs(u64::from(ttl)),
            },
        );
        true
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "Purged expired cache entries");
        }
        removed
    }

    /// Frees one slot: expired entries go first, otherwise the entry closest
    /// to expiry is evicted.
    fn make_room(&self, now: Instant) {
        if self.purge_expired_at(now) > 0 && self.entries.len() < self.max_entries {
            return;
        }

        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| entry.expires_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = victim {
            self.entries.remove(&key);
            self.evictions.fetch_add(1, AtomicOrdering::Relaxed);
            debug!(key = %key, "Evicted cache entry closest to expiry");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            entries: self.entries.len(),
            hits: self.hits.load(AtomicOrdering::Relaxed),
            misses: self.misses.load(AtomicOrdering::Relaxed),
            evictions: self.evictions.load(AtomicOrdering::Relaxed),
        }
    }
}
