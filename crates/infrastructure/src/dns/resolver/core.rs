use super::housekeeping::spawn_cache_purge;
use crate::dns::cache::ResolverCache;
use crate::dns::codec::ResponseCode;
use crate::dns::multiplexer::QueryMultiplexer;
use crate::dns::upstream::UpstreamPool;
use async_trait::async_trait;
use ferrous_resolver_application::ports::{CacheStatsPort, CacheStatsSnapshot, NameResolver};
use ferrous_resolver_domain::{
    parse_lookup_address, reverse_name, AddressFamily, DnsRecord, DomainError, Question,
    RecordClass, RecordType, ResolutionErrorKind, ResolverConfig, ServerHealth, UpstreamServer,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Stub resolver: cache in front of the query multiplexer.
///
/// Owns its UDP sockets, their receive loops and the cache purge task; all
/// of them stop when the resolver is dropped.
pub struct StubResolver {
    multiplexer: QueryMultiplexer,
    pool: UpstreamPool,
    cache: Option<Arc<ResolverCache>>,
    housekeeping: Option<JoinHandle<()>>,
}

impl StubResolver {
    /// Must be called from within a tokio runtime.
    pub fn new(config: &ResolverConfig) -> Result<Self, DomainError> {
        let pool = UpstreamPool::from_config(config)?;
        if pool.is_empty() {
            return Err(DomainError::resolution(ResolutionErrorKind::NoServers));
        }
        let multiplexer = QueryMultiplexer::new(config, pool.addresses())?;

        let (cache, housekeeping) = if config.cache_enabled {
            let cache = Arc::new(ResolverCache::new(
                config.cache_max_entries,
                config.cache_max_ttl,
            ));
            let interval = Duration::from_secs(config.cache_purge_interval_secs.max(1));
            let handle = spawn_cache_purge(Arc::downgrade(&cache), interval);
            (Some(cache), Some(handle))
        } else {
            (None, None)
        };

        info!(
            servers = pool.len(),
            family = %config.family,
            timeout_ms = config.attempt_timeout_ms,
            attempts_per_server = config.attempts_per_server,
            cache_enabled = cache.is_some(),
            "Stub resolver created"
        );

        Ok(Self {
            multiplexer,
            pool,
            cache,
            housekeeping,
        })
    }

    pub fn upstream_health(&self, server: &SocketAddr) -> ServerHealth {
        self.pool.health_of(server)
    }

    pub fn upstreams(&self) -> Vec<UpstreamServer> {
        self.pool.snapshot()
    }

    pub fn cache(&self) -> Option<&ResolverCache> {
        self.cache.as_deref()
    }

    /// Records of `record_type` for `name`, from cache or upstream.
    pub async fn lookup(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>, DomainError> {
        if let Some(cache) = &self.cache {
            if let Some(records) = cache.lookup(name, record_type, RecordClass::IN) {
                debug!(name = %name, record_type = %record_type, "Cache HIT");
                return Ok(records);
            }
            debug!(name = %name, record_type = %record_type, "Cache MISS");
        }

        let question = Question::new(name, record_type);
        let outcome = self.multiplexer.dispatch(&question, &self.pool).await?;

        debug!(
            name = %name,
            record_type = %record_type,
            server = %outcome.server,
            attempts = outcome.attempts,
            via_tcp = outcome.via_tcp,
            rcode = %outcome.message.response_code(),
            "Upstream answered"
        );

        if outcome.message.response_code() == ResponseCode::NXDomain {
            return Err(DomainError::resolution(ResolutionErrorKind::NameNotFound));
        }

        // Aliases can expire before the records they lead to.
        let records = outcome.message.answer_chain(name, record_type).to_records();
        if records.is_empty() {
            return Err(DomainError::resolution(ResolutionErrorKind::NoRecords));
        }

        if let Some(cache) = &self.cache {
            cache.store(name, record_type, RecordClass::IN, &records);
        }
        Ok(records)
    }

    async fn lookup_addresses(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<IpAddr>, DomainError> {
        let records = self.lookup(name, record_type).await?;
        Ok(records.iter().filter_map(DnsRecord::address).collect())
    }
}

#[async_trait]
impl NameResolver for StubResolver {
    async fn resolve(
        &self,
        name: &str,
        family: AddressFamily,
    ) -> Result<Vec<IpAddr>, DomainError> {
        match family {
            AddressFamily::Ipv4 => self.lookup_addresses(name, RecordType::A).await,
            AddressFamily::Ipv6 => self.lookup_addresses(name, RecordType::AAAA).await,
            AddressFamily::Both => {
                let (v4, v6) = tokio::join!(
                    self.lookup_addresses(name, RecordType::A),
                    self.lookup_addresses(name, RecordType::AAAA)
                );
                match (v4, v6) {
                    (Err(v4_err), Err(v6_err)) => {
                        debug!(name = %name, ipv4_error = %v4_err, ipv6_error = %v6_err, "Both families failed");
                        Err(combine_family_errors(v4_err, v6_err))
                    }
                    (v4, v6) => {
                        let mut addresses = v4.unwrap_or_default();
                        addresses.extend(v6.unwrap_or_default());
                        Ok(addresses)
                    }
                }
            }
        }
    }

    async fn reverse_resolve(&self, address: &str) -> Result<String, DomainError> {
        let ip = parse_lookup_address(address)?;
        let ptr_name = reverse_name(&ip);

        let records = self.lookup(&ptr_name, RecordType::PTR).await?;
        records
            .iter()
            .find_map(|record| record.target_name())
            .map(|target| target.trim_end_matches('.').to_string())
            .ok_or_else(|| DomainError::resolution(ResolutionErrorKind::NoRecords))
    }
}

/// An authoritative negative answer for one family must not hide a
/// transport failure on the other.
fn combine_family_errors(v4_err: DomainError, v6_err: DomainError) -> DomainError {
    let is_negative_answer = |e: &DomainError| {
        matches!(
            e.resolution_kind(),
            Some(ResolutionErrorKind::NoRecords | ResolutionErrorKind::NameNotFound)
        )
    };
    if is_negative_answer(&v4_err) && !is_negative_answer(&v6_err) {
        v6_err
    } else {
        v4_err
    }
}

impl CacheStatsPort for StubResolver {
    fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache
            .as_ref()
            .map(|cache| cache.stats())
            .unwrap_or_default()
    }
}

impl Drop for StubResolver {
    fn drop(&mut self) {
        if let Some(handle) = self.housekeeping.take() {
            handle.abort();
        }
    }
}
