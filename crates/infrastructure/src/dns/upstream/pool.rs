use dashmap::DashMap;
use ferrous_resolver_domain::{
    parse_upstream_addr, DomainError, ResolverConfig, ServerHealth, UpstreamServer,
};
use rustc_hash::FxBuildHasher;
use std::net::SocketAddr;
use tracing::{info, warn};

/// Upstream servers in configured order, each with its health state.
///
/// Failover order is healthy, then suspected, then dead; ties keep the
/// configured order. Dead servers are still tried so a fully degraded
/// pool keeps answering once its upstreams come back.
pub struct UpstreamPool {
    order: Vec<SocketAddr>,
    health: DashMap<SocketAddr, UpstreamServer, FxBuildHasher>,
    dead_after_failures: u16,
}

impl UpstreamPool {
    pub fn new(servers: &[SocketAddr], dead_after_failures: u16) -> Self {
        let health = DashMap::with_hasher(FxBuildHasher);
        let mut order = Vec::with_capacity(servers.len());
        for &addr in servers {
            if health.insert(addr, UpstreamServer::new(addr)).is_none() {
                order.push(addr);
            }
        }

        Self {
            order,
            health,
            dead_after_failures,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Result<Self, DomainError> {
        let servers = config
            .upstream_servers
            .iter()
            .map(|s| parse_upstream_addr(s).map_err(DomainError::ConfigError))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(&servers, config.dead_after_failures))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Configured addresses, regardless of health.
    pub fn addresses(&self) -> &[SocketAddr] {
        &self.order
    }

    /// Addresses in the order the next dispatch should try them.
    pub fn ordered(&self) -> Vec<SocketAddr> {
        let mut ranked: Vec<(u8, SocketAddr)> = self
            .order
            .iter()
            .map(|addr| (self.health_of(addr).rank(), *addr))
            .collect();
        ranked.sort_by_key(|(rank, _)| *rank);
        ranked.into_iter().map(|(_, addr)| addr).collect()
    }

    pub fn health_of(&self, addr: &SocketAddr) -> ServerHealth {
        self.health
            .get(addr)
            .map(|s| s.health)
            .unwrap_or(ServerHealth::Healthy)
    }

    pub fn mark_failed(&self, addr: &SocketAddr) {
        if let Some(mut server) = self.health.get_mut(addr) {
            let before = server.health;
            server.record_failure(self.dead_after_failures);
            if server.health != before {
                warn!(
                    server = %addr,
                    from = %before,
                    to = %server.health,
                    consecutive_failures = server.consecutive_failures,
                    "Upstream health changed"
                );
            }
        }
    }

    pub fn mark_succeeded(&self, addr: &SocketAddr) {
        if let Some(mut server) = self.health.get_mut(addr) {
            let before = server.health;
            server.record_success();
            if before != ServerHealth::Healthy {
                info!(server = %addr, from = %before, "Upstream recovered");
            }
        }
    }

    pub fn snapshot(&self) -> Vec<UpstreamServer> {
        self.order
            .iter()
            .filter_map(|addr| self.health.get(addr).map(|s| s.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    fn pool() -> UpstreamPool {
        UpstreamPool::new(
            &[addr("10.0.0.1:53"), addr("10.0.0.2:53"), addr("10.0.0.3:53")],
            2,
        )
    }

    #[test]
    fn test_initial_order_is_configured_order() {
        let pool = pool();
        assert_eq!(
            pool.ordered(),
            vec![addr("10.0.0.1:53"), addr("10.0.0.2:53"), addr("10.0.0.3:53")]
        );
    }

    #[test]
    fn test_failed_server_moves_last() {
        let pool = pool();
        pool.mark_failed(&addr("10.0.0.1:53"));

        assert_eq!(pool.health_of(&addr("10.0.0.1:53")), ServerHealth::Suspected);
        assert_eq!(
            pool.ordered(),
            vec![addr("10.0.0.2:53"), addr("10.0.0.3:53"), addr("10.0.0.1:53")]
        );
    }

    #[test]
    fn test_dead_after_threshold_and_ordered_after_suspected() {
        let pool = pool();
        pool.mark_failed(&addr("10.0.0.1:53"));
        pool.mark_failed(&addr("10.0.0.1:53"));
        pool.mark_failed(&addr("10.0.0.2:53"));

        assert_eq!(pool.health_of(&addr("10.0.0.1:53")), ServerHealth::Dead);
        assert_eq!(
            pool.ordered(),
            vec![addr("10.0.0.3:53"), addr("10.0.0.2:53"), addr("10.0.0.1:53")]
        );
    }

    #[test]
    fn test_success_restores_position() {
        let pool = pool();
        pool.mark_failed(&addr("10.0.0.1:53"));
        pool.mark_succeeded(&addr("10.0.0.1:53"));

        assert_eq!(pool.ordered()[0], addr("10.0.0.1:53"));
        assert_eq!(pool.snapshot()[0].consecutive_failures, 0);
    }

    #[test]
    fn test_duplicates_collapse() {
        let pool = UpstreamPool::new(&[addr("10.0.0.1:53"), addr("10.0.0.1:53")], 3);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_from_config_rejects_hostnames() {
        let config = ResolverConfig {
            upstream_servers: vec!["dns.google".to_string()],
            ..ResolverConfig::default()
        };
        assert!(matches!(
            UpstreamPool::from_config(&config),
            Err(DomainError::ConfigError(_))
        ));
    }
}
