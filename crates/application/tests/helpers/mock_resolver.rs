use async_trait::async_trait;
use ferrous_resolver_application::ports::{CacheStatsPort, CacheStatsSnapshot, NameResolver};
use ferrous_resolver_domain::{AddressFamily, DomainError, ResolutionErrorKind};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
pub struct MockNameResolver {
    addresses: Arc<Mutex<HashMap<String, Vec<IpAddr>>>>,
    hostnames: Arc<Mutex<HashMap<String, String>>>,
    errors: Arc<Mutex<HashMap<String, DomainError>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    resolve_calls: Arc<AtomicUsize>,
    reverse_calls: Arc<AtomicUsize>,
    families: Arc<Mutex<Vec<AddressFamily>>>,
}

impl MockNameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_addresses(&self, name: &str, addresses: &[&str]) {
        let parsed = addresses.iter().map(|a| a.parse().unwrap()).collect();
        self.addresses
            .lock()
            .unwrap()
            .insert(name.to_string(), parsed);
    }

    pub fn set_hostname(&self, address: &str, hostname: &str) {
        self.hostnames
            .lock()
            .unwrap()
            .insert(address.to_string(), hostname.to_string());
    }

    pub fn set_error(&self, key: &str, error: DomainError) {
        self.errors.lock().unwrap().insert(key.to_string(), error);
    }

    pub fn set_delay(&self, name: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(name.to_string(), delay);
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn reverse_calls(&self) -> usize {
        self.reverse_calls.load(Ordering::SeqCst)
    }

    pub fn families(&self) -> Vec<AddressFamily> {
        self.families.lock().unwrap().clone()
    }
}

#[async_trait]
impl NameResolver for MockNameResolver {
    async fn resolve(
        &self,
        name: &str,
        family: AddressFamily,
    ) -> Result<Vec<IpAddr>, DomainError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.families.lock().unwrap().push(family);

        let delay = self.delays.lock().unwrap().get(name).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.errors.lock().unwrap().get(name) {
            return Err(err.clone());
        }
        self.addresses
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| DomainError::resolution(ResolutionErrorKind::NameNotFound))
    }

    async fn reverse_resolve(&self, address: &str) -> Result<String, DomainError> {
        self.reverse_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.errors.lock().unwrap().get(address) {
            return Err(err.clone());
        }
        self.hostnames
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| DomainError::resolution(ResolutionErrorKind::NameNotFound))
    }
}

pub struct FixedCacheStats(pub CacheStatsSnapshot);

impl CacheStatsPort for FixedCacheStats {
    fn cache_stats(&self) -> CacheStatsSnapshot {
        self.0
    }
}
