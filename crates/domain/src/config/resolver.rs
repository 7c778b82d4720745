use crate::AddressFamily;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    Fixed,
    #[default]
    Exponential,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Upstream servers in priority order.
    #[serde(default = "default_upstream_servers")]
    pub upstream_servers: Vec<String>,

    #[serde(default)]
    pub family: AddressFamily,

    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    #[serde(default = "default_attempts_per_server")]
    pub attempts_per_server: u32,

    #[serde(default)]
    pub backoff: BackoffStrategy,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_dead_after_failures")]
    pub dead_after_failures: u16,

    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    #[serde(default = "default_cache_max_ttl")]
    pub cache_max_ttl: u32,

    #[serde(default = "default_cache_purge_interval_secs")]
    pub cache_purge_interval_secs: u64,
}

impl ResolverConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    /// Delay before the given retry (1-based) on the same server.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let base = Duration::from_millis(self.backoff_base_ms);
        let delay = match self.backoff {
            BackoffStrategy::Fixed => base,
            BackoffStrategy::Exponential => {
                let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
                base.saturating_mul(factor)
            }
        };
        delay.min(self.attempt_timeout())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            upstream_servers: default_upstream_servers(),
            family: AddressFamily::Both,
            attempt_timeout_ms: default_attempt_timeout_ms(),
            attempts_per_server: default_attempts_per_server(),
            backoff: BackoffStrategy::Exponential,
            backoff_base_ms: default_backoff_base_ms(),
            dead_after_failures: default_dead_after_failures(),
            max_in_flight: default_max_in_flight(),
            cache_enabled: true,
            cache_max_entries: default_cache_max_entries(),
            cache_max_ttl: default_cache_max_ttl(),
            cache_purge_interval_secs: default_cache_purge_interval_secs(),
        }
    }
}

fn default_upstream_servers() -> Vec<String> {
    vec!["8.8.8.8:53".to_string(), "1.1.1.1:53".to_string()]
}

fn default_attempt_timeout_ms() -> u64 {
    2000
}

fn default_attempts_per_server() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    100
}

fn default_dead_after_failures() -> u16 {
    3
}

fn default_max_in_flight() -> usize {
    1024
}

fn default_true() -> bool {
    true
}

fn default_cache_max_entries() -> usize {
    10_000
}

fn default_cache_max_ttl() -> u32 {
    86_400
}

fn default_cache_purge_interval_secs() -> u64 {
    60
}
