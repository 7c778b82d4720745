use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::resolver::ResolverConfig;
use crate::upstream::parse_upstream_addr;
use crate::AddressFamily;

const LOCAL_CONFIG_PATH: &str = "ferrous-resolver.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/ferrous-resolver/config.toml";

/// Main configuration structure for Ferrous Resolver
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Upstreams, retry policy and cache settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. ferrous-resolver.toml in current directory
    /// 3. /etc/ferrous-resolver/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new(LOCAL_CONFIG_PATH).exists() {
            Self::from_file(LOCAL_CONFIG_PATH)?
        } else if std::path::Path::new(SYSTEM_CONFIG_PATH).exists() {
            Self::from_file(SYSTEM_CONFIG_PATH)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(servers) = overrides.upstream_servers {
            if !servers.is_empty() {
                self.resolver.upstream_servers = servers;
            }
        }
        if let Some(timeout) = overrides.attempt_timeout_ms {
            self.resolver.attempt_timeout_ms = timeout;
        }
        if let Some(attempts) = overrides.attempts_per_server {
            self.resolver.attempts_per_server = attempts;
        }
        if let Some(family) = overrides.family {
            self.resolver.family = family;
        }
        if overrides.disable_cache {
            self.resolver.cache_enabled = false;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let resolver = &self.resolver;

        if resolver.upstream_servers.is_empty() {
            return Err(ConfigError::Validation(
                "No upstream servers configured".to_string(),
            ));
        }

        for server in &resolver.upstream_servers {
            parse_upstream_addr(server).map_err(ConfigError::Validation)?;
        }

        if resolver.attempt_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "attempt_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if resolver.attempts_per_server == 0 {
            return Err(ConfigError::Validation(
                "attempts_per_server must be at least 1".to_string(),
            ));
        }

        if resolver.max_in_flight == 0 || resolver.max_in_flight > u16::MAX as usize {
            return Err(ConfigError::Validation(format!(
                "max_in_flight must be between 1 and {}",
                u16::MAX
            )));
        }

        if resolver.cache_enabled && resolver.cache_max_entries == 0 {
            return Err(ConfigError::Validation(
                "cache_max_entries must be greater than 0 when the cache is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub upstream_servers: Option<Vec<String>>,
    pub attempt_timeout_ms: Option<u64>,
    pub attempts_per_server: Option<u32>,
    pub family: Option<AddressFamily>,
    pub disable_cache: bool,
    pub log_level: Option<String>,
}
