use ferrous_resolver_domain::{CliOverrides, Config};
use tracing::info;

pub fn load_config(
    config_path: Option<&str>,
    cli_overrides: CliOverrides,
) -> anyhow::Result<Config> {
    let config = Config::load(config_path, cli_overrides)?;
    config.validate()?;
    Ok(config)
}

/// Logged after the subscriber is installed so the summary is not lost.
pub fn log_config_summary(config_path: Option<&str>, config: &Config) {
    let resolver = &config.resolver;
    info!(
        config_file = config_path.unwrap_or("default"),
        upstreams = ?resolver.upstream_servers,
        attempt_timeout_ms = resolver.attempt_timeout_ms,
        attempts_per_server = resolver.attempts_per_server,
        cache_enabled = resolver.cache_enabled,
        "Configuration loaded"
    );
}
