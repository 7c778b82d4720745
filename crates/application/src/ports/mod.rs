mod cache_stats_port;
mod name_resolver;

pub use cache_stats_port::{CacheStatsPort, CacheStatsSnapshot};
pub use name_resolver::{NameResolution, NameResolver};
