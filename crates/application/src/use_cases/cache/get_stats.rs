use crate::ports::{CacheStatsPort, CacheStatsSnapshot};
use std::sync::Arc;

pub struct GetCacheStatsUseCase {
    cache: Arc<dyn CacheStatsPort>,
}

impl GetCacheStatsUseCase {
    pub fn new(cache: Arc<dyn CacheStatsPort>) -> Self {
        Self { cache }
    }

    pub fn execute(&self) -> CacheStatsSnapshot {
        self.cache.cache_stats()
    }
}
