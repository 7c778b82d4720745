use ferrous_resolver_application::ports::{CacheStatsPort, NameResolver};
use ferrous_resolver_application::use_cases::{
    GetCacheStatsUseCase, ResolveManyUseCase, ResolveNameUseCase, ReverseLookupUseCase,
};
use ferrous_resolver_domain::Config;
use ferrous_resolver_infrastructure::dns::StubResolver;
use std::sync::Arc;
use tracing::info;

pub struct UseCases {
    pub resolve_name: ResolveNameUseCase,
    pub reverse_lookup: ReverseLookupUseCase,
    pub resolve_many: ResolveManyUseCase,
    pub cache_stats: GetCacheStatsUseCase,
}

impl UseCases {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let resolver = Arc::new(StubResolver::new(&config.resolver)?);
        info!(upstreams = resolver.upstreams().len(), "Stub resolver ready");

        let name_resolver: Arc<dyn NameResolver> = resolver.clone();
        let stats: Arc<dyn CacheStatsPort> = resolver;

        Ok(Self {
            resolve_name: ResolveNameUseCase::new(name_resolver.clone()),
            reverse_lookup: ReverseLookupUseCase::new(name_resolver.clone()),
            resolve_many: ResolveManyUseCase::new(name_resolver),
            cache_stats: GetCacheStatsUseCase::new(stats),
        })
    }
}
