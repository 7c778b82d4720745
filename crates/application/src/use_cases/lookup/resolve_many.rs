use crate::ports::{NameResolution, NameResolver};
use ferrous_resolver_domain::AddressFamily;
use std::sync::Arc;
use tracing::debug;

pub struct ResolveManyUseCase {
    resolver: Arc<dyn NameResolver>,
}

impl ResolveManyUseCase {
    pub fn new(resolver: Arc<dyn NameResolver>) -> Self {
        Self { resolver }
    }

    /// Blank entries are skipped; everything else keeps its input position.
    pub async fn execute(&self, names: &[String], family: AddressFamily) -> Vec<NameResolution> {
        let names: Vec<String> = names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        let results = self.resolver.resolve_many(&names, family).await;
        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        debug!(total = results.len(), failed, family = %family, "Batch resolved");
        results
    }
}
