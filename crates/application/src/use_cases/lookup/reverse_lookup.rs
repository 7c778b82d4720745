use crate::ports::NameResolver;
use ferrous_resolver_domain::{parse_lookup_address, DomainError};
use std::sync::Arc;
use tracing::debug;

pub struct ReverseLookupUseCase {
    resolver: Arc<dyn NameResolver>,
}

impl ReverseLookupUseCase {
    pub fn new(resolver: Arc<dyn NameResolver>) -> Self {
        Self { resolver }
    }

    /// Invalid input fails here, before the resolver is touched.
    pub async fn execute(&self, address: &str) -> Result<String, DomainError> {
        let ip = parse_lookup_address(address)?;
        let hostname = self.resolver.reverse_resolve(&ip.to_string()).await?;
        debug!(address = %ip, hostname = %hostname, "Reverse lookup resolved");
        Ok(hostname)
    }
}
