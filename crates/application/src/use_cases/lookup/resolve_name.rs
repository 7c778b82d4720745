use crate::ports::NameResolver;
use ferrous_resolver_domain::{AddressFamily, DomainError};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

pub struct ResolveNameUseCase {
    resolver: Arc<dyn NameResolver>,
}

impl ResolveNameUseCase {
    pub fn new(resolver: Arc<dyn NameResolver>) -> Self {
        Self { resolver }
    }

    pub async fn execute(
        &self,
        name: &str,
        family: AddressFamily,
    ) -> Result<Vec<IpAddr>, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Encoding("empty domain name".to_string()));
        }

        let addresses = self.resolver.resolve(name, family).await?;
        debug!(name = %name, family = %family, count = addresses.len(), "Name resolved");
        Ok(addresses)
    }
}
