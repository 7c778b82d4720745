use async_trait::async_trait;
use ferrous_resolver_domain::{AddressFamily, DomainError};
use futures::future::join_all;
use std::net::IpAddr;

/// Result of one name inside a batch, keyed by the name as given.
pub type NameResolution = (String, Result<Vec<IpAddr>, DomainError>);

#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn resolve(&self, name: &str, family: AddressFamily)
        -> Result<Vec<IpAddr>, DomainError>;

    /// Returns the PTR target for `address`, without its trailing dot.
    async fn reverse_resolve(&self, address: &str) -> Result<String, DomainError>;

    /// Resolves every name concurrently. The output follows the input order
    /// and one failure never cancels the others.
    async fn resolve_many(&self, names: &[String], family: AddressFamily) -> Vec<NameResolution> {
        join_all(names.iter().map(|name| async move {
            let result = self.resolve(name, family).await;
            (name.clone(), result)
        }))
        .await
    }
}
