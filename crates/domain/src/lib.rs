//! Ferrous Resolver Domain Layer
pub mod address_family;
pub mod config;
pub mod dns_query;
pub mod dns_record;
pub mod errors;
pub mod reverse_name;
pub mod upstream;

pub use address_family::AddressFamily;
pub use config::{BackoffStrategy, CliOverrides, Config, ConfigError, ResolverConfig};
pub use dns_query::{names_equal, DnsQuery, Question};
pub use dns_record::{DnsRecord, RecordClass, RecordData, RecordType};
pub use errors::{DomainError, ResolutionErrorKind};
pub use reverse_name::{parse_lookup_address, reverse_name};
pub use upstream::{parse_upstream_addr, ServerHealth, UpstreamServer, DEFAULT_DNS_PORT};
