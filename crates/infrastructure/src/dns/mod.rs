pub mod cache;
pub mod codec;
pub mod multiplexer;
pub mod resolver;
pub mod transport;
pub mod upstream;

pub use cache::{CacheKey, ResolverCache};
pub use codec::{decode_message, encode_query, Header, Message, ResponseCode};
pub use multiplexer::{DispatchOutcome, QueryMultiplexer};
pub use resolver::StubResolver;
pub use transport::UdpTransport;
pub use upstream::UpstreamPool;
