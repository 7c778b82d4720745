mod key;
mod storage;

pub use key::CacheKey;
pub use storage::ResolverCache;
