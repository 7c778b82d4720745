pub mod cache;
pub mod lookup;

pub use cache::GetCacheStatsUseCase;
pub use lookup::{ResolveManyUseCase, ResolveNameUseCase, ReverseLookupUseCase};
