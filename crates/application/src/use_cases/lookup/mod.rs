mod resolve_many;
mod resolve_name;
mod reverse_lookup;

pub use resolve_many::ResolveManyUseCase;
pub use resolve_name::ResolveNameUseCase;
pub use reverse_lookup::ReverseLookupUseCase;
