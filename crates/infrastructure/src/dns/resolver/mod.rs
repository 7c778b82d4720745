mod core;
mod housekeeping;

pub use self::core::StubResolver;
