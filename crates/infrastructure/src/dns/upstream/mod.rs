mod pool;

pub use pool::UpstreamPool;
