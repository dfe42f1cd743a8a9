//! Cache implementations

mod in_memory;
mod noop;

pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use noop::NoopCache;
