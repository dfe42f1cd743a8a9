//! Event bus implementations

mod in_memory;
mod noop;

pub use in_memory::BroadcastEventBus;
pub use noop::NoopEventBus;
