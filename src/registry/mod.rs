//! Session-scoped registries consulted by the session manager

mod topics;
mod will;

pub use topics::{MemoryTopicRegistry, TopicRegistry, TopicRegistryError};
pub use will::{MemoryWillRegistry, WillRegistry};

pub use crate::protocol::WillData;
