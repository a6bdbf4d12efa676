//! In-memory cache store

mod store;
mod ttl_index;

pub use store::{MemoryConfig, MemoryStore};
