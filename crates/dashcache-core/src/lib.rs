//! dashcache-core: Core traits and types for the dashcache workspace
//!
//! This crate defines the contract between the report engine and whatever
//! cache store sits underneath it: the [`CacheStore`] trait, payload
//! serializers, cache keys, entries and observability hooks.

mod error;
mod traits;
mod types;

pub use error::{CacheError, Result};
pub use traits::*;
pub use types::*;
