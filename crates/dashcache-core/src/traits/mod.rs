//! Core traits for cache operations

mod key;
mod metrics;
mod serializer;
mod store;

#[cfg(feature = "tracing")]
mod tracing;

pub use key::CacheKey;
pub use metrics::{CacheMetrics, CacheOperation, NoopMetrics};
pub use store::CacheStore;

#[cfg(feature = "json")]
pub use serializer::JsonSerializer;
pub use serializer::Serializer;

#[cfg(feature = "msgpack")]
pub use serializer::MsgPackSerializer;

#[cfg(feature = "metrics")]
pub use metrics::MetricsCrateAdapter;

#[cfg(feature = "tracing")]
pub use self::tracing::TracingMetrics;
