//! Cache key trait and implementations

use std::fmt::Display;

/// Trait for types that can be used as cache keys
///
/// A key string maps to exactly one payload shape and one TTL policy.
pub trait CacheKey: Send + Sync {
    /// Generate the key string
    fn cache_key(&self) -> String;

    /// Optional namespace for the key
    fn namespace(&self) -> Option<&str> {
        None
    }

    /// Get the full key including namespace
    fn full_key(&self) -> String {
        match self.namespace() {
            Some(ns) => format!("{}:{}", ns, self.cache_key()),
            None => self.cache_key(),
        }
    }
}

impl CacheKey for String {
    fn cache_key(&self) -> String {
        self.clone()
    }
}

impl CacheKey for &str {
    fn cache_key(&self) -> String {
        self.to_string()
    }
}

impl CacheKey for &String {
    fn cache_key(&self) -> String {
        (*self).clone()
    }
}

impl<T1: Display + Send + Sync, T2: Display + Send + Sync> CacheKey for (T1, T2) {
    fn cache_key(&self) -> String {
        format!("{}:{}", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Namespaced(&'static str);

    impl CacheKey for Namespaced {
        fn cache_key(&self) -> String {
            self.0.to_string()
        }

        fn namespace(&self) -> Option<&str> {
            Some("shop")
        }
    }

    #[test]
    fn test_string_key() {
        let key = "dashboard:product:report".to_string();
        assert_eq!(key.cache_key(), "dashboard:product:report");
        assert_eq!(key.full_key(), "dashboard:product:report");
    }

    #[test]
    fn test_str_key() {
        let key = "dashboard:customer:top";
        assert_eq!(key.cache_key(), "dashboard:customer:top");
    }

    #[test]
    fn test_tuple_key() {
        let key = ("dashboard:customer:top", 10);
        assert_eq!(key.cache_key(), "dashboard:customer:top:10");
    }

    #[test]
    fn test_namespaced_key() {
        let key = Namespaced("dashboard:product:report");
        assert_eq!(key.full_key(), "shop:dashboard:product:report");
    }
}
