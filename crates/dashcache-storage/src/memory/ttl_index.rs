//! Time wheel of pending expirations

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Time-wheel based TTL index
///
/// Keys are bucketed by the tick in which they expire so that cleanup only
/// looks at the keys that are due instead of scanning the whole store.
/// Resolution is one tick; the store still checks the exact TTL on read.
pub struct TtlIndex {
    /// Bucket resolution
    tick: Duration,
    /// Keys by expiration slot
    buckets: Vec<HashSet<String>>,
    /// Slot the wheel currently points at
    current: usize,
    /// key -> slot, for O(1) removal
    slots: HashMap<String, usize>,
    /// When the wheel last advanced
    last_tick: Instant,
}

impl TtlIndex {
    /// Create a wheel with `tick` resolution that can hold TTLs up to `max_ttl`
    pub fn new(tick: Duration, max_ttl: Duration) -> Self {
        Self::starting_at(tick, max_ttl, Instant::now())
    }

    fn starting_at(tick: Duration, max_ttl: Duration, now: Instant) -> Self {
        let tick = tick.max(Duration::from_millis(1));
        let slots = (max_ttl.as_millis() / tick.as_millis()) as usize + 2;

        Self {
            tick,
            buckets: vec![HashSet::new(); slots.max(60)],
            current: 0,
            slots: HashMap::new(),
            last_tick: now,
        }
    }

    fn ticks_for(&self, ttl: Duration) -> usize {
        let ticks = ttl.as_millis().div_ceil(self.tick.as_millis()) as usize;
        // The last slot is reserved so a full-length TTL never lands on `current`.
        ticks.clamp(1, self.buckets.len() - 1)
    }

    /// Schedule `key` to expire after `ttl`, replacing any earlier schedule
    pub fn schedule(&mut self, key: String, ttl: Duration) {
        self.schedule_at(key, ttl, Instant::now());
    }

    fn schedule_at(&mut self, key: String, ttl: Duration, now: Instant) {
        self.remove(&key);

        // The wheel position trails `now` by up to one tick; a key must never
        // come due before its TTL has elapsed.
        let lag = now.saturating_duration_since(self.last_tick);
        let slot = (self.current + self.ticks_for(ttl + lag)) % self.buckets.len();
        self.buckets[slot].insert(key.clone());
        self.slots.insert(key, slot);
    }

    /// Remove a key from the index
    pub fn remove(&mut self, key: &str) {
        if let Some(slot) = self.slots.remove(key) {
            self.buckets[slot].remove(key);
        }
    }

    /// Check if a key is scheduled
    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Advance the wheel to now and return the keys that became due
    pub fn tick(&mut self) -> Vec<String> {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> Vec<String> {
        let elapsed = now.saturating_duration_since(self.last_tick);
        let steps = (elapsed.as_millis() / self.tick.as_millis()) as usize;
        if steps == 0 {
            return Vec::new();
        }

        let mut due = Vec::new();
        for _ in 0..steps.min(self.buckets.len()) {
            self.current = (self.current + 1) % self.buckets.len();
            for key in self.buckets[self.current].drain() {
                self.slots.remove(&key);
                due.push(key);
            }
        }

        self.last_tick += self.tick * steps as u32;
        due
    }

    /// Get the number of scheduled keys
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Clear all scheduled keys
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.slots.clear();
    }
}

impl Default for TtlIndex {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(86400))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_and_remove() {
        let mut index = TtlIndex::new(Duration::from_secs(1), Duration::from_secs(600));

        index.schedule("dashboard:product:report".to_string(), Duration::from_secs(300));
        assert!(index.contains("dashboard:product:report"));
        assert_eq!(index.len(), 1);

        index.remove("dashboard:product:report");
        assert!(index.is_empty());
    }

    #[test]
    fn test_reschedule_keeps_single_slot() {
        let mut index = TtlIndex::new(Duration::from_secs(1), Duration::from_secs(600));

        index.schedule("k".to_string(), Duration::from_secs(10));
        index.schedule("k".to_string(), Duration::from_secs(20));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_tick_returns_due_keys_only() {
        let start = Instant::now();
        let mut index =
            TtlIndex::starting_at(Duration::from_secs(1), Duration::from_secs(600), start);

        index.schedule("short".to_string(), Duration::from_secs(2));
        index.schedule("long".to_string(), Duration::from_secs(300));

        assert!(index.tick_at(start + Duration::from_millis(500)).is_empty());
        assert_eq!(index.tick_at(start + Duration::from_secs(2)), vec!["short".to_string()]);
        assert!(index.contains("long"));
        assert!(!index.contains("short"));

        assert_eq!(index.tick_at(start + Duration::from_secs(300)), vec!["long".to_string()]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_schedule_between_ticks_not_due_early() {
        let start = Instant::now();
        let mut index =
            TtlIndex::starting_at(Duration::from_secs(1), Duration::from_secs(600), start);

        // Wheel still points at `start` when the key is written 900ms later.
        index.schedule_at("k".to_string(), Duration::from_secs(1), start + Duration::from_millis(900));

        assert!(index.tick_at(start + Duration::from_millis(1150)).is_empty());
        assert!(index.contains("k"));
        assert_eq!(index.tick_at(start + Duration::from_secs(2)), vec!["k".to_string()]);
    }

    #[test]
    fn test_clear() {
        let mut index = TtlIndex::default();
        index.schedule("a".to_string(), Duration::from_secs(10));
        index.schedule("b".to_string(), Duration::from_secs(20));

        index.clear();
        assert!(index.is_empty());
    }
}
