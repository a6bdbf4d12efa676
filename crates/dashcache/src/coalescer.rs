//! Single-flight execution of report recomputations

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{ReportError, Result};

type Groups<T> = DashMap<String, broadcast::Sender<Result<T>>>;

/// Deduplicates concurrent recomputations of the same key
///
/// While a computation for a key is in flight, every other caller for that
/// key subscribes to its outcome instead of running its own. The group is
/// retired as soon as the computation finishes, so the next call starts a
/// fresh one; results are never kept here.
///
/// The computation runs on its own task: a caller that gives up (deadline,
/// dropped request) does not cancel the work other callers are waiting on.
pub struct Coalescer<T> {
    inflight: Arc<Groups<T>>,
}

/// How a caller took part in a coalesced computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Started the computation
    Leader,
    /// Joined a computation that was already running
    Follower,
}

/// Removes the group when the computation task ends, even by panic
struct Retire<T> {
    inflight: Arc<Groups<T>>,
    key: String,
}

impl<T> Drop for Retire<T> {
    fn drop(&mut self) {
        self.inflight.remove(&self.key);
    }
}

impl<T> Coalescer<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(DashMap::new()),
        }
    }

    /// Run `f` for `key` unless a run is already in flight, and return its outcome.
    pub async fn execute<F, Fut>(&self, key: &str, f: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.execute_with_role(key, f).await.0
    }

    /// Like [`execute`](Self::execute), also reporting whether this caller led or joined.
    pub async fn execute_with_role<F, Fut>(&self, key: &str, f: F) -> (Result<T>, Role)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        // The shard lock is only held to join or register the group.
        let (mut rx, leader) = match self.inflight.entry(key.to_string()) {
            Entry::Occupied(group) => (group.get().subscribe(), None),
            Entry::Vacant(slot) => {
                let (tx, rx) = broadcast::channel(1);
                slot.insert(tx.clone());
                (rx, Some(tx))
            }
        };

        let role = match leader {
            Some(tx) => {
                let retire = Retire {
                    inflight: self.inflight.clone(),
                    key: key.to_string(),
                };
                let work = f();
                tokio::spawn(async move {
                    let result = work.await;
                    // Retire before publishing: late callers must start a new run.
                    drop(retire);
                    let _ = tx.send(result);
                });
                Role::Leader
            }
            None => {
                debug!(target: "dashcache", key = %key, "joining in-flight recomputation");
                Role::Follower
            }
        };

        let result = match rx.recv().await {
            Ok(result) => result,
            Err(_) => Err(ReportError::Aborted {
                key: key.to_string(),
            }),
        };
        (result, role)
    }

    /// Number of computations currently in flight
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Check whether a computation for `key` is in flight
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.inflight.contains_key(key)
    }
}

impl<T> Default for Coalescer<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Coalescer<T> {
    fn clone(&self) -> Self {
        Self {
            inflight: self.inflight.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_run() {
        let coalescer = Coalescer::<u64>::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let coalescer = coalescer.clone();
            let runs = runs.clone();
            handles.push(tokio::spawn(async move {
                coalescer
                    .execute("report", move || async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        sleep(Duration::from_millis(100)).await;
                        Ok(42)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 42);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(coalescer.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_waiter_gets_the_same_error() {
        let coalescer = Coalescer::<u64>::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let coalescer = coalescer.clone();
            let runs = runs.clone();
            handles.push(tokio::spawn(async move {
                coalescer
                    .execute("report", move || async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        sleep(Duration::from_millis(50)).await;
                        Err(ReportError::repository("deadlock detected"))
                    })
                    .await
            }));
        }

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert_eq!(err.to_string(), "repository error: deadlock detected");
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_group_retired_after_completion() {
        let coalescer = Coalescer::<u64>::new();
        let runs = Arc::new(AtomicUsize::new(0));

        for expected in 1..=3 {
            let counter = runs.clone();
            let value = coalescer
                .execute("report", move || async move {
                    Ok(counter.fetch_add(1, Ordering::SeqCst) as u64 + 1)
                })
                .await
                .unwrap();
            assert_eq!(value, expected);
            assert!(!coalescer.is_in_flight("report"));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_distinct_keys_run_independently() {
        let coalescer = Coalescer::<&'static str>::new();

        let slow = {
            let coalescer = coalescer.clone();
            tokio::spawn(async move {
                coalescer
                    .execute("products", || async {
                        sleep(Duration::from_millis(200)).await;
                        Ok("products")
                    })
                    .await
            })
        };
        sleep(Duration::from_millis(20)).await;

        let started = std::time::Instant::now();
        let fast = coalescer
            .execute("customers", || async { Ok("customers") })
            .await
            .unwrap();

        assert_eq!(fast, "customers");
        assert!(started.elapsed() < Duration::from_millis(150));
        assert_eq!(slow.await.unwrap().unwrap(), "products");
    }

    #[tokio::test]
    async fn test_roles_reported() {
        let coalescer = Coalescer::<u8>::new();

        let leader = coalescer.execute_with_role("k", || async {
            sleep(Duration::from_millis(50)).await;
            Ok(1)
        });
        let follower = async {
            sleep(Duration::from_millis(10)).await;
            coalescer.execute_with_role("k", || async { Ok(2) }).await
        };

        let ((first, first_role), (second, second_role)) = tokio::join!(leader, follower);
        assert_eq!(first.unwrap(), 1);
        assert_eq!(first_role, Role::Leader);
        assert_eq!(second.unwrap(), 1);
        assert_eq!(second_role, Role::Follower);
    }

    #[tokio::test]
    async fn test_panicking_computation_releases_waiters() {
        let coalescer = Coalescer::<u8>::new();

        let result = coalescer
            .execute("k", || async {
                if true {
                    panic!("aggregation blew up");
                }
                Ok(0)
            })
            .await;

        assert!(matches!(result, Err(ReportError::Aborted { .. })));
        assert_eq!(coalescer.in_flight(), 0);

        let value = coalescer.execute("k", || async { Ok(9) }).await.unwrap();
        assert_eq!(value, 9);
    }

    #[tokio::test]
    async fn test_abandoned_caller_does_not_cancel_run() {
        let coalescer = Coalescer::<u8>::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = runs.clone();
        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            coalescer.execute("k", move || async move {
                sleep(Duration::from_millis(60)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(5)
            }),
        )
        .await;
        assert!(abandoned.is_err());

        let joined = coalescer.execute("k", || async { Ok(6) }).await.unwrap();
        assert_eq!(joined, 5);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
