//! Fail-fast concurrent join

use std::future::Future;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::error::{ReportError, Result};

/// Runs independent branches concurrently and stops at the first failure
///
/// Each branch writes its output into a slot owned by the caller and returns
/// `Ok(())` or an error. [`wait`](Self::wait) polls every branch before any
/// of them is awaited individually, returns the first error as soon as it is
/// produced, and drops the branches that are still running.
///
/// ```ignore
/// let mut totals = ProductTotalsRow::default();
/// let mut recent = Vec::new();
///
/// let mut group = JoinGroup::new();
/// group.push(async {
///     totals = repo.fetch_product_totals().await?;
///     Ok(())
/// });
/// group.push(async {
///     recent = repo.fetch_recent_products(5).await?;
///     Ok(())
/// });
/// group.wait().await?;
/// ```
pub struct JoinGroup<'a, E> {
    branches: FuturesUnordered<BoxFuture<'a, std::result::Result<(), E>>>,
}

impl<'a, E: Send + 'a> JoinGroup<'a, E> {
    pub fn new() -> Self {
        Self {
            branches: FuturesUnordered::new(),
        }
    }

    /// Add a branch
    pub fn push<F>(&mut self, branch: F)
    where
        F: Future<Output = std::result::Result<(), E>> + Send + 'a,
    {
        self.branches.push(branch.boxed());
    }

    /// Number of branches not yet finished
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// Check if the group has no branches
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Drive all branches; `Ok` once every branch succeeded, else the first error
    pub async fn wait(mut self) -> std::result::Result<(), E> {
        while let Some(outcome) = self.branches.next().await {
            outcome?;
        }
        Ok(())
    }
}

impl<'a, E: Send + 'a> Default for JoinGroup<'a, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run two fallible futures concurrently, returning both outputs or the first error
pub async fn try_join2<A, B, FA, FB>(a: FA, b: FB) -> Result<(A, B)>
where
    FA: Future<Output = Result<A>>,
    FB: Future<Output = Result<B>>,
{
    futures_util::future::try_join(a, b).await
}

/// Bound `fut` by `deadline`, surfacing [`ReportError::Timeout`] when it elapses
pub async fn with_deadline<T, F>(deadline: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ReportError::Timeout)?,
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_all_slots_filled_on_success() {
        let mut left = 0u32;
        let mut right = String::new();

        let mut group = JoinGroup::<ReportError>::new();
        group.push(async {
            sleep(Duration::from_millis(20)).await;
            left = 7;
            Ok(())
        });
        group.push(async {
            right = "seven".to_string();
            Ok(())
        });
        assert_eq!(group.len(), 2);
        group.wait().await.unwrap();

        assert_eq!(left, 7);
        assert_eq!(right, "seven");
    }

    #[tokio::test]
    async fn test_branches_run_concurrently() {
        let mut group = JoinGroup::<ReportError>::new();
        for _ in 0..2 {
            group.push(async {
                sleep(Duration::from_millis(100)).await;
                Ok(())
            });
        }

        let started = Instant::now();
        group.wait().await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(180));
    }

    #[tokio::test]
    async fn test_first_error_returned_without_waiting_for_slow_branch() {
        let slow_finished = Arc::new(AtomicBool::new(false));
        let flag = slow_finished.clone();

        let mut group = JoinGroup::new();
        group.push(async move {
            sleep(Duration::from_millis(500)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });
        group.push(async {
            sleep(Duration::from_millis(10)).await;
            Err(ReportError::repository("totals query failed"))
        });

        let started = Instant::now();
        let err = group.wait().await.unwrap_err();

        assert_eq!(err.to_string(), "repository error: totals query failed");
        assert!(started.elapsed() < Duration::from_millis(200));
        assert!(!slow_finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_empty_group_succeeds() {
        let group = JoinGroup::<ReportError>::default();
        assert!(group.is_empty());
        group.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_try_join2_returns_both() {
        let (a, b) = try_join2(async { Ok(1u8) }, async {
            sleep(Duration::from_millis(10)).await;
            Ok("two")
        })
        .await
        .unwrap();
        assert_eq!((a, b), (1, "two"));
    }

    #[tokio::test]
    async fn test_try_join2_fails_fast() {
        let started = Instant::now();
        let result: Result<(u8, u8)> = try_join2(
            async {
                sleep(Duration::from_millis(500)).await;
                Ok(1)
            },
            async { Err(ReportError::repository("customers query failed")) },
        )
        .await;

        assert!(matches!(result, Err(ReportError::Repository(_))));
        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_deadline_elapses() {
        let result = with_deadline(Some(Duration::from_millis(20)), async {
            sleep(Duration::from_millis(200)).await;
            Ok(1)
        })
        .await;
        assert!(matches!(result, Err(ReportError::Timeout)));
    }

    #[tokio::test]
    async fn test_no_deadline_passes_through() {
        let value = with_deadline(None, async { Ok(3) }).await.unwrap();
        assert_eq!(value, 3);
    }
}
