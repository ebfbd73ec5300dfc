//! Bounded worker pool for concurrency-limited batch work.
//!
//! Exactly `concurrency` tokio tasks drain a shared queue; a worker that
//! finishes one item immediately pulls the next. Per-item failures are
//! captured in the item's outcome and never abort sibling workers.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::error::{NightbriefError, Result};

/// One processed item with its outcome, tagged with the originating input
/// so callers can re-correlate results (e.g. by URL).
#[derive(Debug)]
pub struct PoolItem<T, R> {
    pub item: T,
    pub outcome: Result<R>,
}

/// Process `items` with at most `concurrency` workers running at once.
///
/// Returns one [`PoolItem`] per input. Completion order is not input order.
/// `concurrency` must be at least 1.
pub async fn run_pool<T, R, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    worker: F,
) -> Result<Vec<PoolItem<T, R>>>
where
    T: Clone + Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    if concurrency == 0 {
        return Err(NightbriefError::validation(
            "worker pool concurrency must be >= 1",
        ));
    }

    let queue = Arc::new(Mutex::new(VecDeque::from(items)));
    let worker = Arc::new(worker);

    let mut handles = Vec::with_capacity(concurrency);
    for _ in 0..concurrency {
        let queue = Arc::clone(&queue);
        let worker = Arc::clone(&worker);

        handles.push(tokio::spawn(async move {
            let mut processed = Vec::new();
            loop {
                let item = { queue.lock().await.pop_front() };
                let Some(item) = item else { break };

                let outcome = worker(item.clone()).await;
                if let Err(e) = &outcome {
                    warn!(error = %e, "worker pool item failed");
                }
                processed.push(PoolItem { item, outcome });
            }
            processed
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        let mut processed = handle.await.map_err(|e| {
            NightbriefError::validation(format!("worker task panicked: {e}"))
        })?;
        results.append(&mut processed);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn processes_every_item_exactly_once() {
        let items: Vec<u32> = (0..20).collect();
        let results = run_pool(items, 4, |n: u32| async move { Ok(n * 2) })
            .await
            .unwrap();

        assert_eq!(results.len(), 20);
        let mut seen: Vec<u32> = results.iter().map(|r| r.item).collect();
        seen.sort();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
        for r in &results {
            assert_eq!(*r.outcome.as_ref().unwrap(), r.item * 2);
        }
    }

    #[tokio::test]
    async fn failures_do_not_abort_siblings() {
        let items: Vec<u32> = (0..10).collect();
        let results = run_pool(items, 3, |n: u32| async move {
            if n % 2 == 0 {
                Err(NightbriefError::validation(format!("even: {n}")))
            } else {
                Ok(n)
            }
        })
        .await
        .unwrap();

        assert_eq!(results.len(), 10);
        let failures = results.iter().filter(|r| r.outcome.is_err()).count();
        assert_eq!(failures, 5);
        // Every failure is tagged with its originating item.
        for r in results.iter().filter(|r| r.outcome.is_err()) {
            assert_eq!(r.item % 2, 0);
        }
    }

    #[tokio::test]
    async fn respects_concurrency_limit() {
        let live = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let live_ref = Arc::clone(&live);
        let peak_ref = Arc::clone(&peak);

        let items: Vec<u32> = (0..12).collect();
        run_pool(items, 2, move |_n: u32| {
            let live = Arc::clone(&live_ref);
            let peak = Arc::clone(&peak_ref);
            async move {
                let now = live.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                live.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn zero_concurrency_is_rejected() {
        let result = run_pool(vec![1u32], 0, |n: u32| async move { Ok(n) }).await;
        assert!(matches!(
            result,
            Err(NightbriefError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let results = run_pool(Vec::<u32>::new(), 3, |n: u32| async move { Ok(n) })
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
