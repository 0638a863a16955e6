//! Parallel execution of blocking work on Tokio's blocking pool.
//!
//! Rendering and file I/O are CPU or disk bound, so each unit of work runs inside
//! `tokio::task::spawn_blocking` and the handles are joined with
//! [`futures::future::try_join_all`]. Results come back in input order.
//!
//! # Examples
//!
//! ```rust,no_run
//! use docweave::utils::parallel::map_blocking;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let lengths = map_blocking(vec!["a".to_string(), "bcd".to_string()], Arc::new(|s: String| {
//!     Ok(s.len())
//! }))
//! .await?;
//! assert_eq!(lengths, vec![1, 3]);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use futures::future::try_join_all;
use std::sync::Arc;

/// Apply `f` to every item on the blocking pool and collect the results in input order.
///
/// Every task runs to completion. If any fail, the remaining failures are logged and the
/// first one (in input order) is returned unchanged, so typed errors can still be
/// recovered by the caller.
///
/// # Errors
///
/// Returns the first error produced by `f`, or a join error if a task panicked.
pub async fn map_blocking<T, R, F>(items: Vec<T>, f: Arc<F>) -> Result<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Result<R> + Send + Sync + 'static,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let mut tasks = Vec::with_capacity(items.len());
    for item in items {
        let f = Arc::clone(&f);
        tasks.push(tokio::task::spawn_blocking(move || f(item)));
    }

    let results = try_join_all(tasks).await.context("Failed to join blocking tasks")?;

    let mut successes = Vec::with_capacity(results.len());
    let mut first_error = None;
    let mut failures = 0usize;

    for result in results {
        match result {
            Ok(value) => successes.push(value),
            Err(e) => {
                failures += 1;
                if first_error.is_none() {
                    first_error = Some(e);
                } else {
                    tracing::error!("{e:#}");
                }
            }
        }
    }

    match first_error {
        Some(e) => {
            if failures > 1 {
                tracing::error!("{failures} parallel tasks failed; reporting the first");
            }
            Err(e)
        }
        None => Ok(successes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DocError;

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let items: Vec<u64> = (0..64).collect();
        let doubled = map_blocking(
            items,
            Arc::new(|n: u64| {
                std::thread::sleep(std::time::Duration::from_millis(64 - n));
                Ok(n * 2)
            }),
        )
        .await
        .unwrap();

        assert_eq!(doubled, (0..64).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_first_typed_error_is_preserved() {
        let result = map_blocking(
            vec![1, 2, 3],
            Arc::new(|n: usize| {
                if n >= 2 {
                    Err(DocError::FragmentCycle {
                        id: n.to_string(),
                    }
                    .into())
                } else {
                    Ok(n)
                }
            }),
        )
        .await;

        let err = result.unwrap_err();
        match err.downcast_ref::<DocError>() {
            Some(DocError::FragmentCycle { id }) => assert_eq!(id, "2"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_input() {
        let out: Vec<()> = map_blocking(Vec::<()>::new(), Arc::new(|()| Ok(()))).await.unwrap();
        assert!(out.is_empty());
    }
}
