//! Sequential batch execution with progress reporting.
//!
//! Items run strictly one after another; the next item starts only after the
//! previous one resolved. The failure policy is an explicit argument rather
//! than a property of the loop body.

use std::future::Future;

use serde::Serialize;

/// What to do when an item fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failure; remaining items are never attempted.
    #[default]
    AbortOnFirst,
    /// Attempt every item, then report the first failure.
    ContinueOnError,
}

/// `completed` counts successful items only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_done(&self) -> bool {
        self.completed == self.total
    }
}

#[derive(Debug)]
pub enum BatchOutcome<T, E> {
    /// Every item succeeded; outputs are in item order.
    Completed(Vec<T>),
    Failed {
        progress: Progress,
        /// Index of the first failing item.
        index: usize,
        error: E,
        /// Number of failed items (always 1 under [`FailurePolicy::AbortOnFirst`]).
        failures: usize,
    },
}

impl<T, E> BatchOutcome<T, E> {
    pub fn into_result(self) -> Result<Vec<T>, E> {
        match self {
            BatchOutcome::Completed(outputs) => Ok(outputs),
            BatchOutcome::Failed { error, .. } => Err(error),
        }
    }
}

/// Run `op` over `items` one at a time.
///
/// `on_progress` fires once before the first item (with `completed = 0`)
/// and again after each successful item. The future returned by `op` may
/// borrow the item.
pub async fn run_sequential<'a, I, T, E, F, Fut, P>(
    items: &'a [I],
    policy: FailurePolicy,
    mut op: F,
    mut on_progress: P,
) -> BatchOutcome<T, E>
where
    F: FnMut(usize, &'a I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(Progress),
{
    let total = items.len();
    let mut progress = Progress {
        completed: 0,
        total,
    };
    let mut outputs = Vec::with_capacity(total);
    let mut first_failure: Option<(usize, E)> = None;
    let mut failures = 0;

    on_progress(progress);

    for (index, item) in items.iter().enumerate() {
        match op(index, item).await {
            Ok(output) => {
                outputs.push(output);
                progress.completed += 1;
                on_progress(progress);
            }
            Err(error) => {
                failures += 1;
                if first_failure.is_none() {
                    first_failure = Some((index, error));
                }
                if policy == FailurePolicy::AbortOnFirst {
                    break;
                }
            }
        }
    }

    match first_failure {
        None => BatchOutcome::Completed(outputs),
        Some((index, error)) => BatchOutcome::Failed {
            progress,
            index,
            error,
            failures,
        },
    }
}
