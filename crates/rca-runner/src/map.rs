//! Bounded-concurrency map over an ordered batch.

use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Completed/total counter for one batch.
#[derive(Debug)]
pub struct Progress {
    label: String,
    total: usize,
    done: AtomicUsize,
}

impl Progress {
    pub fn new(label: impl Into<String>, total: usize) -> Self {
        Self {
            label: label.into(),
            total,
            done: AtomicUsize::new(0),
        }
    }

    /// Record one completion and return the new count.
    pub fn tick(&self) -> usize {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        info!(label = %self.label, done, total = self.total, "{}: {done}/{}", self.label, self.total);
        done
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Apply `f` to every input with at most `limit` invocations in flight.
///
/// Results come back in input order. The first error is returned and every
/// other in-flight invocation is dropped; inputs not yet started never run.
/// A `limit` of 0 is treated as 1, which is strictly sequential.
pub async fn map_async<I, T, E, F, Fut>(inputs: Vec<I>, limit: usize, f: F) -> Result<Vec<T>, E>
where
    F: FnMut(I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let progress = Progress::new("map_async", inputs.len());
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None)
        .take(inputs.len())
        .collect();

    let mut completions = indexed(inputs, limit, f);
    while let Some((index, outcome)) = completions.next().await {
        slots[index] = Some(outcome?);
        progress.tick();
    }
    Ok(slots.into_iter().flatten().collect())
}

/// Like [`map_async`] but runs every input and returns each outcome, in
/// input order.
pub async fn map_async_settled<I, T, E, F, Fut>(inputs: Vec<I>, limit: usize, f: F) -> Vec<Result<T, E>>
where
    F: FnMut(I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let progress = Progress::new("map_async_settled", inputs.len());
    let mut slots: Vec<Option<Result<T, E>>> = std::iter::repeat_with(|| None)
        .take(inputs.len())
        .collect();

    let mut completions = indexed(inputs, limit, f);
    while let Some((index, outcome)) = completions.next().await {
        slots[index] = Some(outcome);
        progress.tick();
    }
    slots.into_iter().flatten().collect()
}

/// Stream of `(input index, outcome)` in completion order. `f` is only
/// invoked when a slot is free.
fn indexed<I, T, E, F, Fut>(
    inputs: Vec<I>,
    limit: usize,
    mut f: F,
) -> impl futures::Stream<Item = (usize, Result<T, E>)>
where
    F: FnMut(I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let tasks = inputs.into_iter().enumerate().map(move |(index, input)| {
        let fut = f(input);
        async move { (index, fut.await) }
    });
    stream::iter(tasks).buffer_unordered(limit.max(1))
}
