//! Parallel batch runner.
//!
//! Street batches are independent of each other, so they are fanned out
//! over tokio's blocking thread pool. Outputs are handed to the sink in
//! input order, which keeps writes serialised and attributed to the right
//! street regardless of which worker finished first.

use std::pin::pin;

use futures::StreamExt;

use crate::BuildError;

/// Runs `work` over every item on blocking workers, at most `concurrency`
/// at a time, and feeds each output to `sink` in input order.
///
/// Returns the number of items processed. Stops at the first sink error.
///
/// # Errors
///
/// Returns the sink's error, or [`BuildError::Join`] if a worker panics.
pub async fn run_batches<T, R, F, S, E>(
    items: impl IntoIterator<Item = T>,
    concurrency: usize,
    work: F,
    mut sink: S,
) -> Result<u64, E>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Clone + Send + 'static,
    S: FnMut(R) -> Result<(), E>,
    E: From<BuildError>,
{
    let tasks = futures::stream::iter(items.into_iter().map(move |item| {
        let work = work.clone();
        tokio::task::spawn_blocking(move || work(item))
    }))
    .buffered(concurrency.max(1));

    let mut tasks = pin!(tasks);
    let mut processed = 0u64;

    while let Some(joined) = tasks.next().await {
        let output = joined.map_err(BuildError::from)?;
        sink(output)?;
        processed += 1;
    }

    Ok(processed)
}
