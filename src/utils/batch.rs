// Bounded-concurrency fan-out

use futures::stream::{self, StreamExt};
use std::future::Future;

/// Run `op` over `items` with at most `concurrency` in flight.
///
/// Every item gets its own result; one failure never cancels the others.
/// Results come back in input order regardless of completion order.
pub async fn run_bounded<I, T, E, F, Fut>(
    items: Vec<I>,
    concurrency: usize,
    op: F,
) -> Vec<(I, Result<T, E>)>
where
    I: Clone,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut results: Vec<(usize, I, Result<T, E>)> = stream::iter(items.into_iter().enumerate())
        .map(|(position, item)| {
            let fut = op(item.clone());
            async move { (position, item, fut.await) }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(position, _, _)| *position);
    results
        .into_iter()
        .map(|(_, item, result)| (item, result))
        .collect()
}
