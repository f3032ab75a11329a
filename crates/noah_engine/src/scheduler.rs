use std::future::Future;

use futures_util::stream::{FuturesUnordered, StreamExt};

/// Runs deferred operations with a sliding window of at most `limit` in
/// flight and returns their results in input order.
///
/// Each task is invoked as soon as a slot is free. Once the window is full
/// the loop waits for whichever in-flight operation settles first, then
/// invokes exactly one more. Failures are ordinary values of `T` and never
/// stop dispatch. A `limit` of zero is treated as one.
pub async fn run_bounded<I, F, Fut, T>(tasks: I, limit: usize) -> Vec<T>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let limit = limit.max(1);
    let mut slots: Vec<Option<T>> = Vec::new();
    let mut in_flight = FuturesUnordered::new();

    for (index, task) in tasks.into_iter().enumerate() {
        slots.push(None);
        let operation = task();
        in_flight.push(async move { (index, operation.await) });

        if in_flight.len() >= limit {
            if let Some((settled, result)) = in_flight.next().await {
                slots[settled] = Some(result);
            }
        }
    }

    while let Some((settled, result)) = in_flight.next().await {
        slots[settled] = Some(result);
    }

    slots.into_iter().flatten().collect()
}
