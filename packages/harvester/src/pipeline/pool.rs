//! Fixed-width worker pool with ordered results.

use futures::future::join_all;
use std::future::Future;
use tokio::sync::Mutex;

/// Map `items` through `f` with at most `width` calls in flight.
///
/// Workers pull the next pending item from a shared queue until it is empty.
/// Results land in a slot array indexed by input position, so the output
/// order matches `items` regardless of completion order.
pub async fn map_ordered<I, T, F, Fut>(items: Vec<I>, width: usize, f: F) -> Vec<T>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = T>,
{
    let len = items.len();
    if len == 0 {
        return Vec::new();
    }

    let queue = Mutex::new(items.into_iter().enumerate());
    let (queue, f) = (&queue, &f);
    let workers = (0..width.clamp(1, len)).map(|_| async move {
        let mut done = Vec::new();
        loop {
            let next = queue.lock().await.next();
            let Some((index, item)) = next else {
                break;
            };
            done.push((index, f(item).await));
        }
        done
    });

    let mut slots: Vec<Option<T>> = (0..len).map(|_| None).collect();
    for (index, value) in join_all(workers).await.into_iter().flatten() {
        slots[index] = Some(value);
    }
    slots.into_iter().flatten().collect()
}
