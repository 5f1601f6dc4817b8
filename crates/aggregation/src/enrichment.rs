//! The parallel enricher (C6): `enrichAll`, a bounded-concurrency map of
//! (item → enrichment lookup) with per-item progress and failure isolation
//! (§4.6).

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::future::Future;

/// One item's enrichment outcome: either the `enrichFn` output, or — on
/// per-item failure — the original item plus an attached error, which does
/// NOT abort the surrounding batch.
pub enum EnrichedItem<T, R> {
    Enriched(R),
    Failed { item: T, error: String },
}

/// Processes `items` in batches of `concurrency`, awaiting each batch
/// before starting the next. `progress` fires in true completion order
/// within a batch — whichever item's lookup lands first is reported
/// first — while the returned `results` are reassembled in input order
/// regardless of completion order.
pub async fn enrich_all<T, R, F, Fut, P>(items: Vec<T>, enrich_fn: F, mut progress: P, concurrency: usize) -> Vec<EnrichedItem<T, R>>
where
    T: Clone + Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, String>> + Send,
    P: FnMut(usize, usize, &T, bool),
{
    let total = items.len();
    let mut completed = 0usize;
    let mut results: Vec<Option<EnrichedItem<T, R>>> = (0..total).map(|_| None).collect();
    let mut offset = 0usize;

    for batch in items.chunks(concurrency.max(1)) {
        let mut in_flight: FuturesUnordered<_> = batch
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, item)| {
                let index = offset + i;
                let fut = enrich_fn(item.clone());
                async move {
                    let outcome = fut.await;
                    (index, item, outcome)
                }
            })
            .collect();

        while let Some((index, item, outcome)) = in_flight.next().await {
            completed += 1;
            match outcome {
                Ok(enriched) => {
                    progress(completed, total, &item, false);
                    results[index] = Some(EnrichedItem::Enriched(enriched));
                }
                Err(error) => {
                    progress(completed, total, &item, true);
                    results[index] = Some(EnrichedItem::Failed { item, error });
                }
            }
        }

        offset += batch.len();
    }

    results.into_iter().map(|slot| slot.expect("every index is filled by its own batch")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn preserves_input_order_even_with_per_item_failures() {
        let items = vec![1, 2, 3, 4, 5];
        let results = enrich_all(
            items,
            |n: i32| async move {
                if n == 3 {
                    Err("boom".to_string())
                } else {
                    Ok(n * 10)
                }
            },
            |_, _, _, _| {},
            2,
        )
        .await;

        let values: Vec<Option<i32>> = results
            .into_iter()
            .map(|r| match r {
                EnrichedItem::Enriched(v) => Some(v),
                EnrichedItem::Failed { .. } => None,
            })
            .collect();
        assert_eq!(values, vec![Some(10), Some(20), None, Some(40), Some(50)]);
    }

    #[tokio::test]
    async fn progress_fires_once_per_item() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();
        let items = vec![1, 2, 3];
        enrich_all(
            items,
            |n: i32| async move { Ok::<i32, String>(n) },
            move |_, _, _, _| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            },
            2,
        )
        .await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn single_item_failure_does_not_abort_the_batch() {
        let items = vec!["a", "b"];
        let results = enrich_all(
            items,
            |s: &str| async move {
                if s == "a" {
                    Err("bad".to_string())
                } else {
                    Ok(s.to_uppercase())
                }
            },
            |_, _, _, _| {},
            2,
        )
        .await;
        assert_eq!(results.len(), 2);
    }
}
