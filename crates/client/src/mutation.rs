//! Optimistic mutation protocol.
//!
//! A mutation against cached key `K` runs through a fixed sequence:
//!
//! 1. cancel any in-flight fetch for `K` (a slow background read must not
//!    overwrite the optimistic value)
//! 2. snapshot the current cache entry
//! 3. optionally write the locally predicted post-mutation value, so the UI
//!    reflects the change before the network resolves
//! 4. send the request - never retried
//! 5. on success, write the server's response; it always wins over the
//!    prediction (server-computed totals, stock validation)
//! 6. on failure, restore the snapshot exactly
//! 7. discard the mutation context
//!
//! Two concurrent mutations on one key are deliberately not serialized: the
//! last settlement wins, and the server remains the arbiter of truth.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::cache::{CacheKey, CacheValue, EntityCache};
use crate::error::ApiError;

/// Identifies one in-flight mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationId(Uuid);

impl MutationId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for MutationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of one mutation's cache bookkeeping.
#[derive(Debug, Clone)]
pub enum MutationPhase {
    /// The pre-mutation cache entry has been captured.
    Snapshot { previous: Option<CacheValue> },
    /// The predicted value has been written over the snapshot.
    Predicted { previous: Option<CacheValue> },
    /// Settled; the context is discarded right after entering this phase.
    Reconciled,
}

/// Registry of in-flight mutation contexts, keyed by mutation id.
///
/// Contexts are ephemeral: created at step 2, discarded at step 7. The
/// registry exists so the begin/apply/settle sequence is observable.
#[derive(Clone, Default)]
pub struct MutationTracker {
    inner: Arc<Mutex<HashMap<MutationId, MutationPhase>>>,
}

impl MutationTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutations currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn phase(&self, id: MutationId) -> Option<MutationPhase> {
        self.inner.lock().get(&id).cloned()
    }

    fn begin(&self, id: MutationId, previous: Option<CacheValue>) {
        self.inner
            .lock()
            .insert(id, MutationPhase::Snapshot { previous });
    }

    fn mark_predicted(&self, id: MutationId) {
        let mut inner = self.inner.lock();
        if let Some(phase) = inner.get_mut(&id)
            && let MutationPhase::Snapshot { previous } = phase
        {
            *phase = MutationPhase::Predicted {
                previous: previous.take(),
            };
        }
    }

    /// Settlement: the context moves to [`MutationPhase::Reconciled`] and is
    /// immediately discarded.
    fn finish(&self, id: MutationId) {
        self.inner.lock().remove(&id);
    }
}

/// Run one optimistic mutation to completion.
///
/// `predicted` is the locally computed post-mutation value; pass `None` when
/// no prediction is possible (e.g. adding an item whose server-side line is
/// unknown) - the snapshot/rollback machinery still applies.
///
/// # Errors
///
/// Returns the send error after the snapshot has been restored.
pub async fn run_optimistic<F, Fut>(
    cache: &EntityCache,
    tracker: &MutationTracker,
    key: CacheKey,
    predicted: Option<CacheValue>,
    send: F,
) -> Result<CacheValue, ApiError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<CacheValue, ApiError>>,
{
    let id = MutationId::new();

    cache.supersede(&key);
    let previous = cache.read(&key).and_then(|record| record.data);
    tracker.begin(id, previous.clone());

    if let Some(value) = predicted {
        cache.write(key.clone(), value);
        tracker.mark_predicted(id);
    }

    let result = send().await;
    match &result {
        Ok(value) => {
            cache.write(key, value.clone());
        }
        Err(error) => {
            tracing::warn!(%id, %error, "mutation failed, restoring snapshot");
            match previous {
                Some(snapshot) => cache.write(key, snapshot),
                None => cache.remove(&key),
            }
        }
    }
    tracker.finish(id);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FetchStatus;
    use clementine_core::{CartDto, CartId, CartItemDto, CartItemId, SessionId};
    use clementine_core::{CategoryDto, CategoryId, ProductDto, ProductId};
    use rust_decimal::Decimal;

    fn product(price: Decimal) -> ProductDto {
        ProductDto {
            id: ProductId::new("prod-1"),
            name: "Espresso Cup".to_string(),
            slug: "espresso-cup".to_string(),
            description: "A small cup.".to_string(),
            price,
            stock: 10,
            image_url: None,
            category: CategoryDto {
                id: CategoryId::new("cat-1"),
                name: "Kitchen".to_string(),
                slug: "kitchen".to_string(),
            },
        }
    }

    fn cart(quantity: u32, total: Decimal) -> CacheValue {
        let unit_price = Decimal::new(999, 2);
        CacheValue::Cart(Box::new(CartDto {
            id: CartId::new("cart-1"),
            session_id: SessionId::new("sess-1"),
            items: vec![CartItemDto {
                id: CartItemId::new("item-1"),
                product: product(unit_price),
                quantity,
                unit_price,
            }],
            total,
        }))
    }

    fn quantity_of(value: &CacheValue) -> u32 {
        value
            .as_cart()
            .and_then(|cart| cart.items.first())
            .map_or(0, |item| item.quantity)
    }

    fn key() -> CacheKey {
        CacheKey::cart(CartId::new("cart-1"))
    }

    fn rejected() -> ApiError {
        ApiError {
            message: "Quantity exceeds available stock".to_string(),
            status: 422,
            code: None,
        }
    }

    #[tokio::test]
    async fn test_failure_restores_the_exact_snapshot() {
        let cache = EntityCache::new();
        let tracker = MutationTracker::new();
        cache.write(key(), cart(1, Decimal::new(999, 2)));

        let result = run_optimistic(
            &cache,
            &tracker,
            key(),
            Some(cart(2, Decimal::new(1998, 2))),
            || async { Err(rejected()) },
        )
        .await;

        assert_eq!(result.expect_err("send fails").status, 422);
        let record = cache.read(&key()).expect("record");
        assert_eq!(record.data.as_ref().map(quantity_of), Some(1));
        assert_eq!(tracker.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_success_reconciles_with_the_server_value() {
        let cache = EntityCache::new();
        let tracker = MutationTracker::new();
        cache.write(key(), cart(1, Decimal::new(999, 2)));

        // Local prediction leaves the total untouched; the server recomputes
        // it. The cache must end up equal to the server response.
        let server_total = Decimal::new(1998, 2);
        let value = run_optimistic(
            &cache,
            &tracker,
            key(),
            Some(cart(2, Decimal::new(999, 2))),
            || async move { Ok(cart(2, server_total)) },
        )
        .await
        .expect("send succeeds");

        assert_eq!(quantity_of(&value), 2);
        let record = cache.read(&key()).expect("record");
        let cached = record.data.expect("data");
        assert_eq!(quantity_of(&cached), 2);
        assert_eq!(cached.as_cart().expect("cart").total, server_total);
    }

    #[tokio::test]
    async fn test_prediction_is_visible_while_the_request_is_in_flight() {
        let cache = EntityCache::new();
        let tracker = MutationTracker::new();
        cache.write(key(), cart(1, Decimal::new(999, 2)));

        let reader = cache.clone();
        run_optimistic(
            &cache,
            &tracker,
            key(),
            Some(cart(2, Decimal::new(999, 2))),
            || async move {
                // Between "apply optimistic value" and settlement, reads
                // must see the prediction.
                let record = reader.read(&key()).expect("record");
                assert_eq!(record.data.as_ref().map(quantity_of), Some(2));
                Ok(cart(2, Decimal::new(1998, 2)))
            },
        )
        .await
        .expect("send succeeds");
    }

    #[tokio::test]
    async fn test_failure_with_no_prior_record_removes_the_entry() {
        let cache = EntityCache::new();
        let tracker = MutationTracker::new();

        let result = run_optimistic(&cache, &tracker, key(), None, || async {
            Err(rejected())
        })
        .await;

        assert!(result.is_err());
        assert!(cache.read(&key()).is_none());
    }

    #[tokio::test]
    async fn test_mutation_supersedes_an_in_flight_read() {
        let cache = EntityCache::new();
        let tracker = MutationTracker::new();
        cache.write(key(), cart(1, Decimal::new(999, 2)));
        cache.invalidate(crate::cache::EntityKind::Cart);

        // A slow background refetch resolves to the stale quantity long
        // after the mutation settled; it must not land.
        let slow_read = tokio::spawn({
            let cache = cache.clone();
            async move {
                cache
                    .fetch(key(), std::time::Duration::from_secs(30), || async {
                        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                        Ok(cart(1, Decimal::new(999, 2)))
                    })
                    .await
            }
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        run_optimistic(
            &cache,
            &tracker,
            key(),
            Some(cart(5, Decimal::new(999, 2))),
            || async { Ok(cart(5, Decimal::new(4995, 2))) },
        )
        .await
        .expect("mutation succeeds");

        let _ = slow_read.await.expect("join");
        let record = cache.read(&key()).expect("record");
        assert_eq!(record.data.as_ref().map(quantity_of), Some(5));
        assert_eq!(record.status, FetchStatus::Success);
    }
}
