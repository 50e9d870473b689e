//! Keyed entity cache with stale-while-revalidate semantics.
//!
//! One process-wide cache holds every server entity the client has seen,
//! keyed by [`CacheKey`]. The rules, in order of importance:
//!
//! - reads never block and never clear data: a record keeps its last-known
//!   value through `Loading` and `Error`
//! - a fresh record short-circuits the loader entirely
//! - concurrent fetches for one key share a single loader invocation
//! - a background read that was superseded (by an optimistic write, an
//!   invalidation, or an explicit supersede) must never land its result
//!
//! Superseding is tracked with a per-slot generation counter: every write
//! bumps it, and a finishing load only applies its result if the generation
//! it started under is still current.

mod key;
mod record;
mod value;

pub use key::{CacheKey, EntityKind};
pub use record::{CacheRecord, FetchStatus};
pub use value::CacheValue;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::ApiError;

/// Stale window applied when a record is created by a direct write before
/// any fetch declared a policy for it.
const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30);

/// Extra attempts for read-side loads on transient failures. Mutations
/// never retry.
const READ_RETRY_LIMIT: usize = 2;

struct Inflight {
    id: u64,
    done: watch::Sender<()>,
}

struct Slot {
    record: CacheRecord,
    generation: u64,
    inflight: Option<Inflight>,
}

impl Slot {
    fn new(stale_after: Duration) -> Self {
        Self {
            record: CacheRecord::empty(stale_after),
            generation: 0,
            inflight: None,
        }
    }

    /// Leave `Loading` without a result (the in-flight load was cancelled).
    fn settle_without_result(&mut self) {
        if self.record.status == FetchStatus::Loading {
            self.record.status = if self.record.data.is_some() {
                FetchStatus::Success
            } else {
                FetchStatus::Idle
            };
        }
    }
}

struct CacheShared {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    fetch_seq: AtomicU64,
}

enum FetchAction {
    Hit(CacheValue),
    Join(watch::Receiver<()>),
    Load { id: u64, generation: u64 },
}

/// Process-wide entity cache. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct EntityCache {
    inner: Arc<CacheShared>,
}

impl EntityCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CacheShared {
                slots: Mutex::new(HashMap::new()),
                fetch_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Current record for `key`, if any. Never blocks, never triggers I/O.
    #[must_use]
    pub fn read(&self, key: &CacheKey) -> Option<CacheRecord> {
        self.inner.slots.lock().get(key).map(|slot| slot.record.clone())
    }

    /// Return the cached value, loading it if absent or stale.
    ///
    /// A fresh record is returned without invoking `loader`. While a load is
    /// in flight, further callers join it instead of issuing their own.
    /// On failure the previous `data` is retained and the record is marked
    /// `Error`.
    ///
    /// # Errors
    ///
    /// Returns the normalized error of the (shared) load after transparent
    /// retries of transient failures.
    pub async fn fetch<F, Fut>(
        &self,
        key: CacheKey,
        stale_after: Duration,
        loader: F,
    ) -> Result<CacheValue, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<CacheValue, ApiError>>,
    {
        loop {
            match self.begin_fetch(&key, stale_after) {
                FetchAction::Hit(value) => return Ok(value),
                FetchAction::Join(mut done) => {
                    let _ = done.changed().await;
                    if let Some(outcome) = self.joined_outcome(&key) {
                        return outcome;
                    }
                    // The load we joined was cancelled; take another turn.
                }
                FetchAction::Load { id, generation } => {
                    let result = run_with_retries(&loader).await;
                    return self.finish_fetch(&key, id, generation, result);
                }
            }
        }
    }

    fn begin_fetch(&self, key: &CacheKey, stale_after: Duration) -> FetchAction {
        let mut slots = self.inner.slots.lock();
        let slot = slots
            .entry(key.clone())
            .or_insert_with(|| Slot::new(stale_after));

        if slot.record.is_fresh()
            && let Some(data) = &slot.record.data
        {
            tracing::debug!(?key, "cache hit");
            return FetchAction::Hit(data.clone());
        }
        if let Some(inflight) = &slot.inflight {
            return FetchAction::Join(inflight.done.subscribe());
        }

        let id = self.inner.fetch_seq.fetch_add(1, Ordering::Relaxed);
        let (done, _) = watch::channel(());
        slot.inflight = Some(Inflight { id, done });
        slot.record.status = FetchStatus::Loading;
        slot.record.stale_after = stale_after;
        FetchAction::Load {
            id,
            generation: slot.generation,
        }
    }

    /// What a caller that joined a shared load should return once that load
    /// settled. `None` means the load was cancelled and the caller should
    /// start over.
    fn joined_outcome(&self, key: &CacheKey) -> Option<Result<CacheValue, ApiError>> {
        let slots = self.inner.slots.lock();
        let slot = slots.get(key)?;
        match slot.record.status {
            FetchStatus::Success => slot.record.data.clone().map(Ok),
            FetchStatus::Error => slot.record.error.clone().map(Err),
            FetchStatus::Idle | FetchStatus::Loading => None,
        }
    }

    fn finish_fetch(
        &self,
        key: &CacheKey,
        id: u64,
        generation: u64,
        result: Result<CacheValue, ApiError>,
    ) -> Result<CacheValue, ApiError> {
        let mut slots = self.inner.slots.lock();
        let Some(slot) = slots.get_mut(key) else {
            // Record removed while we were loading; nothing to update.
            return result;
        };

        let ours = slot.inflight.as_ref().is_some_and(|inflight| inflight.id == id);
        if !ours {
            // A write already settled this slot and woke the waiters; the
            // cache value is authoritative now.
            return slot.record.data.clone().map_or(result, Ok);
        }

        let inflight = slot.inflight.take();
        let outcome = if slot.generation == generation {
            match result {
                Ok(value) => {
                    slot.record.data = Some(value.clone());
                    slot.record.error = None;
                    slot.record.status = FetchStatus::Success;
                    slot.record.fetched_at = Some(Instant::now());
                    Ok(value)
                }
                Err(error) => {
                    // Keep last-known-good data; the record is stale now.
                    slot.record.status = FetchStatus::Error;
                    slot.record.error = Some(error.clone());
                    slot.record.fetched_at = None;
                    Err(error)
                }
            }
        } else {
            tracing::debug!(?key, "background read superseded; result dropped");
            slot.settle_without_result();
            slot.record.data.clone().map_or(result, Ok)
        };
        drop(slots);

        if let Some(inflight) = inflight {
            let _ = inflight.done.send(());
        }
        outcome
    }

    /// Force-set a record to an authoritative value (optimistic prediction
    /// or a mutation's server response). Supersedes any in-flight load.
    pub fn write(&self, key: CacheKey, value: CacheValue) {
        let inflight = {
            let mut slots = self.inner.slots.lock();
            let slot = slots
                .entry(key)
                .or_insert_with(|| Slot::new(DEFAULT_STALE_AFTER));
            slot.record.data = Some(value);
            slot.record.error = None;
            slot.record.status = FetchStatus::Success;
            slot.record.fetched_at = Some(Instant::now());
            slot.generation += 1;
            slot.inflight.take()
        };
        if let Some(inflight) = inflight {
            let _ = inflight.done.send(());
        }
    }

    /// Mark every record of `kind` stale, forcing the next fetch to reload.
    /// Data stays visible in the meantime.
    pub fn invalidate(&self, kind: EntityKind) {
        let cancelled: Vec<Inflight> = {
            let mut slots = self.inner.slots.lock();
            let mut cancelled = Vec::new();
            for (key, slot) in slots.iter_mut() {
                if key.kind() == kind {
                    slot.record.fetched_at = None;
                    slot.generation += 1;
                    if let Some(inflight) = slot.inflight.take() {
                        slot.settle_without_result();
                        cancelled.push(inflight);
                    }
                }
            }
            cancelled
        };
        for inflight in cancelled {
            let _ = inflight.done.send(());
        }
    }

    /// Drop a record entirely (e.g. the cart cache once an order consumed
    /// the server-side cart).
    pub fn remove(&self, key: &CacheKey) {
        let inflight = {
            let mut slots = self.inner.slots.lock();
            slots.remove(key).and_then(|slot| slot.inflight)
        };
        if let Some(inflight) = inflight {
            let _ = inflight.done.send(());
        }
    }

    /// Cancel any in-flight load for `key` so its late resolution cannot
    /// overwrite a value written afterwards. First step of every optimistic
    /// mutation.
    pub fn supersede(&self, key: &CacheKey) {
        let inflight = {
            let mut slots = self.inner.slots.lock();
            slots.get_mut(key).and_then(|slot| {
                slot.generation += 1;
                let inflight = slot.inflight.take();
                if inflight.is_some() {
                    slot.settle_without_result();
                }
                inflight
            })
        };
        if let Some(inflight) = inflight {
            let _ = inflight.done.send(());
        }
    }
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::new()
    }
}

fn is_transient(error: &ApiError) -> bool {
    error.status == 0 || error.status >= 500
}

async fn run_with_retries<F, Fut>(loader: &F) -> Result<CacheValue, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<CacheValue, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match loader().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < READ_RETRY_LIMIT && is_transient(&error) => {
                attempt += 1;
                tracing::debug!(%error, attempt, "transient read failure, retrying");
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clementine_core::{CategoryDto, CategoryId};
    use std::sync::atomic::AtomicUsize;

    fn categories(name: &str) -> CacheValue {
        CacheValue::Categories(vec![CategoryDto {
            id: CategoryId::new("cat-1"),
            name: name.to_string(),
            slug: name.to_lowercase(),
        }])
    }

    fn first_name(value: &CacheValue) -> String {
        match value {
            CacheValue::Categories(list) => {
                list.first().map(|c| c.name.clone()).unwrap_or_default()
            }
            _ => String::new(),
        }
    }

    fn not_found() -> ApiError {
        ApiError {
            message: "not found".to_string(),
            status: 404,
            code: None,
        }
    }

    #[tokio::test]
    async fn test_fresh_record_short_circuits_the_loader() {
        let cache = EntityCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let value = cache
                .fetch(CacheKey::Categories, Duration::from_secs(300), move || {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(categories("Kitchen"))
                    }
                })
                .await
                .expect("fetch");
            assert_eq!(first_name(&value), "Kitchen");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_a_single_loader_call() {
        let cache = EntityCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let loader = |calls: Arc<AtomicUsize>| {
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(categories("Kitchen"))
                }
            }
        };

        let (a, b) = tokio::join!(
            cache.fetch(
                CacheKey::Categories,
                Duration::from_secs(300),
                loader(Arc::clone(&calls))
            ),
            cache.fetch(
                CacheKey::Categories,
                Duration::from_secs(300),
                loader(Arc::clone(&calls))
            ),
        );

        assert_eq!(first_name(&a.expect("a")), "Kitchen");
        assert_eq!(first_name(&b.expect("b")), "Kitchen");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_retains_last_known_data() {
        let cache = EntityCache::new();
        cache.write(CacheKey::Categories, categories("Kitchen"));
        cache.invalidate(EntityKind::Categories);

        let result = cache
            .fetch(CacheKey::Categories, Duration::from_secs(300), || async {
                Err(not_found())
            })
            .await;
        assert_eq!(result.expect_err("load fails").status, 404);

        let record = cache.read(&CacheKey::Categories).expect("record");
        assert_eq!(record.status, FetchStatus::Error);
        assert_eq!(
            record.data.as_ref().map(first_name).as_deref(),
            Some("Kitchen")
        );
    }

    #[tokio::test]
    async fn test_joined_caller_receives_the_shared_error() {
        let cache = EntityCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let loader = |calls: Arc<AtomicUsize>| {
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Err(not_found())
                }
            }
        };

        let (a, b) = tokio::join!(
            cache.fetch(
                CacheKey::Categories,
                Duration::from_secs(300),
                loader(Arc::clone(&calls))
            ),
            cache.fetch(
                CacheKey::Categories,
                Duration::from_secs(300),
                loader(Arc::clone(&calls))
            ),
        );

        assert_eq!(a.expect_err("a").status, 404);
        assert_eq!(b.expect_err("b").status, 404);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_a_reload() {
        let cache = EntityCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let loader = |calls: Arc<AtomicUsize>, name: &'static str| {
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(categories(name))
                }
            }
        };

        let _ = cache
            .fetch(
                CacheKey::Categories,
                Duration::from_secs(300),
                loader(Arc::clone(&calls), "Kitchen"),
            )
            .await;
        cache.invalidate(EntityKind::Categories);
        let value = cache
            .fetch(
                CacheKey::Categories,
                Duration::from_secs(300),
                loader(Arc::clone(&calls), "Garden"),
            )
            .await
            .expect("reload");

        assert_eq!(first_name(&value), "Garden");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_superseded_slow_read_does_not_overwrite_a_write() {
        let cache = EntityCache::new();

        let slow = tokio::spawn({
            let cache = cache.clone();
            async move {
                cache
                    .fetch(CacheKey::Categories, Duration::from_secs(300), || async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(categories("StaleRead"))
                    })
                    .await
            }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        cache.write(CacheKey::Categories, categories("Authoritative"));
        let slow_result = slow.await.expect("join").expect("fetch");

        // The late read neither overwrote the cache nor leaked its value.
        assert_eq!(first_name(&slow_result), "Authoritative");
        let record = cache.read(&CacheKey::Categories).expect("record");
        assert_eq!(
            record.data.as_ref().map(first_name).as_deref(),
            Some("Authoritative")
        );
    }

    #[tokio::test]
    async fn test_transient_failures_retry_up_to_the_limit() {
        let cache = EntityCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let value = cache
            .fetch(CacheKey::Categories, Duration::from_secs(300), {
                let calls = Arc::clone(&calls);
                move || {
                    let calls = Arc::clone(&calls);
                    async move {
                        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                            Err(ApiError {
                                message: "bad gateway".to_string(),
                                status: 502,
                                code: None,
                            })
                        } else {
                            Ok(categories("Kitchen"))
                        }
                    }
                }
            })
            .await
            .expect("eventually succeeds");

        assert_eq!(first_name(&value), "Kitchen");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_transient_failures_do_not_retry() {
        let cache = EntityCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let result = cache
            .fetch(CacheKey::Categories, Duration::from_secs(300), {
                let calls = Arc::clone(&calls);
                move || {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err(not_found())
                    }
                }
            })
            .await;

        assert_eq!(result.expect_err("fails").status, 404);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remove_drops_the_record() {
        let cache = EntityCache::new();
        cache.write(CacheKey::Categories, categories("Kitchen"));
        cache.remove(&CacheKey::Categories);
        assert!(cache.read(&CacheKey::Categories).is_none());
    }
}
