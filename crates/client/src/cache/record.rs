//! Per-record cache state.

use std::time::{Duration, Instant};

use crate::cache::CacheValue;
use crate::error::ApiError;

/// Load state of a cache record.
///
/// `data` is retained across `Loading` and `Error`: readers keep seeing the
/// last-known-good value while a refresh runs or after it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Never loaded.
    Idle,
    /// A load is in flight; any previous `data` is still visible.
    Loading,
    /// `data` holds the most recent server value.
    Success,
    /// The last load failed; `error` is set, previous `data` is retained.
    Error,
}

/// One cached entity record.
#[derive(Debug, Clone)]
pub struct CacheRecord {
    pub data: Option<CacheValue>,
    pub error: Option<ApiError>,
    pub status: FetchStatus,
    pub fetched_at: Option<Instant>,
    pub stale_after: Duration,
}

impl CacheRecord {
    #[must_use]
    pub const fn empty(stale_after: Duration) -> Self {
        Self {
            data: None,
            error: None,
            status: FetchStatus::Idle,
            fetched_at: None,
            stale_after,
        }
    }

    /// Fresh records are served without hitting the loader; stale records
    /// are still served while a background refetch runs.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.fetched_at
            .is_some_and(|fetched_at| fetched_at.elapsed() < self.stale_after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_is_not_fresh() {
        let record = CacheRecord::empty(Duration::from_secs(30));
        assert_eq!(record.status, FetchStatus::Idle);
        assert!(!record.is_fresh());
    }

    #[test]
    fn test_freshness_follows_the_stale_window() {
        let mut record = CacheRecord::empty(Duration::from_secs(30));
        record.fetched_at = Some(Instant::now());
        assert!(record.is_fresh());

        record.stale_after = Duration::ZERO;
        assert!(!record.is_fresh());
    }
}
