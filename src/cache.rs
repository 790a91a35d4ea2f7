//! Time-boxed, invalidation-aware caching of remote data.
//!
//! [`ExpiringCache`] memoizes a single value produced by a fallible async
//! loader. Values expire after a validity window, can be invalidated by
//! hand, and caches can be chained so that invalidating one also
//! invalidates its dependents (a playlist's metadata cache invalidates its
//! track-list cache, because the track list changed whenever the metadata's
//! snapshot token did).

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::{sync::Mutex, time::Instant};

use crate::requests::RequestError;

/// Default validity window of a freshly loaded value.
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(600);

/// Loader callback captured at cache construction. Loaders are assumed to
/// be expensive (they usually hit the network), so reloads are kept to the
/// minimum the validity rules allow.
pub type CacheLoader<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, RequestError>> + Send + Sync>;

/// Invalidation surface of a cache, object-safe so that caches over
/// different value types can depend on each other.
#[async_trait]
pub trait CacheInvalidation: Send + Sync {
    async fn invalidate(&self);
    async fn validate_for_at_least(&self, duration: Duration);
}

struct Slot<T> {
    value: Option<T>,
    valid_until: Option<Instant>,
}

impl<T> Slot<T> {
    fn clear(&mut self) {
        self.value = None;
        self.valid_until = None;
    }
}

/// Lazily evaluated remote data that expires over time.
///
/// All operations on one instance are serialized through an internal lock,
/// so a reload is never raced by a second reload of the same entry. Reads
/// of unrelated caches never contend.
pub struct ExpiringCache<T> {
    slot: Mutex<Slot<T>>,
    loader: CacheLoader<T>,
    validity: Duration,
    stale_when: Option<Box<dyn Fn(&T) -> bool + Send + Sync>>,
    dependents: std::sync::Mutex<Vec<Arc<dyn CacheInvalidation>>>,
}

impl<T: Clone + Send + 'static> ExpiringCache<T> {
    /// Create a cache with the default validity window.
    pub fn new(loader: CacheLoader<T>) -> Self {
        Self::with_validity(loader, DEFAULT_VALIDITY)
    }

    pub fn with_validity(loader: CacheLoader<T>, validity: Duration) -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                valid_until: None,
            }),
            loader,
            validity,
            stale_when: None,
            dependents: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Treat a cached value matching the predicate as always stale. Used for
    /// listings where an empty result is more likely a remote hiccup than a
    /// true answer and should be re-asked on the next access.
    pub fn stale_when(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.stale_when = Some(Box::new(predicate));
        self
    }

    /// Register a cache whose contents are derived from (or coupled to)
    /// this one. Invalidation and validity extensions cascade to it.
    pub fn add_dependent(&self, dependent: Arc<dyn CacheInvalidation>) {
        self.dependents
            .lock()
            .expect("cache dependents lock poisoned")
            .push(dependent);
    }

    /// Get the cached value, reloading it first when it is missing, expired,
    /// matched by the stale predicate, or when `force_reload` is set.
    ///
    /// The reload happens synchronously on the calling task while the entry
    /// lock is held; concurrent readers of the same entry wait for it and
    /// then observe the fresh value without loading again.
    pub async fn get_data(&self, force_reload: bool) -> Result<T, RequestError> {
        let mut slot = self.slot.lock().await;

        if !force_reload {
            if let Some(value) = self.usable_value(&slot) {
                return Ok(value);
            }
        }

        slot.clear();
        let value = (self.loader)().await?;
        slot.value = Some(value.clone());
        slot.valid_until = Some(Instant::now() + self.validity);
        Ok(value)
    }

    /// Store a value directly, validating it for the configured window.
    pub async fn set_data(&self, value: T) {
        let mut slot = self.slot.lock().await;
        slot.value = Some(value);
        slot.valid_until = Some(Instant::now() + self.validity);
    }

    /// Drop the current value, forcing a reload on the next access, and
    /// cascade to all dependent caches.
    pub async fn invalidate(&self) {
        {
            let mut slot = self.slot.lock().await;
            slot.clear();
        }
        for dependent in self.dependents_snapshot() {
            dependent.invalidate().await;
        }
    }

    /// Extend the validity of the current value to at least `duration` from
    /// now. A value already valid for longer is left untouched. The same
    /// extension cascades to all dependent caches.
    pub async fn validate_for_at_least(&self, duration: Duration) {
        {
            let mut slot = self.slot.lock().await;
            let until = Instant::now() + duration;
            if slot.valid_until.is_none_or(|current| current < until) {
                slot.valid_until = Some(until);
            }
        }
        for dependent in self.dependents_snapshot() {
            dependent.validate_for_at_least(duration).await;
        }
    }

    fn usable_value(&self, slot: &Slot<T>) -> Option<T> {
        let (Some(value), Some(valid_until)) = (&slot.value, slot.valid_until) else {
            return None;
        };
        if Instant::now() > valid_until {
            return None;
        }
        if let Some(predicate) = &self.stale_when {
            if predicate(value) {
                return None;
            }
        }
        Some(value.clone())
    }

    fn dependents_snapshot(&self) -> Vec<Arc<dyn CacheInvalidation>> {
        // cascade outside the slot lock so a dependent chain cannot deadlock
        self.dependents
            .lock()
            .expect("cache dependents lock poisoned")
            .clone()
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> CacheInvalidation for ExpiringCache<T> {
    async fn invalidate(&self) {
        ExpiringCache::invalidate(self).await;
    }

    async fn validate_for_at_least(&self, duration: Duration) {
        ExpiringCache::validate_for_at_least(self, duration).await;
    }
}
