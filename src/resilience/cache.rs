//! Single-slot result cache with a freshness window.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// The last successful payload and when it was captured.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub payload: T,
    pub captured_at: Instant,
}

impl<T> CacheEntry<T> {
    /// Fresh while `now - captured_at <= ttl`.
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.captured_at) <= ttl
    }
}

/// Holds at most one payload. Expired entries are kept but never served.
#[derive(Debug)]
pub struct ResultCache<T> {
    slot: Mutex<Option<CacheEntry<T>>>,
}

impl<T: Clone> ResultCache<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Replace the stored entry.
    pub fn put(&self, payload: T, now: Instant) {
        *self.slot.lock() = Some(CacheEntry {
            payload,
            captured_at: now,
        });
    }

    /// Return the payload if one is stored and still within `ttl`.
    pub fn get(&self, now: Instant, ttl: Duration) -> Option<T> {
        self.slot
            .lock()
            .as_ref()
            .filter(|entry| entry.is_fresh(now, ttl))
            .map(|entry| entry.payload.clone())
    }

    /// Capture time of the stored entry, fresh or not.
    pub fn captured_at(&self) -> Option<Instant> {
        self.slot.lock().as_ref().map(|entry| entry.captured_at)
    }
}

impl<T: Clone> Default for ResultCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
