//! Time-boxed in-memory cache of resolution outcomes.
//!
//! One entry per canonical ticker. Entries expire lazily on read; an optional
//! background sweep drops expired entries for long-running processes.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::resolution::Resolution;
use crate::UtcDateTime;

/// Default lifetime of a cached outcome.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Cached resolution outcome (quote or failure).
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub outcome: Resolution,
    pub stored_at: UtcDateTime,
    ttl: Duration,
}

impl CacheEntry {
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_live(&self, now: UtcDateTime) -> bool {
        let Ok(ttl) = time::Duration::try_from(self.ttl) else {
            return true;
        };
        now.into_inner() < self.stored_at.into_inner().saturating_add(ttl)
    }
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
    default_ttl: Duration,
}

impl CacheInner {
    fn new(default_ttl: Duration) -> Self {
        Self {
            map: HashMap::new(),
            default_ttl,
        }
    }

    fn get(&self, key: &str, now: UtcDateTime) -> Option<CacheEntry> {
        self.map
            .get(key)
            .filter(|entry| entry.is_live(now))
            .cloned()
    }

    fn put(&mut self, entry: CacheEntry) {
        self.map.insert(entry.key.clone(), entry);
    }

    fn clear_expired(&mut self, now: UtcDateTime) -> usize {
        let before = self.map.len();
        self.map.retain(|_, entry| entry.is_live(now));
        before - self.map.len()
    }
}

/// Thread-safe cache shared by every resolution in the process.
///
/// Cloning yields another handle to the same entries. Reads and writes hold a
/// short-lived lock and never suspend; concurrent writers for one key are
/// resolved last-writer-wins.
#[derive(Clone)]
pub struct QuoteCache {
    inner: Arc<RwLock<CacheInner>>,
    clock: Arc<dyn Clock>,
}

impl Debug for QuoteCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteCache")
            .field("ttl", &self.ttl())
            .field("len", &self.len())
            .finish()
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}

impl QuoteCache {
    /// Create a cache with the given TTL using the system clock.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner::new(default_ttl))),
            clock,
        }
    }

    /// Create a cache with the default TTL of 5 minutes.
    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TTL)
    }

    /// Create a cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns the live entry for `key`, or `None` when missing or expired.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        self.read().get(key, now)
    }

    /// Stores `outcome` under `key` with the default TTL.
    pub fn set(&self, key: impl Into<String>, outcome: Resolution) {
        self.set_with_ttl(key, outcome, None);
    }

    /// Stores `outcome` under `key`, overwriting any previous entry.
    ///
    /// `ttl_override` replaces the default TTL for this entry only. No-op when
    /// the cache is disabled.
    pub fn set_with_ttl(
        &self,
        key: impl Into<String>,
        outcome: Resolution,
        ttl_override: Option<Duration>,
    ) {
        let stored_at = self.clock.now();
        let mut store = self.write();

        if store.default_ttl == Duration::ZERO {
            return;
        }

        let ttl = ttl_override.unwrap_or(store.default_ttl);
        store.put(CacheEntry {
            key: key.into(),
            outcome,
            stored_at,
            ttl,
        });
    }

    /// Remove expired entries, returning how many were dropped.
    pub fn clear_expired(&self) -> usize {
        let now = self.clock.now();
        self.write().clear_expired(now)
    }

    pub fn clear(&self) {
        self.write().map.clear();
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.read().default_ttl
    }

    pub fn is_disabled(&self) -> bool {
        self.ttl() == Duration::ZERO
    }

    /// Spawn a background task that calls [`clear_expired`](Self::clear_expired)
    /// every `every`. Must be called from within a tokio runtime; abort the
    /// returned handle to stop it.
    pub fn spawn_sweeper(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache = self.clone();
        let every = every.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = cache.clear_expired();
                if removed > 0 {
                    tracing::debug!(removed, "swept expired quote cache entries");
                }
            }
        })
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CacheInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CacheInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
