//! Connection Registry
//!
//! Process-wide bookkeeping for live stream connections, keyed by canonical
//! endpoint. The registry enforces at-most-one-live-connection-per-key:
//! registering under an occupied key synchronously tears the prior
//! connection down before `register` returns.
//!
//! # Design
//!
//! The registry is an explicit, constructible object: the composition root
//! owns one instance per process and injects it into the connection factory.
//! Each entry carries a generation number; the cleanup handle returned by
//! [`ConnectionRegistry::register`] only removes the entry whose generation
//! it captured, so a stale handle held across a fast resubscribe can never
//! delete the newer connection's entry.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::domain::endpoint::EndpointKey;

/// Teardown callback closing one transport connection.
type Teardown = Box<dyn FnOnce() + Send>;

/// A teardown that can be fired at most once, from any path.
///
/// Both the eviction path inside [`ConnectionRegistry::register`] and the
/// caller-held [`CleanupHandle`] share one cell; whichever fires first wins
/// and later calls are no-ops.
#[derive(Default)]
struct TeardownCell(Mutex<Option<Teardown>>);

impl TeardownCell {
    fn new(teardown: Teardown) -> Arc<Self> {
        Arc::new(Self(Mutex::new(Some(teardown))))
    }

    /// Returns whether this call performed the teardown.
    fn fire(&self) -> bool {
        let teardown = self.0.lock().take();
        match teardown {
            Some(teardown) => {
                teardown();
                true
            }
            None => false,
        }
    }
}

struct Entry {
    generation: u64,
    teardown: Arc<TeardownCell>,
}

type EntryMap = Arc<Mutex<HashMap<EndpointKey, Entry>>>;

/// Table of live connections, at most one per canonical endpoint key.
///
/// # Example
///
/// ```rust
/// use stream_core::ConnectionRegistry;
///
/// let registry = ConnectionRegistry::new();
///
/// let first = registry.register("https://api.example.com/v1/stream?symbol=EURUSD", || {});
/// // Same path, different query: same channel, the first teardown fires here.
/// let second = registry.register("https://api.example.com/v1/stream?symbol=GBPUSD", || {});
/// assert_eq!(registry.connection_count(), 1);
///
/// // The stale handle is a silent no-op and leaves the newer entry alone.
/// first.cancel();
/// assert_eq!(registry.connection_count(), 1);
///
/// second.cancel();
/// assert_eq!(registry.connection_count(), 0);
/// ```
pub struct ConnectionRegistry {
    entries: EntryMap,
    next_generation: AtomicU64,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Register the live connection for `url`, replacing any prior entry
    /// under the same canonical key.
    ///
    /// If an entry already exists, its teardown fires exactly once before
    /// this call returns; callers must not assume both connections are
    /// momentarily live. The returned handle fires `teardown` and removes
    /// the entry, guarded against stale-handle races.
    pub fn register(&self, url: &str, teardown: impl FnOnce() + Send + 'static) -> CleanupHandle {
        let key = EndpointKey::from_url(url);
        let cell = TeardownCell::new(Box::new(teardown));
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let evicted = {
            let mut entries = self.entries.lock();
            entries.insert(
                key.clone(),
                Entry {
                    generation,
                    teardown: Arc::clone(&cell),
                },
            )
        };

        // Fired outside the lock: a teardown is caller code and may touch
        // the registry itself (e.g. cancel another handle).
        if let Some(old) = evicted {
            tracing::debug!(key = %key, "evicting prior connection for endpoint");
            old.teardown.fire();
        }

        CleanupHandle {
            key,
            generation,
            teardown: cell,
            entries: Arc::clone(&self.entries),
        }
    }

    /// Number of live entries.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.entries.lock().len()
    }

    /// Drop all bookkeeping without firing any teardown.
    ///
    /// Lifecycle utility (logout, test isolation); production teardown
    /// always routes through the cleanup handles.
    pub fn reset(&self) {
        self.entries.lock().clear();
    }
}

/// Idempotent handle that terminates one registered connection.
///
/// Cancelling fires the caller's teardown (at most once across all paths)
/// and removes the registry entry only if the entry stored under the key is
/// still the one this handle registered.
#[derive(Clone)]
pub struct CleanupHandle {
    key: EndpointKey,
    generation: u64,
    teardown: Arc<TeardownCell>,
    entries: EntryMap,
}

impl CleanupHandle {
    /// Tear the connection down and remove its registry entry.
    ///
    /// Safe to call any number of times, and safe to call after the entry
    /// was superseded by a newer registration: a stale handle is a silent
    /// no-op on the registry.
    ///
    /// Returns whether this call performed the teardown; repeat calls and
    /// handles whose teardown already fired during eviction return `false`.
    pub fn cancel(&self) -> bool {
        let fired = self.teardown.fire();

        let mut entries = self.entries.lock();
        if entries
            .get(&self.key)
            .is_some_and(|entry| entry.generation == self.generation)
        {
            entries.remove(&self.key);
        }
        fired
    }

    /// Canonical key of the channel this handle belongs to.
    #[must_use]
    pub const fn key(&self) -> &EndpointKey {
        &self.key
    }
}

impl std::fmt::Debug for CleanupHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupHandle")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
