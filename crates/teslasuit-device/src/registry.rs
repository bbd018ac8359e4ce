//! Subscriber registry with safe unsubscription during fan-out.
//!
//! Each subscriber key owns at most one live callback. Unsubscribing or
//! re-subscribing tombstones the old entry instead of removing it, so a
//! fan-out pass working from a snapshot can tell that an entry died while
//! the pass was running. Tombstones are compacted after each pass.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Opaque key identifying one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

// Keys from `unique()` start high so they never collide with small
// caller-chosen keys.
static NEXT_UNIQUE: AtomicU64 = AtomicU64::new(1 << 48);

impl SubscriberId {
    /// A caller-chosen key.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// A fresh process-unique key.
    pub fn unique() -> Self {
        Self(NEXT_UNIQUE.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw key value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

struct Entry<F: ?Sized> {
    key: SubscriberId,
    generation: u64,
    callback: Option<Arc<F>>,
}

struct Inner<F: ?Sized> {
    entries: Vec<Entry<F>>,
    next_generation: u64,
    tombstones: usize,
}

impl<F: ?Sized> Inner<F> {
    fn tombstone(&mut self, key: SubscriberId) -> bool {
        let live = self
            .entries
            .iter_mut()
            .find(|entry| entry.key == key && entry.callback.is_some());
        match live {
            Some(entry) => {
                entry.callback = None;
                self.tombstones += 1;
                true
            }
            None => false,
        }
    }

    fn is_live(&self, key: SubscriberId, generation: u64) -> bool {
        self.entries
            .iter()
            .any(|e| e.key == key && e.generation == generation && e.callback.is_some())
    }
}

/// Callbacks keyed by [`SubscriberId`].
pub struct CallbackRegistry<F: ?Sized> {
    inner: Mutex<Inner<F>>,
}

impl<F: ?Sized> Default for CallbackRegistry<F> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: Vec::new(),
                next_generation: 0,
                tombstones: 0,
            }),
        }
    }
}

impl<F: ?Sized> CallbackRegistry<F> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `key`, replacing any callback the key held.
    pub fn subscribe(&self, key: SubscriberId, callback: Arc<F>) {
        let mut inner = self.inner.lock();
        inner.tombstone(key);
        let generation = inner.next_generation;
        inner.next_generation += 1;
        inner.entries.push(Entry {
            key,
            generation,
            callback: Some(callback),
        });
    }

    /// Remove the callback held by `key`. Returns whether one was held.
    pub fn unsubscribe(&self, key: SubscriberId) -> bool {
        self.inner.lock().tombstone(key)
    }

    /// Whether `key` currently holds a callback.
    pub fn contains(&self, key: SubscriberId) -> bool {
        self.inner
            .lock()
            .entries
            .iter()
            .any(|e| e.key == key && e.callback.is_some())
    }

    /// Number of live callbacks.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock();
        inner.entries.len() - inner.tombstones
    }

    /// Whether no callbacks are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of dead entries awaiting compaction.
    pub fn tombstone_count(&self) -> usize {
        self.inner.lock().tombstones
    }

    /// Call `invoke` with every live callback.
    ///
    /// Works from a snapshot taken under the lock and re-checks each entry
    /// just before calling it, so callbacks may subscribe or unsubscribe
    /// (themselves or others) freely. Entries added during the pass are not
    /// called until the next pass. Returns the number of callbacks invoked.
    pub fn for_each(&self, mut invoke: impl FnMut(&F)) -> usize {
        let snapshot: Vec<(SubscriberId, u64, Arc<F>)> = {
            let inner = self.inner.lock();
            inner
                .entries
                .iter()
                .filter_map(|e| {
                    e.callback
                        .as_ref()
                        .map(|cb| (e.key, e.generation, Arc::clone(cb)))
                })
                .collect()
        };

        let mut invoked = 0;
        for (key, generation, callback) in snapshot {
            if self.inner.lock().is_live(key, generation) {
                invoke(&callback);
                invoked += 1;
            }
        }
        self.compact();
        invoked
    }

    /// Drop tombstoned entries.
    pub fn compact(&self) {
        let mut inner = self.inner.lock();
        if inner.tombstones > 0 {
            inner.entries.retain(|e| e.callback.is_some());
            inner.tombstones = 0;
        }
    }
}

impl<F: ?Sized> std::fmt::Debug for CallbackRegistry<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("live", &self.len())
            .field("tombstones", &self.tombstone_count())
            .finish()
    }
}
