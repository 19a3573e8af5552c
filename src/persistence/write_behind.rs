// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deferred writes to a slower store.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StoreError;

use super::{KeyValueStore, SharedStore};

/// A pending change: `Some` to set, `None` to remove.
type Change = Option<String>;

#[derive(Debug, Default)]
struct Queue {
    pending: BTreeMap<String, Change>,
    in_flight: BTreeMap<String, Change>,
    flushing: bool,
}

impl Queue {
    fn lookup(&self, key: &str) -> Option<&Change> {
        self.pending.get(key).or_else(|| self.in_flight.get(key))
    }
}

struct Shared {
    inner: SharedStore,
    queue: Mutex<Queue>,
    write: Mutex<()>,
}

impl Shared {
    /// Writes one batch. Returns `false` when nothing was pending.
    fn write_batch(&self) -> bool {
        let _write = self.write.lock();
        let batch = {
            let mut queue = self.queue.lock();
            if queue.pending.is_empty() {
                return false;
            }
            let batch = std::mem::take(&mut queue.pending);
            queue.in_flight.clone_from(&batch);
            batch
        };

        for (key, change) in &batch {
            let result = match change {
                Some(value) => self.inner.set(key, value),
                None => self.inner.remove(key),
            };
            if let Err(e) = result {
                tracing::warn!(key = %key, error = %e, "Deferred store write failed");
            }
        }
        tracing::trace!(keys = batch.len(), "Store batch written");

        self.queue.lock().in_flight.clear();
        true
    }

    fn drain(&self) {
        loop {
            if !self.write_batch() {
                let mut queue = self.queue.lock();
                if queue.pending.is_empty() {
                    queue.flushing = false;
                    return;
                }
            }
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        while self.write_batch() {}
    }
}

/// Wraps a store so `set` and `remove` return without touching the backend.
///
/// Changes are queued per key, so only the latest value of a key written in
/// quick succession reaches the backend. Inside a Tokio runtime the queue is
/// written on the blocking thread pool; elsewhere it is written before `set`
/// returns. Reads see queued changes. Backend failures are logged, not
/// returned.
#[derive(Clone)]
pub struct WriteBehindStore {
    shared: Arc<Shared>,
}

impl WriteBehindStore {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: SharedStore) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner,
                queue: Mutex::new(Queue::default()),
                write: Mutex::new(()),
            }),
        }
    }

    /// Writes every queued change, blocking until the backend has them.
    pub fn flush(&self) {
        while self.shared.write_batch() {}
    }

    /// Returns the number of keys waiting to be written.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().pending.len()
    }

    fn enqueue(&self, key: &str, change: Change) {
        let start = {
            let mut queue = self.shared.queue.lock();
            queue.pending.insert(key.to_string(), change);
            !std::mem::replace(&mut queue.flushing, true)
        };
        if !start {
            return;
        }

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let shared = Arc::clone(&self.shared);
            drop(handle.spawn_blocking(move || shared.drain()));
        } else {
            self.shared.drain();
        }
    }
}

impl KeyValueStore for WriteBehindStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if let Some(change) = self.shared.queue.lock().lookup(key) {
            return Ok(change.clone());
        }
        self.shared.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.enqueue(key, Some(value.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.enqueue(key, None);
        Ok(())
    }
}

impl std::fmt::Debug for WriteBehindStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteBehindStore")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}
