// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key-value persistence used for broker settings and zone history.
//!
//! The library treats storage as an opaque string store. Applications pick a
//! backend: [`MemoryStore`] for tests and ephemeral sessions, [`FileStore`] for
//! a JSON document on disk, or their own [`KeyValueStore`] implementation.
//! The connection manager wraps whichever it is given in a
//! [`WriteBehindStore`] so backend writes stay off the event path.

mod file_store;
mod memory_store;
mod write_behind;

use std::sync::Arc;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use write_behind::WriteBehindStore;

use crate::error::StoreError;

/// A string key-value store.
///
/// Implementations use interior mutability so a single store can be shared
/// between the history and the settings layer.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write is refused or fails.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key` if present.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Shared handle to a key-value store.
pub type SharedStore = Arc<dyn KeyValueStore>;
