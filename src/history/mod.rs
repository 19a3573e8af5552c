// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounded soil history per device and zone.
//!
//! Every decoded reading appends one point to its zone's series and one
//! timestamp to the device's shared label axis. Both are capped at
//! [`HISTORY_CAPACITY`] entries and trimmed oldest first. After each append the
//! whole device snapshot is written to the key-value store under
//! `history:<device id>` as
//!
//! ```text
//! {"Z1": [{"timestamp": "...", "value": 1830}, ...], "Z2": [...]}
//! ```

mod time_series;

pub use time_series::{HistoryView, TimeSeriesPoint, TimeSeriesStore};

/// Maximum number of entries kept per sequence.
pub const HISTORY_CAPACITY: usize = 1000;

/// Prefix of the key-value store key holding a device snapshot.
pub const HISTORY_KEY_PREFIX: &str = "history:";

/// Returns the store key for `device_id`'s snapshot.
#[must_use]
pub fn history_key(device_id: &str) -> String {
    format!("{HISTORY_KEY_PREFIX}{device_id}")
}
