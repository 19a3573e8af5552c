// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Zone state tracking.
//!
//! [`ZoneStateCache`] keeps the latest thresholds and mode of every zone, fed
//! from decoded status readings. Soil values are time-series data and live in
//! [`history`](crate::history) instead.

mod zone_cache;

pub use zone_cache::{ZoneState, ZoneStateCache};
