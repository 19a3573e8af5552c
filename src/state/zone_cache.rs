// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Latest per-zone thresholds and mode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::telemetry::ZoneReading;
use crate::types::{ZoneIndex, ZoneMode};

/// Cached non-time-series state of one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneState {
    /// Lower soil threshold.
    pub min_threshold: u32,
    /// Upper soil threshold.
    pub max_threshold: u32,
    /// Current mode.
    pub mode: ZoneMode,
}

/// Latest known state of every zone seen during a session.
///
/// Slots are created on the first reading for a zone and overwritten in
/// place afterwards. They are only dropped by [`clear`](Self::clear), which
/// the connection manager calls when a new session replaces the old one.
///
/// # Examples
///
/// ```
/// use farmlink::state::{ZoneState, ZoneStateCache};
/// use farmlink::types::{ZoneIndex, ZoneMode};
///
/// let mut cache = ZoneStateCache::new();
/// let zone = ZoneIndex::new(1).unwrap();
/// let state = ZoneState { min_threshold: 1200, max_threshold: 2000, mode: ZoneMode::Auto };
///
/// assert!(cache.update(zone, state));
/// assert!(!cache.update(zone, state));
/// assert_eq!(cache.get(zone), Some(&state));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneStateCache {
    zones: BTreeMap<ZoneIndex, ZoneState>,
}

impl ZoneStateCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the latest state of `zone`.
    ///
    /// Returns `true` if the slot was created or its content changed.
    pub fn update(&mut self, zone: ZoneIndex, state: ZoneState) -> bool {
        match self.zones.get_mut(&zone) {
            Some(slot) if *slot == state => false,
            Some(slot) => {
                *slot = state;
                true
            }
            None => {
                self.zones.insert(zone, state);
                true
            }
        }
    }

    /// Merges a decoded reading into the cache.
    pub fn apply_reading(&mut self, reading: &ZoneReading) -> bool {
        self.update(reading.zone(), reading.zone_state())
    }

    /// Returns the cached state of `zone`.
    #[must_use]
    pub fn get(&self, zone: ZoneIndex) -> Option<&ZoneState> {
        self.zones.get(&zone)
    }

    /// Iterates over all zones in index order.
    pub fn iter(&self) -> impl Iterator<Item = (ZoneIndex, &ZoneState)> {
        self.zones.iter().map(|(zone, state)| (*zone, state))
    }

    /// Returns the number of known zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns `true` if no zone has reported yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Forgets every zone.
    pub fn clear(&mut self) {
        self.zones.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::decode;
    use chrono::Utc;

    fn zone(n: u32) -> ZoneIndex {
        ZoneIndex::new(n).unwrap()
    }

    fn state(min: u32, max: u32, mode: ZoneMode) -> ZoneState {
        ZoneState {
            min_threshold: min,
            max_threshold: max,
            mode,
        }
    }

    #[test]
    fn first_update_creates_slot() {
        let mut cache = ZoneStateCache::new();
        assert!(cache.is_empty());

        assert!(cache.update(zone(2), state(1, 2, ZoneMode::On)));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(zone(2)), Some(&state(1, 2, ZoneMode::On)));
    }

    #[test]
    fn later_update_overwrites_in_place() {
        let mut cache = ZoneStateCache::new();
        cache.update(zone(1), state(1200, 2000, ZoneMode::Auto));

        assert!(cache.update(zone(1), state(1100, 2100, ZoneMode::Off)));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(zone(1)), Some(&state(1100, 2100, ZoneMode::Off)));
    }

    #[test]
    fn identical_update_reports_no_change() {
        let mut cache = ZoneStateCache::new();
        cache.update(zone(1), state(1, 2, ZoneMode::Auto));
        assert!(!cache.update(zone(1), state(1, 2, ZoneMode::Auto)));
    }

    #[test]
    fn apply_reading_uses_reading_zone() {
        let mut cache = ZoneStateCache::new();
        for reading in decode("S1=5(M1..X9) Z1=ON | S3=6(M2..X8) Z3=OFF", Utc::now()) {
            cache.apply_reading(&reading);
        }

        let zones: Vec<u32> = cache.iter().map(|(z, _)| z.value()).collect();
        assert_eq!(zones, vec![1, 3]);
        assert_eq!(cache.get(zone(3)), Some(&state(2, 8, ZoneMode::Off)));
        assert_eq!(cache.get(zone(2)), None);
    }
}
