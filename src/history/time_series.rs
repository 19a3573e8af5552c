// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Time-series storage and snapshot persistence.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::persistence::SharedStore;
use crate::types::ZoneIndex;

use super::{HISTORY_CAPACITY, history_key};

/// A single soil value at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// When the value was received.
    pub timestamp: DateTime<Utc>,
    /// Soil sensor value.
    pub value: u32,
}

/// Persisted form: zone label to points.
type Snapshot = BTreeMap<String, Vec<TimeSeriesPoint>>;

#[derive(Debug, Default)]
struct DeviceHistory {
    labels: VecDeque<DateTime<Utc>>,
    series: BTreeMap<ZoneIndex, VecDeque<TimeSeriesPoint>>,
}

impl DeviceHistory {
    fn snapshot(&self) -> BTreeMap<String, &VecDeque<TimeSeriesPoint>> {
        self.series
            .iter()
            .map(|(zone, points)| (zone.label(), points))
            .collect()
    }

    fn view(&self) -> HistoryView {
        HistoryView {
            labels: self.labels.iter().copied().collect(),
            series: self
                .series
                .iter()
                .map(|(zone, points)| (*zone, points.iter().map(|p| p.value).collect()))
                .collect(),
        }
    }
}

/// Chart-facing view of a device's history.
///
/// `labels` is the shared time axis; each zone contributes a value sequence.
/// After [`TimeSeriesStore::load_history`] the axis is the timestamps of the
/// longest stored series, so other zones' values are shown against that
/// baseline rather than their own timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryView {
    labels: Vec<DateTime<Utc>>,
    series: BTreeMap<ZoneIndex, Vec<u32>>,
}

impl HistoryView {
    /// Returns the shared time axis.
    #[must_use]
    pub fn labels(&self) -> &[DateTime<Utc>] {
        &self.labels
    }

    /// Returns the values of `zone`; empty for a zone with no history.
    #[must_use]
    pub fn values(&self, zone: ZoneIndex) -> &[u32] {
        self.series.get(&zone).map_or(&[][..], Vec::as_slice)
    }

    /// Returns the zones that have a series, in index order.
    pub fn zones(&self) -> impl Iterator<Item = ZoneIndex> + '_ {
        self.series.keys().copied()
    }

    /// Returns `true` if there are neither labels nor values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.series.values().all(Vec::is_empty)
    }
}

/// Bounded per-zone soil history for every device seen by the client.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chrono::Utc;
/// use farmlink::history::TimeSeriesStore;
/// use farmlink::persistence::MemoryStore;
/// use farmlink::types::ZoneIndex;
///
/// let store = Arc::new(MemoryStore::new());
/// let mut history = TimeSeriesStore::new(store.clone());
/// let zone = ZoneIndex::new(1).unwrap();
///
/// history.append_point("greenhouse", zone, 1830, Utc::now());
///
/// let mut reloaded = TimeSeriesStore::new(store);
/// let view = reloaded.load_history("greenhouse");
/// assert_eq!(view.values(zone), &[1830]);
/// ```
pub struct TimeSeriesStore {
    store: SharedStore,
    capacity: usize,
    devices: HashMap<String, DeviceHistory>,
}

impl TimeSeriesStore {
    /// Creates a store persisting to `store` with the default capacity.
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self::with_capacity(store, HISTORY_CAPACITY)
    }

    /// Creates a store keeping at most `capacity` entries per sequence.
    #[must_use]
    pub fn with_capacity(store: SharedStore, capacity: usize) -> Self {
        Self {
            store,
            capacity,
            devices: HashMap::new(),
        }
    }

    /// Returns the per-sequence cap.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a soil value for `zone` and persists the device snapshot.
    ///
    /// A device not yet held in memory is first read back from the store, so
    /// the snapshot written here extends the stored history. Persistence
    /// failures are logged and otherwise ignored; the in-memory history is
    /// always updated.
    pub fn append_point(
        &mut self,
        device_id: &str,
        zone: ZoneIndex,
        value: u32,
        timestamp: DateTime<Utc>,
    ) {
        if !self.devices.contains_key(device_id) {
            let stored = self.read_history(device_id);
            self.devices.insert(device_id.to_string(), stored);
        }
        let capacity = self.capacity;
        let history = self.devices.entry(device_id.to_string()).or_default();

        history.labels.push_back(timestamp);
        trim_front(&mut history.labels, capacity);

        let series = history.series.entry(zone).or_default();
        series.push_back(TimeSeriesPoint { timestamp, value });
        trim_front(series, capacity);

        self.persist(device_id);
    }

    /// Replaces the in-memory history of `device_id` with its stored snapshot.
    ///
    /// The zone with the most points becomes the label baseline (lowest index
    /// wins a tie). A missing or unreadable snapshot yields an empty history.
    pub fn load_history(&mut self, device_id: &str) -> HistoryView {
        let history = self.read_history(device_id);
        let view = history.view();
        self.devices.insert(device_id.to_string(), history);
        view
    }

    /// Drops the in-memory history of every device except `device_id`.
    ///
    /// Stored snapshots are kept and are read back on the next append or load
    /// of the device.
    pub fn keep_only(&mut self, device_id: &str) {
        let before = self.devices.len();
        self.devices.retain(|device, _| device == device_id);
        tracing::trace!(
            device = %device_id,
            evicted = before - self.devices.len(),
            "Pruned in-memory history"
        );
    }

    /// Returns the devices currently held in memory.
    pub fn devices(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    fn read_history(&self, device_id: &str) -> DeviceHistory {
        let snapshot = self.read_snapshot(device_id).unwrap_or_default();
        let capacity = self.capacity;

        let mut history = DeviceHistory::default();
        for (label, points) in snapshot {
            let Some(zone) = ZoneIndex::from_label(&label) else {
                tracing::trace!(
                    device = %device_id,
                    label = %label,
                    "Ignoring unknown history series"
                );
                continue;
            };
            let mut series: VecDeque<TimeSeriesPoint> = points.into();
            trim_front(&mut series, capacity);
            history.series.insert(zone, series);
        }

        let mut baseline: Option<&VecDeque<TimeSeriesPoint>> = None;
        for series in history.series.values() {
            if baseline.is_none_or(|best| series.len() > best.len()) {
                baseline = Some(series);
            }
        }
        history.labels = baseline
            .map(|series| series.iter().map(|p| p.timestamp).collect())
            .unwrap_or_default();

        tracing::debug!(
            device = %device_id,
            zones = history.series.len(),
            labels = history.labels.len(),
            "Loaded history"
        );
        history
    }

    /// Returns the current view of `device_id`'s history.
    #[must_use]
    pub fn view(&self, device_id: &str) -> HistoryView {
        self.devices
            .get(device_id)
            .map(DeviceHistory::view)
            .unwrap_or_default()
    }

    /// Returns the stored points of one zone, oldest first.
    #[must_use]
    pub fn points(&self, device_id: &str, zone: ZoneIndex) -> Vec<TimeSeriesPoint> {
        self.devices
            .get(device_id)
            .and_then(|history| history.series.get(&zone))
            .map(|series| series.iter().copied().collect())
            .unwrap_or_default()
    }

    fn read_snapshot(&self, device_id: &str) -> Option<Snapshot> {
        let key = history_key(device_id);
        let raw = match self.store.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(device = %device_id, error = %e, "Failed to read history");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(device = %device_id, error = %e, "Discarding unreadable history");
                None
            }
        }
    }

    fn persist(&self, device_id: &str) {
        let Some(history) = self.devices.get(device_id) else {
            return;
        };
        let result = serde_json::to_string(&history.snapshot())
            .map_err(StoreError::from)
            .and_then(|json| self.store.set(&history_key(device_id), &json));

        if let Err(e) = result {
            tracing::warn!(device = %device_id, error = %e, "Failed to persist history");
        }
    }
}

impl std::fmt::Debug for TimeSeriesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeSeriesStore")
            .field("capacity", &self.capacity)
            .field("devices", &self.devices.len())
            .finish_non_exhaustive()
    }
}

fn trim_front<T>(sequence: &mut VecDeque<T>, capacity: usize) {
    while sequence.len() > capacity {
        sequence.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::persistence::{KeyValueStore, MemoryStore};

    fn zone(n: u32) -> ZoneIndex {
        ZoneIndex::new(n).unwrap()
    }

    fn t(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    #[test]
    fn append_keeps_most_recent_points() {
        let mut history = TimeSeriesStore::new(Arc::new(MemoryStore::new()));
        for i in 0..1005 {
            history.append_point("dev", zone(1), i, t(i64::from(i)));
        }

        let points = history.points("dev", zone(1));
        assert_eq!(points.len(), 1000);
        assert_eq!(points.first().unwrap().value, 5);
        assert_eq!(points.last().unwrap().value, 1004);
        assert!(points.windows(2).all(|w| w[0].value + 1 == w[1].value));

        let view = history.view("dev");
        assert_eq!(view.labels().len(), 1000);
        assert_eq!(view.labels()[0], t(5));
    }

    #[test]
    fn labels_and_series_trim_independently() {
        let mut history = TimeSeriesStore::with_capacity(Arc::new(MemoryStore::new()), 3);
        history.append_point("dev", zone(1), 1, t(1));
        history.append_point("dev", zone(2), 2, t(2));
        history.append_point("dev", zone(1), 3, t(3));
        history.append_point("dev", zone(2), 4, t(4));

        let view = history.view("dev");
        assert_eq!(view.labels(), &[t(2), t(3), t(4)]);
        assert_eq!(view.values(zone(1)), &[1, 3]);
        assert_eq!(view.values(zone(2)), &[2, 4]);
    }

    #[test]
    fn every_append_persists_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let mut history = TimeSeriesStore::new(store.clone());
        history.append_point("dev", zone(2), 1950, t(0));

        let raw = store.get("history:dev").unwrap().unwrap();
        let snapshot: Snapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            snapshot.get("Z2").unwrap(),
            &vec![TimeSeriesPoint {
                timestamp: t(0),
                value: 1950
            }]
        );
    }

    #[test]
    fn persistence_failure_keeps_memory_state() {
        let mut history = TimeSeriesStore::new(Arc::new(MemoryStore::with_quota(0)));
        history.append_point("dev", zone(1), 7, t(0));
        assert_eq!(history.view("dev").values(zone(1)), &[7]);
    }

    #[test]
    fn load_without_snapshot_is_empty() {
        let mut history = TimeSeriesStore::new(Arc::new(MemoryStore::new()));
        let view = history.load_history("unknown");

        assert!(view.is_empty());
        assert!(view.labels().is_empty());
        assert!(view.values(zone(1)).is_empty());
        assert_eq!(view.zones().count(), 0);
    }

    #[test]
    fn load_uses_longest_series_as_baseline() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut history = TimeSeriesStore::new(store.clone());
            history.append_point("dev", zone(1), 10, t(0));
            history.append_point("dev", zone(2), 20, t(1));
            history.append_point("dev", zone(2), 21, t(2));
            history.append_point("dev", zone(1), 11, t(3));
            history.append_point("dev", zone(2), 22, t(4));
        }

        let mut reloaded = TimeSeriesStore::new(store);
        let view = reloaded.load_history("dev");

        assert_eq!(view.labels(), &[t(1), t(2), t(4)]);
        assert_eq!(view.values(zone(1)), &[10, 11]);
        assert_eq!(view.values(zone(2)), &[20, 21, 22]);
    }

    #[test]
    fn load_breaks_ties_with_lowest_zone() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                "history:dev",
                &serde_json::json!({
                    "Z3": [{"timestamp": t(9), "value": 3}],
                    "Z1": [{"timestamp": t(1), "value": 1}],
                })
                .to_string(),
            )
            .unwrap();

        let view = TimeSeriesStore::new(store).load_history("dev");
        assert_eq!(view.labels(), &[t(1)]);
    }

    #[test]
    fn load_skips_unknown_labels_and_bad_json() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                "history:a",
                &serde_json::json!({
                    "pump": [{"timestamp": t(0), "value": 1}],
                    "Z1": [{"timestamp": t(0), "value": 5}],
                })
                .to_string(),
            )
            .unwrap();
        store.set("history:b", "{broken").unwrap();

        let mut history = TimeSeriesStore::new(store);
        let a = history.load_history("a");
        assert_eq!(a.zones().collect::<Vec<_>>(), vec![zone(1)]);

        assert!(history.load_history("b").is_empty());
    }

    #[test]
    fn loaded_history_continues_appending() {
        let store = Arc::new(MemoryStore::new());
        TimeSeriesStore::new(store.clone()).append_point("dev", zone(1), 1, t(0));

        let mut history = TimeSeriesStore::new(store.clone());
        history.load_history("dev");
        history.append_point("dev", zone(1), 2, t(1));

        let view = TimeSeriesStore::new(store).load_history("dev");
        assert_eq!(view.values(zone(1)), &[1, 2]);
    }

    #[test]
    fn first_append_extends_stored_history() {
        let store = Arc::new(MemoryStore::new());
        let mut before = TimeSeriesStore::new(store.clone());
        before.append_point("d", zone(1), 100, t(0));
        before.append_point("d", zone(1), 200, t(1));
        before.append_point("d", zone(1), 300, t(2));

        let mut after = TimeSeriesStore::new(store.clone());
        after.append_point("d", zone(1), 400, t(3));

        assert_eq!(after.view("d").values(zone(1)), &[100, 200, 300, 400]);
        assert_eq!(after.view("d").labels().len(), 4);
        let reloaded = TimeSeriesStore::new(store).load_history("d");
        assert_eq!(reloaded.values(zone(1)), &[100, 200, 300, 400]);
    }

    #[test]
    fn pruned_device_is_read_back_on_append() {
        let store = Arc::new(MemoryStore::new());
        let mut history = TimeSeriesStore::new(store);
        history.append_point("a", zone(1), 1, t(0));
        history.append_point("b", zone(1), 9, t(1));

        history.keep_only("b");
        assert_eq!(history.devices().collect::<Vec<_>>(), vec!["b"]);
        assert!(history.view("a").is_empty());

        history.append_point("a", zone(1), 2, t(2));
        assert_eq!(history.view("a").values(zone(1)), &[1, 2]);
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn unreadable_store_loads_empty() {
        let mut history = TimeSeriesStore::new(Arc::new(FailingStore));
        assert!(history.load_history("dev").is_empty());

        history.append_point("dev", zone(1), 3, t(0));
        assert_eq!(history.view("dev").values(zone(1)), &[3]);
    }
}
