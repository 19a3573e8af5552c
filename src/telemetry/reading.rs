// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-zone readings extracted from a status line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::ZoneState;
use crate::types::{ZoneIndex, ZoneMode};

/// One zone's state as reported in a status payload.
///
/// Readings are only produced by the decoder and are immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneReading {
    zone: ZoneIndex,
    soil: u32,
    min_threshold: u32,
    max_threshold: u32,
    mode: ZoneMode,
    timestamp: DateTime<Utc>,
}

impl ZoneReading {
    pub(crate) fn new(
        zone: ZoneIndex,
        soil: u32,
        min_threshold: u32,
        max_threshold: u32,
        mode: ZoneMode,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            zone,
            soil,
            min_threshold,
            max_threshold,
            mode,
            timestamp,
        }
    }

    /// Returns the zone the reading belongs to.
    #[must_use]
    pub fn zone(&self) -> ZoneIndex {
        self.zone
    }

    /// Returns the raw soil sensor value.
    #[must_use]
    pub fn soil(&self) -> u32 {
        self.soil
    }

    /// Returns the lower soil threshold.
    #[must_use]
    pub fn min_threshold(&self) -> u32 {
        self.min_threshold
    }

    /// Returns the upper soil threshold.
    #[must_use]
    pub fn max_threshold(&self) -> u32 {
        self.max_threshold
    }

    /// Returns the zone mode.
    #[must_use]
    pub fn mode(&self) -> ZoneMode {
        self.mode
    }

    /// Returns when the status line was received.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the cached (non-time-series) part of the reading.
    #[must_use]
    pub fn zone_state(&self) -> ZoneState {
        ZoneState {
            min_threshold: self.min_threshold,
            max_threshold: self.max_threshold,
            mode: self.mode,
        }
    }
}
