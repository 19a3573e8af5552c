// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validated threshold changes.

use std::time::Duration;

use crate::error::ValueError;
use crate::types::ZoneIndex;

use super::FarmCommand;

/// A pair of soil thresholds to apply to one zone.
///
/// Construction enforces `min < max`, so the resulting SET commands can be
/// published without further checks.
///
/// # Examples
///
/// ```
/// use farmlink::command::{Command, ThresholdUpdate};
/// use farmlink::types::ZoneIndex;
///
/// let zone = ZoneIndex::new(1).unwrap();
/// let update = ThresholdUpdate::new(zone, 1200, 2000).unwrap();
/// let texts: Vec<String> = update.commands().iter().map(Command::to_text).collect();
/// assert_eq!(texts, ["SET MIN1 1200", "SET MAX1 2000"]);
///
/// assert!(ThresholdUpdate::new(zone, 2000, 2000).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdUpdate {
    zone: ZoneIndex,
    min: u32,
    max: u32,
}

impl ThresholdUpdate {
    /// Delay between the SET commands and the follow-up SHOW request.
    pub const CONFIRM_DELAY: Duration = Duration::from_millis(150);

    /// Creates a threshold update.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidThresholds` unless `min < max`.
    pub fn new(zone: ZoneIndex, min: u32, max: u32) -> Result<Self, ValueError> {
        if min >= max {
            return Err(ValueError::InvalidThresholds { min, max });
        }
        Ok(Self { zone, min, max })
    }

    /// Returns the target zone.
    #[must_use]
    pub fn zone(&self) -> ZoneIndex {
        self.zone
    }

    /// Returns the lower threshold.
    #[must_use]
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Returns the upper threshold.
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Returns the SET commands in publish order.
    #[must_use]
    pub fn commands(&self) -> [FarmCommand; 2] {
        [
            FarmCommand::SetMin {
                zone: self.zone,
                value: self.min,
            },
            FarmCommand::SetMax {
                zone: self.zone,
                value: self.max,
            },
        ]
    }
}
