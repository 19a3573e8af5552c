// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Zone addressing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Index of an irrigation/lighting zone on the controller.
///
/// Zones are numbered from 1. The same index keys readings, history series
/// and cached zone state.
///
/// # Examples
///
/// ```
/// use farmlink::types::ZoneIndex;
///
/// let zone = ZoneIndex::new(2).unwrap();
/// assert_eq!(zone.value(), 2);
/// assert_eq!(zone.label(), "Z2");
///
/// assert!(ZoneIndex::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ZoneIndex(u32);

impl ZoneIndex {
    /// Creates a zone index.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidZoneIndex` for zero.
    pub fn new(index: u32) -> Result<Self, ValueError> {
        if index == 0 {
            return Err(ValueError::InvalidZoneIndex(index));
        }
        Ok(Self(index))
    }

    /// Returns the numeric index.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the series label used in persisted history (`Z<k>`).
    #[must_use]
    pub fn label(self) -> String {
        format!("Z{}", self.0)
    }

    /// Parses a series label produced by [`label`](Self::label).
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        label
            .strip_prefix('Z')
            .and_then(|n| n.parse().ok())
            .and_then(|n| Self::new(n).ok())
    }
}

impl fmt::Display for ZoneIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for ZoneIndex {
    type Error = ValueError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ZoneIndex> for u32 {
    fn from(zone: ZoneIndex) -> Self {
        zone.0
    }
}

impl FromStr for ZoneIndex {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n = s
            .trim()
            .parse::<u32>()
            .map_err(|_| ValueError::InvalidZoneIndex(0))?;
        Self::new(n)
    }
}
