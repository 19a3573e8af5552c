// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Operating modes for zones and device-level actuators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Operating mode of a zone.
///
/// # Examples
///
/// ```
/// use farmlink::types::ZoneMode;
///
/// let mode: ZoneMode = "auto".parse().unwrap();
/// assert_eq!(mode, ZoneMode::Auto);
/// assert_eq!(ZoneMode::Off.as_str(), "OFF");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ZoneMode {
    /// The controller decides from soil thresholds.
    Auto,
    /// Forced on.
    On,
    /// Forced off.
    Off,
}

impl ZoneMode {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for ZoneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AUTO" => Ok(Self::Auto),
            "ON" => Ok(Self::On),
            "OFF" => Ok(Self::Off),
            _ => Err(ValueError::InvalidZoneMode(s.to_string())),
        }
    }
}

/// Mode accepted by the grow light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightMode {
    /// Forced on.
    On,
    /// Schedule-driven.
    Auto,
}

impl LightMode {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Auto => "AUTO",
        }
    }
}

impl fmt::Display for LightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
