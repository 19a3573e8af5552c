// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller command definitions.
//!
//! Commands are plain-text payloads published to `farm/<device>/cmd`.
//!
//! # Available Commands
//!
//! | Command | Text |
//! |---------|------|
//! | [`FarmCommand::Show`] | `SHOW` |
//! | [`FarmCommand::Light`] | `LIGHT ON`, `LIGHT AUTO` |
//! | [`FarmCommand::PumpAuto`] | `PUMP AUTO` |
//! | [`FarmCommand::ZoneMode`] | `Z<k> AUTO\|ON\|OFF` |
//! | [`FarmCommand::SetMin`] | `SET MIN<k> <n>` |
//! | [`FarmCommand::SetMax`] | `SET MAX<k> <n>` |
//!
//! # Examples
//!
//! ```
//! use farmlink::command::{Command, FarmCommand};
//! use farmlink::types::{ZoneIndex, ZoneMode};
//!
//! let zone = ZoneIndex::new(1).unwrap();
//! let cmd = FarmCommand::ZoneMode { zone, mode: ZoneMode::Off };
//! assert_eq!(cmd.to_text(), "Z1 OFF");
//!
//! let set = FarmCommand::SetMin { zone, value: 1200 };
//! assert_eq!(set.name(), "SET");
//! assert_eq!(set.to_text(), "SET MIN1 1200");
//! ```

mod threshold;

pub use threshold::ThresholdUpdate;

use crate::types::{LightMode, ZoneIndex, ZoneMode};

/// A command that can be sent to the controller.
pub trait Command {
    /// Returns the command word, including any zone suffix.
    ///
    /// For example `"SHOW"`, `"LIGHT"`, `"Z2"`, `"SET"`.
    fn name(&self) -> String;

    /// Returns the argument text, if any.
    fn payload(&self) -> Option<String>;

    /// Returns the full text published on the command topic.
    ///
    /// Format: `<name> <payload>` or just `<name>` if no payload.
    fn to_text(&self) -> String {
        match self.payload() {
            Some(p) => format!("{} {}", self.name(), p),
            None => self.name(),
        }
    }
}

/// The controller's command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FarmCommand {
    /// Ask the controller to publish its status line.
    Show,
    /// Set the grow light mode.
    Light(LightMode),
    /// Hand the pump back to automatic control.
    PumpAuto,
    /// Set a zone's mode.
    ZoneMode {
        /// Target zone.
        zone: ZoneIndex,
        /// New mode.
        mode: ZoneMode,
    },
    /// Set a zone's lower soil threshold.
    SetMin {
        /// Target zone.
        zone: ZoneIndex,
        /// Threshold value.
        value: u32,
    },
    /// Set a zone's upper soil threshold.
    SetMax {
        /// Target zone.
        zone: ZoneIndex,
        /// Threshold value.
        value: u32,
    },
}

impl Command for FarmCommand {
    fn name(&self) -> String {
        match self {
            Self::Show => "SHOW".to_string(),
            Self::Light(_) => "LIGHT".to_string(),
            Self::PumpAuto => "PUMP".to_string(),
            Self::ZoneMode { zone, .. } => format!("Z{zone}"),
            Self::SetMin { .. } | Self::SetMax { .. } => "SET".to_string(),
        }
    }

    fn payload(&self) -> Option<String> {
        match self {
            Self::Show => None,
            Self::Light(mode) => Some(mode.as_str().to_string()),
            Self::PumpAuto => Some("AUTO".to_string()),
            Self::ZoneMode { mode, .. } => Some(mode.as_str().to_string()),
            Self::SetMin { zone, value } => Some(format!("MIN{zone} {value}")),
            Self::SetMax { zone, value } => Some(format!("MAX{zone} {value}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(n: u32) -> ZoneIndex {
        ZoneIndex::new(n).unwrap()
    }

    #[test]
    fn show_has_no_payload() {
        assert_eq!(FarmCommand::Show.payload(), None);
        assert_eq!(FarmCommand::Show.to_text(), "SHOW");
    }

    #[test]
    fn light_commands() {
        assert_eq!(FarmCommand::Light(LightMode::On).to_text(), "LIGHT ON");
        assert_eq!(FarmCommand::Light(LightMode::Auto).to_text(), "LIGHT AUTO");
    }

    #[test]
    fn pump_auto() {
        assert_eq!(FarmCommand::PumpAuto.to_text(), "PUMP AUTO");
    }

    #[test]
    fn zone_mode_uses_zone_word() {
        let cmd = FarmCommand::ZoneMode {
            zone: zone(3),
            mode: ZoneMode::Auto,
        };
        assert_eq!(cmd.name(), "Z3");
        assert_eq!(cmd.to_text(), "Z3 AUTO");
    }

    #[test]
    fn threshold_commands() {
        assert_eq!(
            FarmCommand::SetMin {
                zone: zone(2),
                value: 1100
            }
            .to_text(),
            "SET MIN2 1100"
        );
        assert_eq!(
            FarmCommand::SetMax {
                zone: zone(2),
                value: 2100
            }
            .to_text(),
            "SET MAX2 2100"
        );
    }
}
