// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of the broker session.
///
/// ```text
/// Disconnected ──connect──▶ Connecting ──connected──▶ Online
///       ▲                        │                      │
///       └──────── closed ────────┴──── reconnecting ───▶ Reconnecting
/// ```
///
/// Any status moves to `Error` when the transport reports an error, and to
/// `Disconnected` on `disconnect` or when the connection closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No session, or the session's connection is closed.
    #[default]
    Disconnected,
    /// A session was opened and is waiting for the broker.
    Connecting,
    /// The broker accepted the session.
    Online,
    /// The transport is retrying a lost connection.
    Reconnecting,
    /// The transport reported an error.
    Error,
}

impl ConnectionStatus {
    /// Returns the lowercase status name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Online => "online",
            Self::Reconnecting => "reconnecting",
            Self::Error => "error",
        }
    }

    /// Returns `true` if commands can be published.
    #[must_use]
    pub const fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
