// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Notification payloads, one type per category.

use std::fmt;

use crate::error::ValueError;
use crate::protocol::{ConnectionStatus, TopicPair};
use crate::telemetry::ZoneReading;

/// The connection status changed.
///
/// Every call to `disconnect` produces exactly one `Disconnected` event, even
/// when the status already was `Disconnected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChanged {
    /// The new status.
    pub status: ConnectionStatus,
    /// Transport error text for `ConnectionStatus::Error`.
    pub error: Option<String>,
}

impl StatusChanged {
    /// Creates a status event without error text.
    #[must_use]
    pub fn new(status: ConnectionStatus) -> Self {
        Self {
            status,
            error: None,
        }
    }

    /// Creates an `Error` status event.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ConnectionStatus::Error,
            error: Some(message.into()),
        }
    }
}

/// A new session derived its command and status topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicsChanged {
    /// The topics of the new session.
    pub topics: TopicPair,
}

/// A zone reading was decoded from a status payload.
///
/// This is the feed for chart widgets: each event carries one point of the
/// zone's soil series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingReceived {
    /// Device the reading came from.
    pub device_id: String,
    /// The decoded reading.
    pub reading: ZoneReading,
}

/// A raw payload arrived from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReceived {
    /// Topic the payload was published on.
    pub topic: String,
    /// Payload decoded as UTF-8 (lossy).
    pub text: String,
}

/// Something the operator should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A command was dropped because no session is online.
    NotConnected {
        /// The dropped command text.
        command: String,
    },
    /// The transport refused a command.
    PublishFailed {
        /// The dropped command text.
        command: String,
        /// Transport error text.
        reason: String,
    },
    /// A threshold change was rejected before anything was sent.
    InvalidThresholds(ValueError),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected { command } => {
                write!(f, "no broker connection, '{command}' was not sent")
            }
            Self::PublishFailed { command, reason } => {
                write!(f, "could not send '{command}': {reason}")
            }
            Self::InvalidThresholds(err) => write!(f, "{err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_carries_message() {
        let event = StatusChanged::error("tls handshake failed");
        assert_eq!(event.status, ConnectionStatus::Error);
        assert_eq!(event.error.as_deref(), Some("tls handshake failed"));
    }

    #[test]
    fn notice_display() {
        let notice = Notice::NotConnected {
            command: "SHOW".to_string(),
        };
        assert_eq!(notice.to_string(), "no broker connection, 'SHOW' was not sent");

        let notice = Notice::InvalidThresholds(ValueError::InvalidThresholds { min: 5, max: 1 });
        assert_eq!(
            notice.to_string(),
            "minimum threshold 5 must be lower than maximum threshold 1"
        );
    }
}
