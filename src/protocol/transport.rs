// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The seam between the connection state machine and a broker client.
//!
//! A [`Transport`] opens sessions. Each session pushes its lifecycle and
//! inbound messages as [`SessionEvent`]s tagged with the [`SessionId`] it was
//! opened with, so events from a torn-down session can be recognised and
//! dropped by the receiver.

use std::fmt;
use std::time::Duration;

use crate::error::ProtocolError;

use super::BrokerEndpoint;

/// Identifies one broker session.
///
/// Ids are handed out in increasing order by the connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates a session id.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the id following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything a transport needs to open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Tag for every event of this session.
    pub id: SessionId,
    /// Broker address.
    pub endpoint: BrokerEndpoint,
    /// MQTT client identifier.
    pub client_id: String,
    /// Start without broker-side session state.
    pub clean_session: bool,
    /// MQTT keep-alive interval.
    pub keep_alive: Duration,
    /// Delay before the transport retries a lost connection.
    pub reconnect_period: Duration,
}

/// Something that happened on a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The broker accepted the connection.
    Connected,
    /// The transport is retrying after a lost connection.
    Reconnecting,
    /// The connection closed.
    Closed,
    /// The transport reported an error.
    Error(String),
    /// A message arrived on a subscribed topic.
    Message {
        /// Topic the message was published on.
        topic: String,
        /// Raw payload.
        payload: Vec<u8>,
    },
}

/// A [`TransportEvent`] tagged with its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    /// Session that produced the event.
    pub session: SessionId,
    /// The event itself.
    pub event: TransportEvent,
}

impl SessionEvent {
    /// Tags `event` with `session`.
    #[must_use]
    pub fn new(session: SessionId, event: TransportEvent) -> Self {
        Self { session, event }
    }
}

/// Opens broker sessions.
///
/// Implementations deliver [`SessionEvent`]s out of band, typically through a
/// channel handed to them at construction time.
pub trait Transport: Send + 'static {
    /// Handle to an open session.
    type Session: TransportSession;

    /// Opens a session and starts connecting in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be started at all, for example
    /// when the address is malformed. Connection failures after this point
    /// are reported as events.
    fn open(&mut self, request: &SessionRequest) -> Result<Self::Session, ProtocolError>;
}

/// Handle to one open session.
pub trait TransportSession: Send + 'static {
    /// Subscribes to `topic` at QoS 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be queued.
    fn subscribe(&mut self, topic: &str) -> Result<(), ProtocolError>;

    /// Publishes `payload` to `topic` at QoS 0 without the retain flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be queued.
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), ProtocolError>;

    /// Closes the session and stops its background work.
    ///
    /// Events queued before the call may still be delivered.
    fn end(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_increase() {
        let first = SessionId::new(1);
        assert!(first.next() > first);
        assert_eq!(first.next().value(), 2);
    }

    #[test]
    fn session_id_display() {
        assert_eq!(SessionId::new(7).to_string(), "#7");
    }
}
