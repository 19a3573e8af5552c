// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The connection state machine.
//!
//! [`ConnectionManager`] owns at most one broker session at a time and reacts
//! to the session's [`SessionEvent`]s. It is synchronous: the async
//! [`FarmLink`](super::FarmLink) facade feeds it events one at a time.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::command::{Command, FarmCommand};
use crate::error::Result;
use crate::event::{
    MessageReceived, Notice, Notifier, ReadingReceived, StatusChanged, TopicsChanged,
};
use crate::history::{HistoryView, TimeSeriesStore};
use crate::persistence::{SharedStore, WriteBehindStore};
use crate::protocol::{
    ConnectionStatus, SessionEvent, SessionId, SessionRequest, TopicPair, Transport,
    TransportEvent, TransportSession,
};
use crate::state::ZoneStateCache;
use crate::telemetry;

use super::{BrokerSettings, ConnectConfig};

/// Delay before the transport retries a lost connection.
pub const RECONNECT_PERIOD: Duration = Duration::from_millis(2000);

/// MQTT keep-alive interval.
pub const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Outcome of a publish request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The command was handed to the transport.
    Sent,
    /// Nothing was sent; a [`Notice`] explains why.
    Dropped,
}

impl Delivery {
    /// Returns `true` if the command was handed to the transport.
    #[must_use]
    pub const fn is_sent(self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// The live session.
struct Session<S> {
    id: SessionId,
    device_id: String,
    client_id: String,
    topics: TopicPair,
    handle: S,
}

/// Owns the broker session and the state derived from its traffic.
pub struct ConnectionManager<T: Transport> {
    transport: T,
    session: Option<Session<T::Session>>,
    last_session: SessionId,
    status: ConnectionStatus,
    notifier: Notifier,
    store: WriteBehindStore,
    history: TimeSeriesStore,
    zones: ZoneStateCache,
}

impl<T: Transport> ConnectionManager<T> {
    /// Creates a manager with no session.
    ///
    /// Writes to `store` are deferred through a [`WriteBehindStore`]; call
    /// [`flush`](Self::flush) to wait for them.
    #[must_use]
    pub fn new(transport: T, store: SharedStore, notifier: Notifier) -> Self {
        let store = WriteBehindStore::new(store);
        Self {
            transport,
            session: None,
            last_session: SessionId::new(0),
            status: ConnectionStatus::Disconnected,
            notifier,
            history: TimeSeriesStore::new(Arc::new(store.clone())),
            store,
            zones: ZoneStateCache::new(),
        }
    }

    /// Tears down any existing session and opens a new one.
    ///
    /// On success the status is `Connecting`; the session goes `Online` once
    /// the transport reports the broker accepted it. The settings are saved
    /// before the session is opened.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`](crate::error::ValueError) for an invalid
    /// configuration (nothing changes), or a
    /// [`ProtocolError`](crate::error::ProtocolError) if the transport cannot
    /// start the session (the status becomes `Error`).
    pub fn connect(&mut self, config: &ConnectConfig) -> Result<SessionId> {
        config.validate()?;

        if let Some(mut previous) = self.session.take() {
            tracing::info!(
                session = %previous.id,
                device = %previous.device_id,
                "Ending previous session"
            );
            previous.handle.end();
        }
        self.zones.clear();
        self.history.keep_only(config.device_id());

        let topics = TopicPair::for_device(config.device_id());
        self.notifier.topics(TopicsChanged {
            topics: topics.clone(),
        });

        let settings = config.settings();
        if let Err(e) = settings.save(&self.store) {
            tracing::warn!(error = %e, "Failed to save broker settings");
        }

        self.last_session = self.last_session.next();
        let request = SessionRequest {
            id: self.last_session,
            endpoint: config.endpoint(),
            client_id: config.resolve_client_id(),
            clean_session: true,
            keep_alive: KEEP_ALIVE,
            reconnect_period: RECONNECT_PERIOD,
        };

        let handle = match self.transport.open(&request) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(
                    device = %config.device_id(),
                    url = %request.endpoint,
                    error = %e,
                    "Failed to open session"
                );
                self.status = ConnectionStatus::Error;
                self.notifier.status(StatusChanged::error(e.to_string()));
                return Err(e.into());
            }
        };

        tracing::info!(
            session = %request.id,
            device = %config.device_id(),
            url = %request.endpoint,
            client_id = %request.client_id,
            "Connecting"
        );

        self.session = Some(Session {
            id: request.id,
            device_id: config.device_id().to_string(),
            client_id: request.client_id,
            topics,
            handle,
        });
        self.set_status(ConnectionStatus::Connecting);

        Ok(request.id)
    }

    /// Ends the session, if any, and reports `Disconnected`.
    ///
    /// Calling this without a session is not an error.
    pub fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.handle.end();
            tracing::info!(
                session = %session.id,
                device = %session.device_id,
                "Disconnected"
            );
        }
        self.set_status(ConnectionStatus::Disconnected);
    }

    /// Publishes `text` on the command topic.
    ///
    /// Returns [`Delivery::Dropped`] and emits a [`Notice`] when the session
    /// is not online or the transport refuses the request.
    pub fn publish_cmd(&mut self, text: &str) -> Delivery {
        let session = match self.session.as_mut() {
            Some(session) if self.status.is_online() => session,
            _ => {
                self.notifier.notice(Notice::NotConnected {
                    command: text.to_string(),
                });
                return Delivery::Dropped;
            }
        };

        match session.handle.publish(session.topics.cmd(), text) {
            Ok(()) => {
                tracing::debug!(topic = %session.topics.cmd(), command = %text, "Command sent");
                Delivery::Sent
            }
            Err(e) => {
                self.notifier.notice(Notice::PublishFailed {
                    command: text.to_string(),
                    reason: e.to_string(),
                });
                Delivery::Dropped
            }
        }
    }

    /// Publishes a typed command.
    pub fn send(&mut self, command: &impl Command) -> Delivery {
        self.publish_cmd(&command.to_text())
    }

    /// Applies one transport event.
    ///
    /// Events from any session other than the current one are ignored.
    pub fn handle_event(&mut self, event: SessionEvent) {
        if self.session.as_ref().map(|s| s.id) != Some(event.session) {
            tracing::trace!(
                session = %event.session,
                event = ?event.event,
                "Ignoring stale session event"
            );
            return;
        }

        match event.event {
            TransportEvent::Connected => self.on_connected(),
            TransportEvent::Reconnecting => self.set_status(ConnectionStatus::Reconnecting),
            TransportEvent::Closed => self.set_status(ConnectionStatus::Disconnected),
            TransportEvent::Error(message) => {
                tracing::error!(session = %event.session, error = %message, "Transport error");
                self.status = ConnectionStatus::Error;
                self.notifier.status(StatusChanged::error(message));
            }
            TransportEvent::Message { topic, payload } => self.on_message(topic, &payload),
        }
    }

    fn on_connected(&mut self) {
        self.set_status(ConnectionStatus::Online);

        if let Some(session) = self.session.as_mut()
            && let Err(e) = session.handle.subscribe(session.topics.status())
        {
            tracing::warn!(topic = %session.topics.status(), error = %e, "Subscribe failed");
        }

        self.send(&FarmCommand::Show);
    }

    fn on_message(&mut self, topic: String, payload: &[u8]) {
        let Some(device_id) = self.session.as_ref().map(|s| s.device_id.clone()) else {
            return;
        };
        let text = String::from_utf8_lossy(payload).into_owned();
        tracing::debug!(topic = %topic, text = %text, "Status message");

        let readings = telemetry::decode(&text, Utc::now());
        self.notifier.message(MessageReceived { topic, text });

        for reading in readings {
            self.history
                .append_point(&device_id, reading.zone(), reading.soil(), reading.timestamp());
            self.zones.apply_reading(&reading);
            self.notifier.reading(ReadingReceived {
                device_id: device_id.clone(),
                reading,
            });
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        tracing::debug!(from = %self.status, to = %status, "Connection status");
        self.status = status;
        self.notifier.status(StatusChanged::new(status));
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Returns the current session id.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Returns the topics of the current session.
    #[must_use]
    pub fn topics(&self) -> Option<&TopicPair> {
        self.session.as_ref().map(|s| &s.topics)
    }

    /// Returns the device of the current session.
    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.device_id.as_str())
    }

    /// Returns the client id the current session connected with.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.client_id.as_str())
    }

    /// Returns the broker settings currently saved in the store.
    #[must_use]
    pub fn saved_settings(&self) -> BrokerSettings {
        BrokerSettings::load(&self.store)
    }

    /// Blocks until every deferred store write has reached the backend.
    pub fn flush(&self) {
        self.store.flush();
    }

    /// Returns the deferred store settings and history are written through.
    #[must_use]
    pub fn store(&self) -> &WriteBehindStore {
        &self.store
    }

    /// Reloads `device_id`'s history from the store.
    pub fn load_history(&mut self, device_id: &str) -> HistoryView {
        self.history.load_history(device_id)
    }

    /// Returns the soil history.
    #[must_use]
    pub fn history(&self) -> &TimeSeriesStore {
        &self.history
    }

    /// Returns the latest zone states.
    #[must_use]
    pub fn zones(&self) -> &ZoneStateCache {
        &self.zones
    }

    /// Returns the notifier events are emitted on.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}

impl<T: Transport> std::fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("session", &self.session_id())
            .field("device", &self.device_id())
            .field("status", &self.status)
            .field("zones", &self.zones.len())
            .finish_non_exhaustive()
    }
}
