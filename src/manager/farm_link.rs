// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Async application context around the connection state machine.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::command::{Command, FarmCommand, ThresholdUpdate};
use crate::error::Result;
use crate::event::{
    MessageReceived, Notice, Notifier, ReadingReceived, StatusChanged, TopicsChanged,
};
use crate::history::HistoryView;
use crate::persistence::SharedStore;
use crate::protocol::{ConnectionStatus, SessionEvent, SessionId, TopicPair, Transport};
use crate::state::ZoneState;
use crate::types::{LightMode, ZoneIndex, ZoneMode};

use super::{BrokerSettings, ConnectConfig, ConnectionManager, Delivery};

/// Link to one farm controller through an MQTT broker.
///
/// `FarmLink` owns the [`ConnectionManager`] and a background task that feeds
/// it the transport's events one at a time. All methods are cheap and never
/// wait on the network; outcomes arrive as notifications.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use farmlink::manager::{ConnectConfig, FarmLink};
/// use farmlink::persistence::FileStore;
/// use farmlink::types::{ZoneIndex, ZoneMode};
///
/// #[tokio::main]
/// async fn main() -> farmlink::Result<()> {
///     let link = FarmLink::mqtt(Arc::new(FileStore::open_default()?));
///
///     let mut readings = link.subscribe_readings();
///     tokio::spawn(async move {
///         while let Ok(event) = readings.recv().await {
///             println!("{} soil={}", event.reading.zone(), event.reading.soil());
///         }
///     });
///
///     let settings = link.saved_settings();
///     link.connect(&ConnectConfig::from_settings(&settings, "greenhouse-7"))?;
///
///     // Once online:
///     link.set_zone_mode(ZoneIndex::new(2)?, ZoneMode::Auto);
///     link.apply_thresholds(ZoneIndex::new(2)?, 1100, 1800).await?;
///     Ok(())
/// }
/// ```
pub struct FarmLink<T: Transport> {
    manager: Arc<Mutex<ConnectionManager<T>>>,
    notifier: Notifier,
    pump: JoinHandle<()>,
}

impl<T: Transport> FarmLink<T> {
    /// Creates a link driving `transport`, whose session events arrive on
    /// `events`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(
        transport: T,
        events: mpsc::UnboundedReceiver<SessionEvent>,
        store: SharedStore,
    ) -> Self {
        let notifier = Notifier::new();
        let manager = Arc::new(Mutex::new(ConnectionManager::new(
            transport,
            store,
            notifier.clone(),
        )));
        let pump = tokio::spawn(pump_events(Arc::clone(&manager), events));

        Self {
            manager,
            notifier,
            pump,
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Opens a session for `config`, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the transport
    /// cannot start the session.
    pub fn connect(&self, config: &ConnectConfig) -> Result<SessionId> {
        self.manager.lock().connect(config)
    }

    /// Ends the session. Always reports `Disconnected` once.
    pub fn disconnect(&self) {
        self.manager.lock().disconnect();
    }

    /// Returns the connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.manager.lock().status()
    }

    /// Returns the topics of the current session.
    #[must_use]
    pub fn topics(&self) -> Option<TopicPair> {
        self.manager.lock().topics().cloned()
    }

    /// Returns the device of the current session.
    #[must_use]
    pub fn device_id(&self) -> Option<String> {
        self.manager.lock().device_id().map(str::to_string)
    }

    /// Returns the broker settings saved by the last `connect`.
    #[must_use]
    pub fn saved_settings(&self) -> BrokerSettings {
        self.manager.lock().saved_settings()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Publishes raw command text.
    pub fn publish_cmd(&self, text: &str) -> Delivery {
        self.manager.lock().publish_cmd(text)
    }

    /// Publishes a typed command.
    pub fn send(&self, command: &impl Command) -> Delivery {
        self.manager.lock().send(command)
    }

    /// Asks the controller for a status line.
    pub fn show(&self) -> Delivery {
        self.send(&FarmCommand::Show)
    }

    /// Switches the light on.
    pub fn light_on(&self) -> Delivery {
        self.send(&FarmCommand::Light(LightMode::On))
    }

    /// Returns the light to its schedule.
    pub fn light_auto(&self) -> Delivery {
        self.send(&FarmCommand::Light(LightMode::Auto))
    }

    /// Returns the pump to automatic control.
    pub fn pump_auto(&self) -> Delivery {
        self.send(&FarmCommand::PumpAuto)
    }

    /// Sets the irrigation mode of one zone.
    pub fn set_zone_mode(&self, zone: ZoneIndex, mode: ZoneMode) -> Delivery {
        self.send(&FarmCommand::ZoneMode { zone, mode })
    }

    /// Sends new soil thresholds for `zone`, then asks for a status line.
    ///
    /// The minimum and maximum are sent back to back; `SHOW` follows after
    /// [`ThresholdUpdate::CONFIRM_DELAY`]. If a threshold is dropped, nothing
    /// further is sent.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidThresholds`](crate::error::ValueError::InvalidThresholds)
    /// when `min >= max`; a [`Notice`] is emitted and nothing is sent.
    pub async fn apply_thresholds(&self, zone: ZoneIndex, min: u32, max: u32) -> Result<Delivery> {
        let update = match ThresholdUpdate::new(zone, min, max) {
            Ok(update) => update,
            Err(e) => {
                self.notifier.notice(Notice::InvalidThresholds(e.clone()));
                return Err(e.into());
            }
        };

        for command in update.commands() {
            if !self.send(&command).is_sent() {
                return Ok(Delivery::Dropped);
            }
        }

        tokio::time::sleep(ThresholdUpdate::CONFIRM_DELAY).await;
        Ok(self.show())
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Reloads `device_id`'s soil history from the store.
    ///
    /// Readings also read a device's stored history back on first use, so
    /// calling this is only needed to show history before any reading.
    pub fn load_history(&self, device_id: &str) -> HistoryView {
        self.manager.lock().load_history(device_id)
    }

    /// Returns the soil history of the current device.
    #[must_use]
    pub fn history_view(&self) -> HistoryView {
        let manager = self.manager.lock();
        manager
            .device_id()
            .map(|device| manager.history().view(device))
            .unwrap_or_default()
    }

    /// Returns the soil history of `device_id`.
    #[must_use]
    pub fn history_for(&self, device_id: &str) -> HistoryView {
        self.manager.lock().history().view(device_id)
    }

    /// Waits until every deferred store write has reached the backend.
    pub async fn flush(&self) {
        let store = self.manager.lock().store().clone();
        if let Err(e) = tokio::task::spawn_blocking(move || store.flush()).await {
            tracing::warn!(error = %e, "Store flush task failed");
        }
    }

    /// Returns the latest known state of `zone`.
    #[must_use]
    pub fn zone_state(&self, zone: ZoneIndex) -> Option<ZoneState> {
        self.manager.lock().zones().get(zone).copied()
    }

    /// Returns the latest known state of every zone, by zone index.
    #[must_use]
    pub fn zone_states(&self) -> Vec<(ZoneIndex, ZoneState)> {
        self.manager
            .lock()
            .zones()
            .iter()
            .map(|(zone, state)| (zone, *state))
            .collect()
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    /// Returns the notifier shared with the connection manager.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Subscribes to status changes.
    #[must_use]
    pub fn subscribe_status(&self) -> broadcast::Receiver<StatusChanged> {
        self.notifier.subscribe_status()
    }

    /// Subscribes to topic changes.
    #[must_use]
    pub fn subscribe_topics(&self) -> broadcast::Receiver<TopicsChanged> {
        self.notifier.subscribe_topics()
    }

    /// Subscribes to decoded zone readings.
    #[must_use]
    pub fn subscribe_readings(&self) -> broadcast::Receiver<ReadingReceived> {
        self.notifier.subscribe_readings()
    }

    /// Subscribes to raw inbound payloads.
    #[must_use]
    pub fn subscribe_messages(&self) -> broadcast::Receiver<MessageReceived> {
        self.notifier.subscribe_messages()
    }

    /// Subscribes to operator notices.
    #[must_use]
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notifier.subscribe_notices()
    }
}

#[cfg(feature = "mqtt")]
impl FarmLink<crate::protocol::MqttTransport> {
    /// Creates a link that connects over MQTT on secure WebSocket.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn mqtt(store: SharedStore) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self::new(crate::protocol::MqttTransport::new(tx), rx, store)
    }
}

impl<T: Transport> Drop for FarmLink<T> {
    fn drop(&mut self) {
        self.pump.abort();
        let mut manager = self.manager.lock();
        manager.disconnect();
        manager.flush();
    }
}

impl<T: Transport> std::fmt::Debug for FarmLink<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FarmLink")
            .field("manager", &*self.manager.lock())
            .finish_non_exhaustive()
    }
}

/// Feeds transport events to the manager until the channel closes.
async fn pump_events<T: Transport>(
    manager: Arc<Mutex<ConnectionManager<T>>>,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
) {
    while let Some(event) = events.recv().await {
        manager.lock().handle_event(event);
    }
    tracing::debug!("Transport event channel closed");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::error::{Error, ValueError};
    use crate::manager::connection_manager::tests::{Call, MockTransport};
    use crate::persistence::{KeyValueStore, MemoryStore};
    use crate::protocol::TransportEvent;

    struct Harness {
        link: FarmLink<MockTransport>,
        transport: MockTransport,
        events: mpsc::UnboundedSender<SessionEvent>,
    }

    fn harness() -> Harness {
        let transport = MockTransport::default();
        let (events, rx) = mpsc::unbounded_channel();
        let link = FarmLink::new(transport.clone(), rx, Arc::new(MemoryStore::new()));
        Harness {
            link,
            transport,
            events,
        }
    }

    impl Harness {
        async fn go_online(&self, device: &str) -> SessionId {
            let mut status = self.link.subscribe_status();
            let id = self.link.connect(&ConnectConfig::new(device)).unwrap();
            self.events
                .send(SessionEvent::new(id, TransportEvent::Connected))
                .unwrap();
            while status.recv().await.unwrap().status != ConnectionStatus::Online {}
            id
        }
    }

    fn zone(n: u32) -> ZoneIndex {
        ZoneIndex::new(n).unwrap()
    }

    #[tokio::test]
    async fn connected_event_flows_through_pump() {
        let h = harness();

        h.go_online("d").await;

        assert_eq!(h.link.status(), ConnectionStatus::Online);
        assert_eq!(h.transport.published(), vec!["SHOW"]);
        assert_eq!(h.link.topics(), Some(TopicPair::for_device("d")));
    }

    #[tokio::test]
    async fn shortcuts_render_commands() {
        let h = harness();
        h.go_online("d").await;

        h.link.light_on();
        h.link.light_auto();
        h.link.pump_auto();
        h.link.set_zone_mode(zone(3), ZoneMode::Off);

        assert_eq!(
            h.transport.published(),
            vec!["SHOW", "LIGHT ON", "LIGHT AUTO", "PUMP AUTO", "Z3 OFF"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn thresholds_then_delayed_show() {
        let h = harness();
        h.go_online("d").await;

        let started = Instant::now();
        let delivery = h.link.apply_thresholds(zone(2), 1100, 1800).await.unwrap();

        assert_eq!(delivery, Delivery::Sent);
        assert!(started.elapsed() >= Duration::from_millis(150));
        assert_eq!(
            h.transport.published(),
            vec!["SHOW", "SET MIN2 1100", "SET MAX2 1800", "SHOW"]
        );
    }

    #[tokio::test]
    async fn inverted_thresholds_send_nothing() {
        let h = harness();
        h.go_online("d").await;
        let mut notices = h.link.subscribe_notices();

        let err = h.link.apply_thresholds(zone(1), 1800, 1100).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Value(ValueError::InvalidThresholds { min: 1800, max: 1100 })
        ));
        assert!(matches!(notices.recv().await.unwrap(), Notice::InvalidThresholds(_)));
        assert_eq!(h.transport.published(), vec!["SHOW"]);
    }

    #[tokio::test]
    async fn thresholds_offline_stop_after_first_drop() {
        let h = harness();
        let mut notices = h.link.subscribe_notices();

        let delivery = h.link.apply_thresholds(zone(1), 10, 20).await.unwrap();

        assert_eq!(delivery, Delivery::Dropped);
        assert!(matches!(notices.recv().await.unwrap(), Notice::NotConnected { .. }));
        assert!(notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn readings_update_zone_states_and_history() {
        let h = harness();
        let id = h.go_online("d").await;
        let mut readings = h.link.subscribe_readings();

        h.events
            .send(SessionEvent::new(
                id,
                TransportEvent::Message {
                    topic: "farm/d/status".to_string(),
                    payload: b"S2=900(M800..X1500) Z2=AUTO | S1=1000(M700..X1400) Z1=ON".to_vec(),
                },
            ))
            .unwrap();
        readings.recv().await.unwrap();
        readings.recv().await.unwrap();

        let states = h.link.zone_states();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].0, zone(1));
        assert_eq!(states[1].1.mode, ZoneMode::Auto);
        assert_eq!(h.link.zone_state(zone(1)).unwrap().max_threshold, 1400);
        assert_eq!(h.link.history_view().values(zone(2)), &[900]);
        assert!(h.link.history_for("other").is_empty());
    }

    #[tokio::test]
    async fn history_view_without_session_is_empty() {
        let h = harness();
        assert!(h.link.history_view().is_empty());
        assert_eq!(h.link.device_id(), None);
    }

    #[tokio::test]
    async fn drop_ends_session() {
        let h = harness();
        let id = h.go_online("d").await;
        let transport = h.transport.clone();

        drop(h);

        assert!(transport.calls().contains(&Call::End(id)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn flush_writes_readings_to_backend() {
        let store = Arc::new(MemoryStore::new());
        let transport = MockTransport::default();
        let (events, rx) = mpsc::unbounded_channel();
        let h = Harness {
            link: FarmLink::new(transport.clone(), rx, store.clone()),
            transport,
            events,
        };
        let id = h.go_online("d").await;
        let mut readings = h.link.subscribe_readings();
        h.events
            .send(SessionEvent::new(
                id,
                TransportEvent::Message {
                    topic: "farm/d/status".to_string(),
                    payload: b"S2=640(M0..X9) Z2=AUTO".to_vec(),
                },
            ))
            .unwrap();
        readings.recv().await.unwrap();

        h.link.flush().await;

        assert_eq!(store.get("broker:host").unwrap().as_deref(), Some("broker.hivemq.com"));
        let history = store.get("history:d").unwrap().unwrap();
        assert!(history.contains("640"), "{history}");
    }
}
