// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT over secure WebSocket, backed by `rumqttc`.

use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ProtocolError;

use super::{SessionEvent, SessionId, SessionRequest, Transport, TransportEvent, TransportSession};

/// Capacity of the request queue between a client handle and its event loop.
const REQUEST_CAPACITY: usize = 10;

/// [`Transport`] that speaks MQTT 3.1.1 over `wss://`.
///
/// Every session gets its own client and a Tokio task that drives the event
/// loop, so [`Transport::open`] must be called from within a Tokio runtime.
#[derive(Debug, Clone)]
pub struct MqttTransport {
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl MqttTransport {
    /// Creates a transport that reports session events to `events`.
    #[must_use]
    pub fn new(events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { events }
    }
}

impl Transport for MqttTransport {
    type Session = MqttSession;

    fn open(&mut self, request: &SessionRequest) -> Result<MqttSession, ProtocolError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ProtocolError::ConnectionFailed(format!("no Tokio runtime: {e}")))?;

        let url = request.endpoint.url();
        let mut options = MqttOptions::new(&request.client_id, &url, request.endpoint.port());
        options.set_transport(rumqttc::Transport::wss_with_default_config());
        options.set_keep_alive(request.keep_alive);
        options.set_clean_session(request.clean_session);

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);

        let task = runtime.spawn(drive_session(
            event_loop,
            request.id,
            request.reconnect_period,
            self.events.clone(),
        ));

        tracing::debug!(
            session = %request.id,
            url = %url,
            client_id = %request.client_id,
            "MQTT session started"
        );

        Ok(MqttSession {
            id: request.id,
            client,
            task,
        })
    }
}

/// An open `rumqttc` session.
#[derive(Debug)]
pub struct MqttSession {
    id: SessionId,
    client: AsyncClient,
    task: JoinHandle<()>,
}

impl TransportSession for MqttSession {
    fn subscribe(&mut self, topic: &str) -> Result<(), ProtocolError> {
        self.client.try_subscribe(topic, QoS::AtMostOnce)?;
        tracing::debug!(session = %self.id, topic = %topic, "Subscribe queued");
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), ProtocolError> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())?;
        Ok(())
    }

    fn end(&mut self) {
        if let Err(e) = self.client.try_disconnect() {
            tracing::debug!(session = %self.id, error = %e, "Disconnect request not queued");
        }
        self.task.abort();
    }
}

impl Drop for MqttSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Polls the event loop and forwards what matters as [`SessionEvent`]s.
///
/// `rumqttc` reconnects on the next poll after an error; the task waits
/// `reconnect_period` first and announces the retry. It stops once the
/// receiver is gone.
async fn drive_session(
    mut event_loop: EventLoop,
    session: SessionId,
    reconnect_period: Duration,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    use rumqttc::{Event, Packet, SubscribeReasonCode};

    let emit = |event| events.send(SessionEvent::new(session, event)).is_ok();

    loop {
        let event = match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(session = %session, ?connack, "MQTT broker connected");
                TransportEvent::Connected
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                if suback
                    .return_codes
                    .iter()
                    .any(|code| matches!(code, SubscribeReasonCode::Failure))
                {
                    tracing::warn!(session = %session, ?suback, "MQTT subscription rejected");
                } else {
                    tracing::debug!(session = %session, ?suback, "MQTT subscription acknowledged");
                }
                continue;
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                tracing::trace!(
                    session = %session,
                    topic = %publish.topic,
                    bytes = publish.payload.len(),
                    "MQTT message received"
                );
                TransportEvent::Message {
                    topic: publish.topic.clone(),
                    payload: publish.payload.to_vec(),
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!(session = %session, "MQTT broker disconnected");
                TransportEvent::Closed
            }
            Ok(_) => continue,
            Err(e) => {
                tracing::error!(session = %session, error = %e, "MQTT event loop error");
                if !emit(TransportEvent::Error(e.to_string())) || !emit(TransportEvent::Closed) {
                    break;
                }
                tokio::time::sleep(reconnect_period).await;
                TransportEvent::Reconnecting
            }
        };

        if !emit(event) {
            break;
        }
    }

    tracing::debug!(session = %session, "MQTT event loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::BrokerEndpoint;

    fn request() -> SessionRequest {
        SessionRequest {
            id: SessionId::new(1),
            endpoint: BrokerEndpoint::new("127.0.0.1", 1, "/mqtt"),
            client_id: "farm_test_000000000000".to_string(),
            clean_session: true,
            keep_alive: Duration::from_secs(30),
            reconnect_period: Duration::from_millis(2000),
        }
    }

    #[test]
    fn open_outside_runtime_fails() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut transport = MqttTransport::new(tx);

        let result = transport.open(&request());
        assert!(matches!(result, Err(ProtocolError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn open_starts_session_and_end_stops_it() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut transport = MqttTransport::new(tx);

        let mut session = transport.open(&request()).unwrap();
        session.subscribe("farm/test/status").unwrap();
        session.publish("farm/test/cmd", "SHOW").unwrap();
        session.end();

        let joined = (&mut session.task).await;
        assert!(joined.unwrap_err().is_cancelled());
    }
}
