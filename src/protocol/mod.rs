// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broker protocol plumbing.
//!
//! This module holds the addressing types ([`BrokerEndpoint`], [`TopicPair`]),
//! the [`Transport`] seam the connection manager drives, and, with the `mqtt`
//! feature, the [`MqttTransport`] that implements it over `wss://`.

mod endpoint;
#[cfg(feature = "mqtt")]
mod mqtt;
mod status;
mod topics;
mod transport;

pub use endpoint::BrokerEndpoint;
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttSession, MqttTransport};
pub use status::ConnectionStatus;
pub use topics::TopicPair;
pub use transport::{
    SessionEvent, SessionId, SessionRequest, Transport, TransportEvent, TransportSession,
};
