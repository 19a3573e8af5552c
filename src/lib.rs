// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `farmlink` - monitor and control a smart-farm controller over MQTT.
//!
//! The controller publishes a compact status line on `farm/<device>/status`
//! and accepts text commands on `farm/<device>/cmd`. This library keeps one
//! broker session over secure WebSocket, decodes the status lines into
//! per-zone readings, keeps a bounded soil-moisture history per device and
//! the latest thresholds and mode of every zone.
//!
//! # Supported Features
//!
//! - **Session lifecycle**: connect, disconnect, automatic reconnection
//! - **Commands**: status request, light and pump modes, zone modes, soil thresholds
//! - **Telemetry**: typed zone readings decoded from the status line
//! - **History**: soil series capped at 1000 points, persisted in a key-value store
//! - **Notifications**: status, topics, readings, raw messages and notices on
//!   broadcast channels
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use farmlink::{ConnectConfig, FarmLink, MemoryStore};
//! use farmlink::types::{ZoneIndex, ZoneMode};
//!
//! #[tokio::main]
//! async fn main() -> farmlink::Result<()> {
//!     let link = FarmLink::mqtt(Arc::new(MemoryStore::new()));
//!     link.connect(&ConnectConfig::new("greenhouse-7"))?;
//!
//!     let mut readings = link.subscribe_readings();
//!     while let Ok(event) = readings.recv().await {
//!         let reading = event.reading;
//!         println!("{}: soil {} ({:?})", reading.zone(), reading.soil(), reading.mode());
//!         if reading.soil() > reading.max_threshold() {
//!             link.set_zone_mode(reading.zone(), ZoneMode::On);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Decoding without a broker
//!
//! ```
//! use chrono::Utc;
//! use farmlink::telemetry::decode;
//!
//! let readings = decode("S1=1830(M1200..X2000) Z1=OFF", Utc::now());
//! assert_eq!(readings[0].soil(), 1830);
//! ```

pub mod command;
pub mod error;
pub mod event;
pub mod history;
pub mod manager;
pub mod persistence;
pub mod protocol;
pub mod state;
pub mod telemetry;
pub mod types;

pub use command::{Command, FarmCommand, ThresholdUpdate};
pub use error::{DecodeRejection, Error, ProtocolError, Result, StoreError, ValueError};
pub use event::{Notice, Notifier};
pub use history::{HistoryView, TimeSeriesStore};
pub use manager::{BrokerSettings, ConnectConfig, ConnectionManager, Delivery, FarmLink};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, SharedStore, WriteBehindStore};
#[cfg(feature = "mqtt")]
pub use protocol::MqttTransport;
pub use protocol::{ConnectionStatus, TopicPair, Transport, TransportSession};
pub use state::{ZoneState, ZoneStateCache};
pub use telemetry::ZoneReading;
pub use types::{LightMode, ZoneIndex, ZoneMode};
