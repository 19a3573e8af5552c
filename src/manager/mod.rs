// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session management for one farm controller.
//!
//! # Overview
//!
//! - [`ConnectConfig`] and [`BrokerSettings`] describe where to connect and
//!   what to remember between runs.
//! - [`ConnectionManager`] is the synchronous state machine: it owns the
//!   broker session, routes commands to the command topic and turns status
//!   lines into readings, history points and zone states.
//! - [`FarmLink`] wraps the manager for async applications and drives it
//!   from the transport's event stream.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use farmlink::manager::{ConnectConfig, FarmLink};
//! use farmlink::persistence::MemoryStore;
//! use farmlink::protocol::ConnectionStatus;
//!
//! # async fn example() -> farmlink::Result<()> {
//! let link = FarmLink::mqtt(Arc::new(MemoryStore::new()));
//! let mut status = link.subscribe_status();
//!
//! link.connect(&ConnectConfig::new("greenhouse-7"))?;
//! while let Ok(event) = status.recv().await {
//!     if event.status == ConnectionStatus::Online {
//!         break;
//!     }
//! }
//! link.light_on();
//! # Ok(())
//! # }
//! ```

mod connection_manager;
mod farm_link;
mod link_config;

pub use connection_manager::{ConnectionManager, Delivery, KEEP_ALIVE, RECONNECT_PERIOD};
pub use farm_link::FarmLink;
pub use link_config::{BrokerSettings, ConnectConfig, DEFAULT_HOST, DEFAULT_PATH, DEFAULT_PORT};
