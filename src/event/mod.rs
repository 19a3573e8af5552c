// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed notifications.
//!
//! Each notification category has its own payload type and its own broadcast
//! channel, grouped in a [`Notifier`]:
//!
//! | Category | Payload |
//! |----------|---------|
//! | connection status | [`StatusChanged`] |
//! | topic change | [`TopicsChanged`] |
//! | decoded reading | [`ReadingReceived`] |
//! | raw payload | [`MessageReceived`] |
//! | operator notice | [`Notice`] |
//!
//! # Examples
//!
//! ```
//! use farmlink::event::Notifier;
//!
//! let notifier = Notifier::new();
//! let mut readings = notifier.subscribe_readings();
//! assert!(readings.try_recv().is_err());
//! ```

mod event_bus;
mod link_event;
mod notifier;

pub use event_bus::EventBus;
pub use link_event::{MessageReceived, Notice, ReadingReceived, StatusChanged, TopicsChanged};
pub use notifier::Notifier;
