// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bundle of typed event buses.

use tokio::sync::broadcast;

use super::{EventBus, MessageReceived, Notice, ReadingReceived, StatusChanged, TopicsChanged};

/// One event bus per notification category.
///
/// Cloning a `Notifier` shares the underlying channels.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    status: EventBus<StatusChanged>,
    topics: EventBus<TopicsChanged>,
    readings: EventBus<ReadingReceived>,
    messages: EventBus<MessageReceived>,
    notices: EventBus<Notice>,
}

impl Notifier {
    /// Creates a notifier with default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a notifier whose channels hold `capacity` events each.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            status: EventBus::with_capacity(capacity),
            topics: EventBus::with_capacity(capacity),
            readings: EventBus::with_capacity(capacity),
            messages: EventBus::with_capacity(capacity),
            notices: EventBus::with_capacity(capacity),
        }
    }

    /// Subscribes to connection status changes.
    #[must_use]
    pub fn subscribe_status(&self) -> broadcast::Receiver<StatusChanged> {
        self.status.subscribe()
    }

    /// Subscribes to topic changes.
    #[must_use]
    pub fn subscribe_topics(&self) -> broadcast::Receiver<TopicsChanged> {
        self.topics.subscribe()
    }

    /// Subscribes to decoded zone readings.
    #[must_use]
    pub fn subscribe_readings(&self) -> broadcast::Receiver<ReadingReceived> {
        self.readings.subscribe()
    }

    /// Subscribes to raw inbound payloads.
    #[must_use]
    pub fn subscribe_messages(&self) -> broadcast::Receiver<MessageReceived> {
        self.messages.subscribe()
    }

    /// Subscribes to operator notices.
    #[must_use]
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub(crate) fn status(&self, event: StatusChanged) {
        self.status.publish(event);
    }

    pub(crate) fn topics(&self, event: TopicsChanged) {
        self.topics.publish(event);
    }

    pub(crate) fn reading(&self, event: ReadingReceived) {
        self.readings.publish(event);
    }

    pub(crate) fn message(&self, event: MessageReceived) {
        self.messages.publish(event);
    }

    pub(crate) fn notice(&self, notice: Notice) {
        tracing::warn!(%notice, "Operator notice");
        self.notices.publish(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ConnectionStatus;

    #[test]
    fn categories_are_independent() {
        let notifier = Notifier::new();
        let mut status = notifier.subscribe_status();
        let mut notices = notifier.subscribe_notices();

        notifier.status(StatusChanged::new(ConnectionStatus::Online));

        assert_eq!(
            status.try_recv().unwrap(),
            StatusChanged::new(ConnectionStatus::Online)
        );
        assert!(notices.try_recv().is_err());
    }

    #[test]
    fn clones_share_channels() {
        let notifier = Notifier::new();
        let clone = notifier.clone();
        let mut rx = notifier.subscribe_notices();

        clone.notice(Notice::NotConnected {
            command: "SHOW".to_string(),
        });

        assert!(matches!(rx.try_recv(), Ok(Notice::NotConnected { .. })));
    }
}
