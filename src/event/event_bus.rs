// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed broadcast channel.

use tokio::sync::broadcast;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Broadcast channel carrying one event type to any number of subscribers.
///
/// Each subscriber gets its own copy of every event published after it
/// subscribed.
///
/// # Capacity
///
/// The bus has a fixed capacity (default 256). A subscriber that falls further
/// behind loses the oldest events and receives `RecvError::Lagged`.
///
/// # Examples
///
/// ```
/// use farmlink::event::EventBus;
///
/// let bus: EventBus<u32> = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(7);
/// assert_eq!(rx.try_recv().unwrap(), 7);
/// ```
#[derive(Debug)]
pub struct EventBus<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone> EventBus<T> {
    /// Creates a bus holding up to 256 pending events per subscriber.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus holding up to `capacity` pending events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    /// Returns how many receivers are alive.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Sends `event` to every current subscriber; dropped when there are none.
    pub fn publish(&self, event: T) {
        let _ = self.publish_counted(event);
    }

    /// Sends `event` and returns how many subscribers received it.
    #[must_use = "use `publish` when the count is not needed"]
    pub fn publish_counted(&self, event: T) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventBus<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
