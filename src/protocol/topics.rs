// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topic derivation.

use std::fmt;

/// Root segment shared by every controller topic.
const TOPIC_ROOT: &str = "farm";

/// Command and status topics of one device.
///
/// # Examples
///
/// ```
/// use farmlink::protocol::TopicPair;
///
/// let topics = TopicPair::for_device("greenhouse-7");
/// assert_eq!(topics.cmd(), "farm/greenhouse-7/cmd");
/// assert_eq!(topics.status(), "farm/greenhouse-7/status");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPair {
    cmd: String,
    status: String,
}

impl TopicPair {
    /// Derives the topics for `device_id`.
    #[must_use]
    pub fn for_device(device_id: &str) -> Self {
        Self {
            cmd: format!("{TOPIC_ROOT}/{device_id}/cmd"),
            status: format!("{TOPIC_ROOT}/{device_id}/status"),
        }
    }

    /// Topic the client publishes commands to.
    #[must_use]
    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    /// Topic the client subscribes to for status lines.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }
}

impl fmt::Display for TopicPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ⇄ {}", self.cmd, self.status)
    }
}
