// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broker endpoint addressing.

use std::fmt;

/// Secure WebSocket address of the broker.
///
/// # Examples
///
/// ```
/// use farmlink::protocol::BrokerEndpoint;
///
/// let endpoint = BrokerEndpoint::new("broker.hivemq.com", 8884, "/mqtt");
/// assert_eq!(endpoint.url(), "wss://broker.hivemq.com:8884/mqtt");
///
/// // A missing leading slash is added.
/// let endpoint = BrokerEndpoint::new("10.0.0.2", 443, "ws");
/// assert_eq!(endpoint.url(), "wss://10.0.0.2:443/ws");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    host: String,
    port: u16,
    path: String,
}

impl BrokerEndpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.is_empty() || path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        Self {
            host: host.into(),
            port,
            path,
        }
    }

    /// Returns the broker host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the broker port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the WebSocket path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns `wss://<host>:<port><path>`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("wss://{}:{}{}", self.host, self.port, self.path)
    }
}

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}
