// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broker settings and per-connection configuration.

use uuid::Uuid;

use crate::error::{StoreError, ValueError};
use crate::persistence::KeyValueStore;
use crate::protocol::BrokerEndpoint;

/// Default public broker.
pub const DEFAULT_HOST: &str = "broker.hivemq.com";

/// Default secure WebSocket port.
pub const DEFAULT_PORT: u16 = 8884;

/// Default WebSocket path.
pub const DEFAULT_PATH: &str = "/mqtt";

const KEY_HOST: &str = "broker:host";
const KEY_PORT: &str = "broker:port";
const KEY_PATH: &str = "broker:path";
const KEY_CLIENT_ID: &str = "broker:client_id";

/// Hex digits of the random client id suffix.
const CLIENT_ID_SUFFIX_LEN: usize = 12;

/// Broker settings remembered between runs.
///
/// An empty `client_id` means a fresh one is generated for every session.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use farmlink::manager::BrokerSettings;
/// use farmlink::persistence::MemoryStore;
///
/// let store = MemoryStore::new();
/// assert_eq!(BrokerSettings::load(&store), BrokerSettings::default());
///
/// let settings = BrokerSettings {
///     host: "mqtt.example.org".to_string(),
///     ..BrokerSettings::default()
/// };
/// settings.save(&store).unwrap();
/// assert_eq!(BrokerSettings::load(&store).host, "mqtt.example.org");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    /// Broker host name or address.
    pub host: String,
    /// Secure WebSocket port.
    pub port: u16,
    /// WebSocket path.
    pub path: String,
    /// MQTT client id, empty to generate one.
    pub client_id: String,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
            client_id: String::new(),
        }
    }
}

impl BrokerSettings {
    /// Loads settings from `store`, falling back to defaults per field.
    #[must_use]
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Self::default();

        let port = match read(store, KEY_PORT) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Ignoring invalid stored broker port");
                defaults.port
            }),
            None => defaults.port,
        };

        Self {
            host: read(store, KEY_HOST).unwrap_or(defaults.host),
            port,
            path: read(store, KEY_PATH).unwrap_or(defaults.path),
            client_id: read(store, KEY_CLIENT_ID).unwrap_or(defaults.client_id),
        }
    }

    /// Writes every field to `store`.
    ///
    /// # Errors
    ///
    /// Returns the first store error encountered.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        store.set(KEY_HOST, &self.host)?;
        store.set(KEY_PORT, &self.port.to_string())?;
        store.set(KEY_PATH, &self.path)?;
        store.set(KEY_CLIENT_ID, &self.client_id)
    }
}

fn read(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Failed to read broker setting");
            None
        }
    }
}

/// Parameters of one `connect` call.
///
/// Text inputs are trimmed. A blank client id counts as none.
///
/// # Examples
///
/// ```
/// use farmlink::manager::ConnectConfig;
///
/// let config = ConnectConfig::new(" greenhouse-7 ")
///     .with_host("10.0.0.5")
///     .with_port(443);
///
/// assert_eq!(config.device_id(), "greenhouse-7");
/// assert_eq!(config.endpoint().url(), "wss://10.0.0.5:443/mqtt");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectConfig {
    host: String,
    port: u16,
    path: String,
    client_id: Option<String>,
    device_id: String,
}

impl ConnectConfig {
    /// Creates a configuration for `device_id` on the default broker.
    #[must_use]
    pub fn new(device_id: impl AsRef<str>) -> Self {
        Self::from_settings(&BrokerSettings::default(), device_id)
    }

    /// Creates a configuration for `device_id` from saved settings.
    #[must_use]
    pub fn from_settings(settings: &BrokerSettings, device_id: impl AsRef<str>) -> Self {
        Self {
            host: settings.host.trim().to_string(),
            port: settings.port,
            path: settings.path.trim().to_string(),
            client_id: non_blank(&settings.client_id),
            device_id: device_id.as_ref().trim().to_string(),
        }
    }

    /// Sets the broker host.
    #[must_use]
    pub fn with_host(mut self, host: impl AsRef<str>) -> Self {
        self.host = host.as_ref().trim().to_string();
        self
    }

    /// Sets the broker port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the WebSocket path.
    #[must_use]
    pub fn with_path(mut self, path: impl AsRef<str>) -> Self {
        self.path = path.as_ref().trim().to_string();
        self
    }

    /// Sets a fixed MQTT client id.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl AsRef<str>) -> Self {
        self.client_id = non_blank(client_id.as_ref());
        self
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

    /// Returns the fixed client id, if any.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Returns the device id.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Checks that the configuration can open a session.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::EmptyDeviceId`], [`ValueError::InvalidDeviceId`]
    /// for an id that would change the topic structure, or
    /// [`ValueError::EmptyHost`].
    pub fn validate(&self) -> Result<(), ValueError> {
        if self.device_id.is_empty() {
            return Err(ValueError::EmptyDeviceId);
        }
        if self.device_id.contains(['/', '+', '#']) {
            return Err(ValueError::InvalidDeviceId(self.device_id.clone()));
        }
        if self.host.is_empty() {
            return Err(ValueError::EmptyHost);
        }
        Ok(())
    }

    /// Returns the broker endpoint.
    #[must_use]
    pub fn endpoint(&self) -> BrokerEndpoint {
        BrokerEndpoint::new(&self.host, self.port, &self.path)
    }

    /// Returns the fixed client id, or generates `farm_<device>_<12 hex>`.
    #[must_use]
    pub fn resolve_client_id(&self) -> String {
        if let Some(client_id) = &self.client_id {
            return client_id.clone();
        }
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "farm_{}_{}",
            self.device_id,
            &suffix[..CLIENT_ID_SUFFIX_LEN]
        )
    }

    /// Returns the settings to remember for this configuration.
    #[must_use]
    pub fn settings(&self) -> BrokerSettings {
        BrokerSettings {
            host: self.host.clone(),
            port: self.port,
            path: self.path.clone(),
            client_id: self.client_id.clone().unwrap_or_default(),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
