// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `farmlink` library.
//!
//! This module provides the error hierarchy used across the library: value
//! validation, transport communication, key-value persistence and status
//! payload decoding.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred in the broker transport.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while reading or writing persisted state.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A status segment was rejected by the decoder.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeRejection),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Zone indices start at 1.
    #[error("zone index must be positive, got {0}")]
    InvalidZoneIndex(u32),

    /// An unknown zone mode string was provided.
    #[error("invalid zone mode: {0}")]
    InvalidZoneMode(String),

    /// The minimum threshold is not strictly below the maximum.
    #[error("minimum threshold {min} must be lower than maximum threshold {max}")]
    InvalidThresholds {
        /// Requested minimum.
        min: u32,
        /// Requested maximum.
        max: u32,
    },

    /// The device identifier is empty.
    #[error("device id must not be empty")]
    EmptyDeviceId,

    /// The device identifier contains an MQTT topic separator or wildcard.
    #[error("device id {0:?} must not contain '/', '+' or '#'")]
    InvalidDeviceId(String),

    /// The broker host is empty.
    #[error("broker host must not be empty")]
    EmptyHost,
}

/// Errors related to the broker transport.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MQTT client request could not be queued.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Errors raised by a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The store refused the write because it is full.
    #[error("quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded {
        /// Bytes the write would occupy.
        needed: usize,
        /// Bytes left in the store.
        available: usize,
    },

    /// The backing storage cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Why a candidate zone segment was not turned into a reading.
///
/// Rejections are never surfaced by [`decode`](crate::telemetry::decode); they
/// are only observable through [`scan`](crate::telemetry::scan).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeRejection {
    /// A literal token was expected but something else was found.
    #[error("expected {expected} at offset {offset}")]
    Expected {
        /// Token that was expected.
        expected: &'static str,
        /// Byte offset into the status text.
        offset: usize,
    },

    /// A number was expected but missing or too large.
    #[error("invalid {field} number at offset {offset}")]
    InvalidNumber {
        /// The field being read.
        field: &'static str,
        /// Byte offset into the status text.
        offset: usize,
    },

    /// The `S<k>` and `Z<k>` indices differ.
    #[error("zone index mismatch: S{soil} vs Z{mode}")]
    ZoneMismatch {
        /// Index from the soil token.
        soil: u32,
        /// Index from the mode token.
        mode: u32,
    },

    /// Zone index zero is not a valid zone.
    #[error("zone index must be positive")]
    ZeroZone,

    /// The mode word is not one of AUTO, ON, OFF.
    #[error("unknown zone mode '{0}'")]
    UnknownMode(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::InvalidThresholds { min: 2000, max: 1200 };
        assert_eq!(
            err.to_string(),
            "minimum threshold 2000 must be lower than maximum threshold 1200"
        );
    }

    #[test]
    fn error_from_value_error() {
        let err: Error = ValueError::InvalidZoneIndex(0).into();
        assert!(matches!(err, Error::Value(ValueError::InvalidZoneIndex(0))));
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::QuotaExceeded {
            needed: 120,
            available: 64,
        };
        assert_eq!(
            err.to_string(),
            "quota exceeded: 120 bytes needed, 64 available"
        );
    }

    #[test]
    fn decode_rejection_display() {
        let err = DecodeRejection::ZoneMismatch { soil: 1, mode: 2 };
        assert_eq!(err.to_string(), "zone index mismatch: S1 vs Z2");
    }
}
