// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Error types for facemgr
//!
//! Configuration errors are fatal to the `configure` call that raised them.
//! Face-creation policy rejections are not errors: they are delivered to the
//! failure callback as a [`crate::channel::FaceCreationFailure`].

use crate::face::FaceId;
use thiserror::Error;

/// Main error type for facemgr operations
#[derive(Error, Debug)]
pub enum FaceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Face table error: {0}")]
    FaceTable(#[from] FaceTableError),

    #[error("Invalid face URI: {0}")]
    InvalidUri(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("No protocol factory for scheme: {0}")]
    UnsupportedScheme(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Actor channel closed")]
    ActorClosed,
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unrecognized option {section}.{key}")]
    UnrecognizedOption { section: String, key: String },

    #[error("Invalid value for option {section}.{key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        reason: String,
    },

    #[error(
        "IPv4 and IPv6 {protocol} channels have been disabled. Remove face_system.{section} \
         section to disable {protocol} channels or enable at least one channel type."
    )]
    NoChannelEnabled { protocol: String, section: String },

    #[error("Cannot listen on {endpoint}: {reason}")]
    ChannelListen { endpoint: String, reason: String },

    #[error("Unrecognized protocol section face_system.{0}")]
    UnknownProtocol(String),

    #[error("Failed to read config file: {0}")]
    Read(String),

    #[error("Failed to parse config file: {0}")]
    Parse(String),
}

/// Face table errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FaceTableError {
    #[error("Face is already registered with id {0}")]
    AlreadyRegistered(FaceId),

    #[error("Face not found: {0}")]
    NotFound(FaceId),

    #[error("Face to {0} is closed")]
    Closed(String),
}

impl From<FaceError> for String {
    fn from(err: FaceError) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_channel_enabled_carries_hint() {
        let err = ConfigError::NoChannelEnabled {
            protocol: "TCP".to_string(),
            section: "tcp".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Remove face_system.tcp section"));
        assert!(msg.contains("enable at least one channel type"));
    }

    #[test]
    fn test_unrecognized_option_names_key() {
        let err: FaceError = ConfigError::UnrecognizedOption {
            section: "face_system.tcp".to_string(),
            key: "lisen".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Unrecognized option face_system.tcp.lisen"
        );
    }
}
