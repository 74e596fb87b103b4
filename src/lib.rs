// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Face management for a named-data forwarding daemon.
//!
//! A face is a communication link to a peer or local application. This
//! crate assigns faces their ids in the [`FaceTable`], wires them to the
//! forwarding engine, and creates them over TCP channels configured from
//! the `face_system` section of the daemon configuration.

// Public module declarations
pub mod actors;
pub mod channel;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod face;
pub mod face_system;
pub mod face_table;
pub mod face_uri;
pub mod factory;
pub mod fib;
pub mod forwarder;
pub mod interfaces;
pub mod packet;
pub mod signal;
pub mod status;
pub mod tcp;
pub mod tcp_factory;

// Re-export commonly used types
pub use actors::{FaceTableActor, FaceTableHandle, FaceTableMessage, spawn_face_table};
pub use channel::{
    AddFaceSink, Channel, FaceCreatedCallback, FaceCreationFailedCallback, FaceCreationFailure,
};
pub use config::{CliArgs, DaemonConfiguration, TomlConfig};
pub use endpoint::{AddressFamily, Endpoint};
pub use error::{ConfigError, FaceError, FaceTableError};
pub use face::{Face, FaceId, FacePersistency, FaceScope, Transport};
pub use face_system::FaceSystem;
pub use face_table::FaceTable;
pub use face_uri::FaceUri;
pub use factory::{
    ConfigContext, ConfigMode, FaceRequest, FactoryRegistry, ProhibitedEndpoints, ProtocolFactory,
};
pub use fib::{Fib, FibEntry, NextHop};
pub use forwarder::{Forwarder, ForwardingEngine};
pub use interfaces::{NetworkInterfaces, StaticInterfaces, SystemInterfaces};
pub use packet::{Data, Interest, Name};
pub use signal::{Signal, Subscription};
pub use status::{ChannelStatus, FaceStatus, StatusReport};
pub use tcp::{TcpChannel, TcpTransport};
pub use tcp_factory::{TcpConfig, TcpFactory};
