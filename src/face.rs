// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Faces
//!
//! A face is one communication endpoint through which the daemon exchanges
//! packets with a neighbor. A face is created unregistered (its id is
//! [`FaceId::INVALID`]), becomes registered when the face table assigns it
//! an id, and returns to the invalid id once removed.

use crate::endpoint::Endpoint;
use crate::face_uri::FaceUri;
use crate::packet::{Data, Interest};
use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Process-unique face handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceId(u64);

impl FaceId {
    /// Marks a face that is not (or no longer) registered
    pub const INVALID: FaceId = FaceId(0);
    /// First id handed out by a face table
    pub const FIRST: FaceId = FaceId(1);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a face survives idle periods and failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FacePersistency {
    /// Created by accepting an inbound connection; closed when idle
    OnDemand,
    /// Created on request; closed on transport failure
    Persistent,
    /// Created on request; survives transport failures
    Permanent,
}

impl fmt::Display for FacePersistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacePersistency::OnDemand => write!(f, "on-demand"),
            FacePersistency::Persistent => write!(f, "persistent"),
            FacePersistency::Permanent => write!(f, "permanent"),
        }
    }
}

impl FromStr for FacePersistency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "on-demand" | "ondemand" => Ok(FacePersistency::OnDemand),
            "persistent" => Ok(FacePersistency::Persistent),
            "permanent" => Ok(FacePersistency::Permanent),
            _ => Err(format!(
                "Invalid persistency: {}. Use 'on-demand', 'persistent', or 'permanent'",
                s
            )),
        }
    }
}

/// Local faces reach applications on the same host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaceScope {
    Local,
    NonLocal,
}

impl FaceScope {
    /// Scope is local exactly when the peer address is loopback
    pub fn of(remote: &Endpoint) -> Self {
        if remote.is_loopback() {
            FaceScope::Local
        } else {
            FaceScope::NonLocal
        }
    }
}

/// Byte-level link underneath a face
pub trait Transport: Send + fmt::Debug {
    /// Releases the underlying connection
    fn close(&mut self);
}

/// Inbound packet counters
#[derive(Debug, Default)]
pub struct FaceCounters {
    n_in_interests: AtomicU64,
    n_in_data: AtomicU64,
}

impl FaceCounters {
    pub fn n_in_interests(&self) -> u64 {
        self.n_in_interests.load(Ordering::Relaxed)
    }

    pub fn n_in_data(&self) -> u64 {
        self.n_in_data.load(Ordering::Relaxed)
    }
}

/// One communication endpoint
pub struct Face {
    id: AtomicU64,
    local_uri: FaceUri,
    remote_uri: FaceUri,
    persistency: FacePersistency,
    scope: FaceScope,
    local_fields_enabled: bool,
    /// Fired for every interest received on this face
    pub on_receive_interest: Signal<Interest>,
    /// Fired for every data packet received on this face
    pub on_receive_data: Signal<Data>,
    counters: FaceCounters,
    closed: AtomicBool,
    transport: Mutex<Option<Box<dyn Transport>>>,
}

impl Face {
    /// Creates an unregistered face between two endpoints
    ///
    /// Local fields are only honoured when the remote endpoint is loopback.
    pub fn new(
        protocol: &str,
        local: Endpoint,
        remote: Endpoint,
        persistency: FacePersistency,
        want_local_fields: bool,
    ) -> Self {
        let scope = FaceScope::of(&remote);
        Self {
            id: AtomicU64::new(FaceId::INVALID.value()),
            local_uri: FaceUri::from_endpoint(protocol, &local),
            remote_uri: FaceUri::from_endpoint(protocol, &remote),
            persistency,
            scope,
            local_fields_enabled: want_local_fields && scope == FaceScope::Local,
            on_receive_interest: Signal::new(),
            on_receive_data: Signal::new(),
            counters: FaceCounters::default(),
            closed: AtomicBool::new(false),
            transport: Mutex::new(None),
        }
    }

    /// Attaches the transport that carries this face's bytes
    pub fn with_transport(self, transport: Box<dyn Transport>) -> Self {
        *self.transport.lock().unwrap_or_else(PoisonError::into_inner) = Some(transport);
        self
    }

    pub fn id(&self) -> FaceId {
        FaceId(self.id.load(Ordering::Acquire))
    }

    pub(crate) fn set_id(&self, id: FaceId) {
        self.id.store(id.value(), Ordering::Release);
    }

    pub fn is_registered(&self) -> bool {
        self.id().is_valid()
    }

    pub fn local_uri(&self) -> &FaceUri {
        &self.local_uri
    }

    pub fn remote_uri(&self) -> &FaceUri {
        &self.remote_uri
    }

    pub fn persistency(&self) -> FacePersistency {
        self.persistency
    }

    pub fn scope(&self) -> FaceScope {
        self.scope
    }

    pub fn is_local_fields_enabled(&self) -> bool {
        self.local_fields_enabled
    }

    pub fn counters(&self) -> &FaceCounters {
        &self.counters
    }

    pub fn has_transport(&self) -> bool {
        self.transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Delivers an interest received from the link to subscribers
    pub fn receive_interest(&self, interest: Interest) {
        self.counters.n_in_interests.fetch_add(1, Ordering::Relaxed);
        self.on_receive_interest.emit(&interest);
    }

    /// Delivers a data packet received from the link to subscribers
    pub fn receive_data(&self, data: Data) {
        self.counters.n_in_data.fetch_add(1, Ordering::Relaxed);
        self.on_receive_data.emit(&data);
    }

    /// True once the face has been closed; a closed face is never reused
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Closes the transport, if any, and marks the face closed for good
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let transport = self
            .transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut transport) = transport {
            transport.close();
        }
    }
}

impl fmt::Debug for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Face")
            .field("id", &self.id())
            .field("local_uri", &self.local_uri.to_string())
            .field("remote_uri", &self.remote_uri.to_string())
            .field("persistency", &self.persistency)
            .field("scope", &self.scope)
            .field("local_fields_enabled", &self.local_fields_enabled)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(remote: &str, want_local_fields: bool) -> Face {
        Face::new(
            "tcp",
            "127.0.0.1:6363".parse().unwrap(),
            remote.parse().unwrap(),
            FacePersistency::Persistent,
            want_local_fields,
        )
    }

    #[test]
    fn test_new_face_is_unregistered() {
        let face = face("192.0.2.1:6363", false);
        assert_eq!(face.id(), FaceId::INVALID);
        assert!(!face.is_registered());
        assert_eq!(face.remote_uri().to_string(), "tcp4://192.0.2.1:6363");
    }

    #[test]
    fn test_scope_follows_remote_address() {
        assert_eq!(face("127.0.0.1:1", false).scope(), FaceScope::Local);
        assert_eq!(face("[::1]:1", false).scope(), FaceScope::Local);
        assert_eq!(face("192.0.2.1:1", false).scope(), FaceScope::NonLocal);
    }

    #[test]
    fn test_local_fields_require_local_scope() {
        assert!(face("127.0.0.1:1", true).is_local_fields_enabled());
        assert!(!face("192.0.2.1:1", true).is_local_fields_enabled());
        assert!(!face("127.0.0.1:1", false).is_local_fields_enabled());
    }

    #[test]
    fn test_receive_counts_and_emits() {
        let face = face("192.0.2.1:6363", false);
        let seen = std::sync::Arc::new(AtomicU64::new(0));
        let s = seen.clone();
        face.on_receive_interest.connect(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

        face.receive_interest(Interest::new("/a", 1));
        face.receive_data(Data::new("/a", vec![1]));

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(face.counters().n_in_interests(), 1);
        assert_eq!(face.counters().n_in_data(), 1);
    }

    #[test]
    fn test_persistency_parsing() {
        assert_eq!(
            "on-demand".parse::<FacePersistency>().unwrap(),
            FacePersistency::OnDemand
        );
        assert_eq!(
            "permanent".parse::<FacePersistency>().unwrap(),
            FacePersistency::Permanent
        );
        assert!("forever".parse::<FacePersistency>().is_err());
        assert_eq!(FacePersistency::OnDemand.to_string(), "on-demand");
    }

    #[derive(Debug)]
    struct FlagTransport(std::sync::Arc<AtomicU64>);

    impl Transport for FlagTransport {
        fn close(&mut self) {
            self.0.store(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_close_releases_transport() {
        let closed = std::sync::Arc::new(AtomicU64::new(0));
        let face = face("192.0.2.1:6363", false).with_transport(Box::new(FlagTransport(closed.clone())));
        assert!(face.has_transport());

        assert!(!face.is_closed());
        face.close();
        assert!(face.is_closed());
        assert!(!face.has_transport());
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
