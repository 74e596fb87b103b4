// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Protocol factories
//!
//! A protocol factory turns its `face_system.<protocol>` configuration
//! section into channels and creates outbound faces for its protocol. One
//! factory instance exists per protocol, built from an explicit
//! [`FactoryRegistry`].

use crate::channel::{AddFaceSink, Channel, FaceCreatedCallback, FaceCreationFailedCallback};
use crate::endpoint::Endpoint;
use crate::error::{ConfigError, FaceError};
use crate::face::FacePersistency;
use crate::face_uri::FaceUri;
use crate::interfaces::NetworkInterfaces;
use crate::tcp_factory::TcpFactory;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use toml::{Table, Value};
use tracing::trace;

/// Whether a configuration pass only validates or also applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    /// Check the configuration without touching channels
    ValidateOnly,
    /// Create channels and start listening as configured
    Apply,
}

/// Per-call configuration context
#[derive(Clone)]
pub struct ConfigContext {
    pub mode: ConfigMode,
    /// Sink for faces accepted by listening channels
    pub add_face: AddFaceSink,
}

impl ConfigContext {
    pub fn new(mode: ConfigMode, add_face: AddFaceSink) -> Self {
        Self { mode, add_face }
    }

    pub fn is_dry_run(&self) -> bool {
        self.mode == ConfigMode::ValidateOnly
    }
}

impl fmt::Debug for ConfigContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigContext")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Outbound face creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceRequest {
    /// Canonical remote URI
    pub remote_uri: FaceUri,
    pub local_uri: Option<FaceUri>,
    pub persistency: FacePersistency,
    pub want_local_fields: bool,
}

impl FaceRequest {
    pub fn new(remote_uri: FaceUri, persistency: FacePersistency) -> Self {
        Self {
            remote_uri,
            local_uri: None,
            persistency,
            want_local_fields: false,
        }
    }

    pub fn with_local_uri(mut self, local_uri: FaceUri) -> Self {
        self.local_uri = Some(local_uri);
        self
    }

    pub fn with_local_fields(mut self, enabled: bool) -> Self {
        self.want_local_fields = enabled;
        self
    }
}

/// Contract implemented once per transport protocol
pub trait ProtocolFactory: Send + fmt::Debug {
    /// Protocol id, also the name of its configuration section
    fn id(&self) -> &'static str;

    /// Applies the protocol's configuration section
    ///
    /// `None` means the section is absent. Every check completes before any
    /// channel is created, so an `Err` leaves the factory unchanged. In
    /// [`ConfigMode::ValidateOnly`] no channel is ever created or modified.
    fn process_config(
        &mut self,
        section: Option<&Table>,
        context: &ConfigContext,
    ) -> Result<(), ConfigError>;

    /// Creates one outbound face
    ///
    /// Policy rejections are reported through `on_failure`. `Err` is only
    /// returned for a remote URI whose host or port cannot be parsed, which
    /// is a caller bug rather than a policy outcome.
    fn create_face(
        &self,
        request: FaceRequest,
        on_created: FaceCreatedCallback,
        on_failure: FaceCreationFailedCallback,
    ) -> Result<(), FaceError>;

    /// Snapshot of the channels owned by this factory
    fn channels(&self) -> Vec<Arc<dyn Channel>>;

    /// URI schemes this factory currently provides
    fn provided_schemes(&self) -> &BTreeSet<String>;
}

/// Endpoints that must never be the remote side of an outbound face
#[derive(Debug, Default, Clone)]
pub struct ProhibitedEndpoints {
    endpoints: HashSet<Endpoint>,
}

impl ProhibitedEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prohibits `endpoint`
    ///
    /// A wildcard endpoint is first expanded to every address of the same
    /// family currently configured on `interfaces`, at the same port. The
    /// wildcard itself is prohibited as well. Interfaces that appear later
    /// are not covered.
    pub fn prohibit(&mut self, endpoint: Endpoint, interfaces: &dyn NetworkInterfaces) {
        if endpoint.is_wildcard() {
            let family = endpoint.family();
            for addr in interfaces.addresses() {
                let concrete = Endpoint::new(addr, endpoint.port());
                if concrete.family() == family && !concrete.is_wildcard() {
                    self.prohibit(concrete, interfaces);
                }
            }
        }

        trace!(endpoint = %endpoint, "prohibiting endpoint");
        self.endpoints.insert(endpoint);
    }

    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.endpoints.contains(endpoint)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }
}

/// Builds a factory using the given interface source
pub type FactoryConstructor = fn(Arc<dyn NetworkInterfaces>) -> Box<dyn ProtocolFactory>;

/// Protocol id to factory constructor, populated explicitly at startup
#[derive(Debug, Default, Clone)]
pub struct FactoryRegistry {
    constructors: BTreeMap<&'static str, FactoryConstructor>,
}

impl FactoryRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every protocol shipped in this crate
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(TcpFactory::ID, build_tcp_factory);
        registry
    }

    pub fn register(&mut self, id: &'static str, constructor: FactoryConstructor) {
        self.constructors.insert(id, constructor);
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }

    /// Instantiates one factory per registered protocol
    pub fn build(
        &self,
        interfaces: Arc<dyn NetworkInterfaces>,
    ) -> BTreeMap<String, Box<dyn ProtocolFactory>> {
        self.constructors
            .iter()
            .map(|(id, construct)| (id.to_string(), construct(interfaces.clone())))
            .collect()
    }
}

fn build_tcp_factory(interfaces: Arc<dyn NetworkInterfaces>) -> Box<dyn ProtocolFactory> {
    Box::new(TcpFactory::new(interfaces))
}

/// Parses a `yes`/`no` option (TOML booleans are accepted too)
pub fn parse_yes_no(value: &Value, section: &str, key: &str) -> Result<bool, ConfigError> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::String(s) if s == "yes" => Ok(true),
        Value::String(s) if s == "no" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("expected 'yes' or 'no', got {}", other),
        }),
    }
}

/// Parses a numeric option given as a TOML integer or a decimal string
pub fn parse_number<T>(value: &Value, section: &str, key: &str) -> Result<T, ConfigError>
where
    T: TryFrom<i64> + FromStr,
{
    let invalid = |reason: String| ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    };
    match value {
        Value::Integer(n) => {
            T::try_from(*n).map_err(|_| invalid(format!("{} is out of range", n)))
        }
        Value::String(s) => s
            .trim()
            .parse::<T>()
            .map_err(|_| invalid(format!("'{}' is not a valid number", s))),
        other => Err(invalid(format!("expected a number, got {}", other))),
    }
}
