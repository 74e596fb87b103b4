// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! TCP protocol factory
//!
//! Configuration section:
//!
//! ```toml
//! [face_system.tcp]
//! listen = "yes"     # accept inbound connections
//! port = 6363        # port of every enabled channel
//! enable_v4 = "yes"  # IPv4 channel on 0.0.0.0
//! enable_v6 = "yes"  # IPv6 channel on [::]
//! ```
//!
//! Outbound face requests pass a fixed sequence of checks before a channel
//! is asked to connect; the first failing check decides the reported
//! status code and reason.

use crate::channel::{
    Channel, FaceCreatedCallback, FaceCreationFailedCallback, FaceCreationFailure,
};
use crate::endpoint::{AddressFamily, Endpoint};
use crate::error::{ConfigError, FaceError};
use crate::face::FacePersistency;
use crate::factory::{
    ConfigContext, FaceRequest, ProhibitedEndpoints, ProtocolFactory, parse_number, parse_yes_no,
};
use crate::interfaces::NetworkInterfaces;
use crate::tcp::{TCP_PROTOCOL, TcpChannel};
use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use std::sync::Arc;
use toml::Table;
use tracing::{debug, trace, warn};

/// Port used when the configuration does not name one
pub const DEFAULT_TCP_PORT: u16 = 6363;

const SECTION: &str = "face_system.tcp";

/// Validated `face_system.tcp` options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpConfig {
    pub listen: bool,
    pub port: u16,
    pub enable_v4: bool,
    pub enable_v6: bool,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            listen: true,
            port: DEFAULT_TCP_PORT,
            enable_v4: true,
            enable_v6: true,
        }
    }
}

impl TcpConfig {
    /// Parses and validates a configuration section
    pub fn from_section(section: &Table) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (key, value) in section {
            match key.as_str() {
                "listen" => config.listen = parse_yes_no(value, SECTION, key)?,
                "port" => config.port = parse_number(value, SECTION, key)?,
                "enable_v4" => config.enable_v4 = parse_yes_no(value, SECTION, key)?,
                "enable_v6" => config.enable_v6 = parse_yes_no(value, SECTION, key)?,
                _ => {
                    return Err(ConfigError::UnrecognizedOption {
                        section: SECTION.to_string(),
                        key: key.clone(),
                    });
                }
            }
        }

        if !config.enable_v4 && !config.enable_v6 {
            return Err(ConfigError::NoChannelEnabled {
                protocol: "TCP".to_string(),
                section: TCP_PROTOCOL.to_string(),
            });
        }

        Ok(config)
    }

    fn enabled(&self, family: AddressFamily) -> bool {
        match family {
            AddressFamily::V4 => self.enable_v4,
            AddressFamily::V6 => self.enable_v6,
        }
    }
}

/// Factory for TCP channels and faces
#[derive(Debug)]
pub struct TcpFactory {
    interfaces: Arc<dyn NetworkInterfaces>,
    channels: BTreeMap<Endpoint, Arc<TcpChannel>>,
    prohibited: ProhibitedEndpoints,
    provided_schemes: BTreeSet<String>,
}

impl TcpFactory {
    pub const ID: &'static str = TCP_PROTOCOL;

    pub fn new(interfaces: Arc<dyn NetworkInterfaces>) -> Self {
        Self {
            interfaces,
            channels: BTreeMap::new(),
            prohibited: ProhibitedEndpoints::new(),
            provided_schemes: BTreeSet::new(),
        }
    }

    /// Returns the channel at `endpoint`, creating it if needed
    ///
    /// A new channel's endpoint is prohibited as a remote target so the
    /// daemon never connects to itself.
    pub fn create_channel(&mut self, endpoint: Endpoint) -> Arc<TcpChannel> {
        if let Some(channel) = self.find_channel(&endpoint) {
            return channel;
        }

        let channel = Arc::new(TcpChannel::new(endpoint));
        self.channels.insert(endpoint, channel.clone());
        self.prohibit_endpoint(endpoint);
        debug!(local = %endpoint, "created TCP channel");
        channel
    }

    /// [`TcpFactory::create_channel`] from textual address and port
    pub fn create_channel_from_strings(
        &mut self,
        local_ip: &str,
        local_port: &str,
    ) -> Result<Arc<TcpChannel>, FaceError> {
        let addr: IpAddr = local_ip
            .parse()
            .map_err(|e| FaceError::InvalidEndpoint(format!("address '{}': {}", local_ip, e)))?;
        let port: u16 = local_port
            .parse()
            .map_err(|e| FaceError::InvalidEndpoint(format!("port '{}': {}", local_port, e)))?;
        Ok(self.create_channel(Endpoint::new(addr, port)))
    }

    pub fn find_channel(&self, endpoint: &Endpoint) -> Option<Arc<TcpChannel>> {
        self.channels.get(endpoint).cloned()
    }

    /// Prohibits `endpoint` (expanding wildcards) as an outbound target
    pub fn prohibit_endpoint(&mut self, endpoint: Endpoint) {
        self.prohibited.prohibit(endpoint, self.interfaces.as_ref());
    }

    pub fn prohibited_endpoints(&self) -> &ProhibitedEndpoints {
        &self.prohibited
    }
}

impl ProtocolFactory for TcpFactory {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn process_config(
        &mut self,
        section: Option<&Table>,
        context: &ConfigContext,
    ) -> Result<(), ConfigError> {
        let Some(section) = section else {
            if !context.is_dry_run() && !self.channels.is_empty() {
                warn!("Cannot disable tcp4 and tcp6 channels after initialization");
            }
            return Ok(());
        };

        let config = TcpConfig::from_section(section)?;
        if context.is_dry_run() {
            return Ok(());
        }

        let mut schemes = vec![TCP_PROTOCOL.to_string()];
        for family in [AddressFamily::V4, AddressFamily::V6] {
            let scheme = format!("{}{}", TCP_PROTOCOL, family.scheme_suffix());
            if config.enabled(family) {
                let channel = self.create_channel(Endpoint::wildcard(family, config.port));
                if config.listen && !channel.is_listening() {
                    channel
                        .listen(context.add_face.clone(), None)
                        .map_err(|e| ConfigError::ChannelListen {
                            endpoint: channel.uri().to_string(),
                            reason: e.to_string(),
                        })?;
                }
                schemes.push(scheme);
            } else if self.provided_schemes.contains(&scheme) {
                warn!("Cannot close {} channel after its creation", scheme);
            }
        }
        // Schemes are published only once every channel is up
        self.provided_schemes.extend(schemes);

        Ok(())
    }

    fn create_face(
        &self,
        request: FaceRequest,
        on_created: FaceCreatedCallback,
        on_failure: FaceCreationFailedCallback,
    ) -> Result<(), FaceError> {
        if request.local_uri.is_some() {
            trace!("Cannot create unicast TCP face with LocalUri");
            on_failure(FaceCreationFailure::not_acceptable(
                "Unicast TCP faces cannot be created with a LocalUri",
            ));
            return Ok(());
        }

        if request.persistency == FacePersistency::OnDemand {
            trace!("createFace does not support FACE_PERSISTENCY_ON_DEMAND");
            on_failure(FaceCreationFailure::not_acceptable(
                "Outgoing TCP faces do not support on-demand persistency",
            ));
            return Ok(());
        }

        let endpoint = request.remote_uri.to_endpoint()?;

        if endpoint.is_multicast() {
            trace!("createFace does not support multicast faces");
            on_failure(FaceCreationFailure::not_acceptable(
                "Cannot create multicast TCP faces",
            ));
            return Ok(());
        }

        if self.prohibited.contains(&endpoint) {
            trace!(
                "Requested endpoint is prohibited \
                 (reserved by this daemon or disallowed by face management protocol)"
            );
            on_failure(FaceCreationFailure::not_acceptable(
                "Requested endpoint is prohibited",
            ));
            return Ok(());
        }

        if request.want_local_fields && !endpoint.is_loopback() {
            trace!("createFace cannot create non-local face with local fields enabled");
            on_failure(FaceCreationFailure::not_acceptable(
                "Local fields can only be enabled on faces with local scope",
            ));
            return Ok(());
        }

        // First channel of the same address family wins.
        let channel = self
            .channels
            .iter()
            .find(|(local, _)| local.family() == endpoint.family())
            .map(|(_, channel)| channel);

        match channel {
            Some(channel) => channel.connect(
                endpoint,
                request.persistency,
                request.want_local_fields,
                on_created,
                on_failure,
            ),
            None => {
                trace!("No channels available to connect to {}", endpoint);
                on_failure(FaceCreationFailure::resource_unavailable(
                    "No channels available to connect",
                ));
            }
        }
        Ok(())
    }

    fn channels(&self) -> Vec<Arc<dyn Channel>> {
        self.channels
            .values()
            .map(|channel| channel.clone() as Arc<dyn Channel>)
            .collect()
    }

    fn provided_schemes(&self) -> &BTreeSet<String> {
        &self.provided_schemes
    }
}
