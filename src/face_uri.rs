// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Face URIs
//!
//! A face URI names one side of a face, e.g. `tcp4://192.0.2.1:6363` or
//! `tcp6://[2001:db8::1]:6363`. Only the `scheme://host:port` shape used by
//! IP-based unicast transports is supported.

use crate::endpoint::Endpoint;
use crate::error::FaceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// A parsed face URI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceUri {
    scheme: String,
    host: String,
    port: String,
}

impl FaceUri {
    /// Builds the canonical URI for `endpoint` under `protocol`
    /// (e.g. `tcp` + `192.0.2.1:6363` gives `tcp4://192.0.2.1:6363`)
    pub fn from_endpoint(protocol: &str, endpoint: &Endpoint) -> Self {
        Self {
            scheme: format!("{}{}", protocol, endpoint.family().scheme_suffix()),
            host: endpoint.addr().to_string(),
            port: endpoint.port().to_string(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host without IPv6 brackets
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// Scheme with any trailing address-family digit removed (`tcp4` -> `tcp`)
    pub fn protocol(&self) -> &str {
        self.scheme.trim_end_matches(['4', '6'])
    }

    /// A canonical URI carries a family-specific scheme, an IP literal of that
    /// family in its normal textual form, and a numeric port.
    pub fn is_canonical(&self) -> bool {
        if self.port.parse::<u16>().is_err() {
            return false;
        }
        if self.scheme.ends_with('4') {
            self.host
                .parse::<Ipv4Addr>()
                .is_ok_and(|ip| ip.to_string() == self.host)
        } else if self.scheme.ends_with('6') {
            self.host
                .parse::<Ipv6Addr>()
                .is_ok_and(|ip| ip.to_string() == self.host && ip.to_ipv4_mapped().is_none())
        } else {
            false
        }
    }

    /// Resolves host and port into an endpoint
    ///
    /// Only IP literals are accepted; no name lookup is performed.
    pub fn to_endpoint(&self) -> Result<Endpoint, FaceError> {
        let addr: IpAddr = self
            .host
            .parse()
            .map_err(|e| FaceError::InvalidEndpoint(format!("host '{}': {}", self.host, e)))?;
        let port: u16 = self
            .port
            .parse()
            .map_err(|e| FaceError::InvalidEndpoint(format!("port '{}': {}", self.port, e)))?;
        Ok(Endpoint::new(addr, port))
    }
}

impl FromStr for FaceUri {
    type Err = FaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| FaceError::InvalidUri(format!("missing scheme in '{}'", s)))?;
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+') {
            return Err(FaceError::InvalidUri(format!("bad scheme in '{}'", s)));
        }
        let authority = rest.trim_end_matches('/');

        let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
            let (host, after) = bracketed
                .split_once(']')
                .ok_or_else(|| FaceError::InvalidUri(format!("unterminated '[' in '{}'", s)))?;
            let port = match after {
                "" => "",
                p => p
                    .strip_prefix(':')
                    .ok_or_else(|| FaceError::InvalidUri(format!("bad port in '{}'", s)))?,
            };
            (host, port)
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, port),
                None => (authority, ""),
            }
        };

        if host.is_empty() {
            return Err(FaceError::InvalidUri(format!("missing host in '{}'", s)));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            port: port.to_string(),
        })
    }
}

impl fmt::Display for FaceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host_is_v6 = self.host.contains(':');
        match (host_is_v6, self.port.is_empty()) {
            (true, true) => write!(f, "{}://[{}]", self.scheme, self.host),
            (true, false) => write!(f, "{}://[{}]:{}", self.scheme, self.host, self.port),
            (false, true) => write!(f, "{}://{}", self.scheme, self.host),
            (false, false) => write!(f, "{}://{}:{}", self.scheme, self.host, self.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_v4() {
        let uri: FaceUri = "tcp4://192.0.2.1:6363".parse().unwrap();
        assert_eq!(uri.scheme(), "tcp4");
        assert_eq!(uri.host(), "192.0.2.1");
        assert_eq!(uri.port(), "6363");
        assert_eq!(uri.protocol(), "tcp");
        assert!(uri.is_canonical());
        assert_eq!(uri.to_string(), "tcp4://192.0.2.1:6363");
    }

    #[test]
    fn test_parse_v6() {
        let uri: FaceUri = "tcp6://[2001:db8::1]:6363".parse().unwrap();
        assert_eq!(uri.host(), "2001:db8::1");
        assert!(uri.is_canonical());
        assert_eq!(uri.to_string(), "tcp6://[2001:db8::1]:6363");
        assert!(uri.to_endpoint().unwrap().is_v6());
    }

    #[test]
    fn test_non_canonical() {
        let no_port: FaceUri = "tcp4://192.0.2.1".parse().unwrap();
        assert!(!no_port.is_canonical());

        let wrong_family: FaceUri = "tcp6://192.0.2.1:6363".parse().unwrap();
        assert!(!wrong_family.is_canonical());

        let hostname: FaceUri = "tcp://example.net:6363".parse().unwrap();
        assert!(!hostname.is_canonical());
        assert!(hostname.to_endpoint().is_err());
    }

    #[test]
    fn test_from_endpoint() {
        let endpoint: Endpoint = "[::1]:6363".parse().unwrap();
        let uri = FaceUri::from_endpoint("tcp", &endpoint);
        assert_eq!(uri.to_string(), "tcp6://[::1]:6363");
        assert_eq!(uri.to_endpoint().unwrap(), endpoint);
    }

    #[test]
    fn test_malformed() {
        assert!("192.0.2.1:6363".parse::<FaceUri>().is_err());
        assert!("tcp4://".parse::<FaceUri>().is_err());
        assert!("tcp6://[::1".parse::<FaceUri>().is_err());
    }
}
