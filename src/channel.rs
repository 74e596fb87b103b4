// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Channels
//!
//! A channel owns one local endpoint of a transport protocol. It accepts
//! inbound connections and opens outbound ones, handing every resulting
//! face to a callback. Outcomes are delivered asynchronously; a caller that
//! no longer cares simply ignores the callback.

use crate::face::Face;
use crate::face_uri::FaceUri;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Status code: the request violates a face-creation policy
pub const NOT_ACCEPTABLE: u32 = 406;
/// Status code: no channel can satisfy the request, or the connect failed
pub const RESOURCE_UNAVAILABLE: u32 = 504;

/// Reason a face could not be created, as reported to management clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceCreationFailure {
    pub code: u32,
    pub reason: String,
}

impl FaceCreationFailure {
    pub fn new(code: u32, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    pub fn not_acceptable(reason: impl Into<String>) -> Self {
        Self::new(NOT_ACCEPTABLE, reason)
    }

    pub fn resource_unavailable(reason: impl Into<String>) -> Self {
        Self::new(RESOURCE_UNAVAILABLE, reason)
    }
}

impl fmt::Display for FaceCreationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason)
    }
}

/// Invoked once with the face produced by an outbound connect
pub type FaceCreatedCallback = Box<dyn FnOnce(Arc<Face>) + Send>;
/// Invoked once when an outbound face cannot be created
pub type FaceCreationFailedCallback = Box<dyn FnOnce(FaceCreationFailure) + Send>;
/// Receives every face accepted by a listening channel
pub type AddFaceSink = Arc<dyn Fn(Arc<Face>) + Send + Sync>;
/// Receives accept/bind failures of a listening channel
pub type AcceptFailedSink = Arc<dyn Fn(FaceCreationFailure) + Send + Sync>;

/// A listening and/or connecting local transport endpoint
pub trait Channel: Send + Sync + fmt::Debug {
    /// Canonical URI of the local endpoint
    fn uri(&self) -> FaceUri;

    fn is_listening(&self) -> bool;

    /// Number of live faces produced by this channel
    fn size(&self) -> usize;

    /// Stops accepting connections; faces already produced are unaffected
    fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_codes() {
        let f = FaceCreationFailure::not_acceptable("Cannot create multicast TCP faces");
        assert_eq!(f.code, 406);
        assert_eq!(f.to_string(), "406 Cannot create multicast TCP faces");
        assert_eq!(
            FaceCreationFailure::resource_unavailable("x").code,
            RESOURCE_UNAVAILABLE
        );
    }
}
