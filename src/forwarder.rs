// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Forwarding engine boundary
//!
//! The face table subscribes a [`ForwardingEngine`] to every registered
//! face and asks it to purge next hops when a face is removed. Interest
//! and data processing (PIT, strategies) lives behind this trait.

use crate::face::FaceId;
use crate::fib::Fib;
use crate::packet::{Data, Interest};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

/// Packet-processing entry points consumed by the face table
pub trait ForwardingEngine: Send + Sync {
    /// Handles an interest that arrived on `face`
    fn on_interest(&self, face: FaceId, interest: &Interest);

    /// Handles a data packet that arrived on `face`
    fn on_data(&self, face: FaceId, data: &Data);

    /// Drops `face` from every next-hop list in the forwarding table
    fn remove_next_hop_from_all_entries(&self, face: FaceId);
}

/// Forwarder holding the FIB and inbound packet counters
#[derive(Debug, Default)]
pub struct Forwarder {
    fib: RwLock<Fib>,
    n_in_interests: AtomicU64,
    n_in_data: AtomicU64,
}

impl Forwarder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fib(&self) -> RwLockReadGuard<'_, Fib> {
        self.fib.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn fib_mut(&self) -> RwLockWriteGuard<'_, Fib> {
        self.fib.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn n_in_interests(&self) -> u64 {
        self.n_in_interests.load(Ordering::Relaxed)
    }

    pub fn n_in_data(&self) -> u64 {
        self.n_in_data.load(Ordering::Relaxed)
    }
}

impl ForwardingEngine for Forwarder {
    fn on_interest(&self, face: FaceId, interest: &Interest) {
        self.n_in_interests.fetch_add(1, Ordering::Relaxed);
        trace!(face_id = %face, name = %interest.name, "incoming interest");
    }

    fn on_data(&self, face: FaceId, data: &Data) {
        self.n_in_data.fetch_add(1, Ordering::Relaxed);
        trace!(face_id = %face, name = %data.name, "incoming data");
    }

    fn remove_next_hop_from_all_entries(&self, face: FaceId) {
        let touched = self.fib_mut().remove_next_hop_from_all_entries(face);
        trace!(face_id = %face, entries = touched, "purged next hops");
    }
}
