// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Face Table
//!
//! Process-wide registry assigning each face its [`FaceId`] and wiring its
//! receive events to the forwarding engine.
//!
//! Ids come from a strictly increasing counter and are never reused, even
//! after the face holding one is removed. A face id is present in the table
//! exactly while the face is registered.

use crate::error::FaceTableError;
use crate::face::{Face, FaceId};
use crate::forwarder::ForwardingEngine;
use crate::signal::{Signal, Subscription};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// A registered face with the subscriptions the table made on it
struct FaceEntry {
    face: Arc<Face>,
    interest_subscription: Subscription,
    data_subscription: Subscription,
}

pub struct FaceTable {
    forwarder: Arc<dyn ForwardingEngine>,
    last_face_id: FaceId,
    faces: HashMap<FaceId, FaceEntry>,
    /// Fired after a face has been registered
    pub after_add: Signal<FaceId>,
    /// Fired before a face is unregistered, while it can still be found
    pub before_remove: Signal<FaceId>,
}

impl FaceTable {
    pub fn new(forwarder: Arc<dyn ForwardingEngine>) -> Self {
        Self {
            forwarder,
            last_face_id: FaceId::INVALID,
            faces: HashMap::new(),
            after_add: Signal::new(),
            before_remove: Signal::new(),
        }
    }

    /// Registers a newly created face
    ///
    /// Assigns the next id, stores the face and subscribes the forwarding
    /// engine to its interest and data events. A face that already carries
    /// an id, or that has been closed, is refused.
    pub fn add(&mut self, face: Arc<Face>) -> Result<FaceId, FaceTableError> {
        if face.is_registered() {
            return Err(FaceTableError::AlreadyRegistered(face.id()));
        }
        if face.is_closed() {
            return Err(FaceTableError::Closed(face.remote_uri().to_string()));
        }

        let face_id = self.last_face_id.next();
        self.last_face_id = face_id;
        face.set_id(face_id);

        let forwarder = self.forwarder.clone();
        let interest_subscription = face
            .on_receive_interest
            .connect(move |interest| forwarder.on_interest(face_id, interest));
        let forwarder = self.forwarder.clone();
        let data_subscription = face
            .on_receive_data
            .connect(move |data| forwarder.on_data(face_id, data));

        info!(
            face_id = %face_id,
            remote = %face.remote_uri(),
            local = %face.local_uri(),
            "addFace"
        );
        self.faces.insert(
            face_id,
            FaceEntry {
                face,
                interest_subscription,
                data_subscription,
            },
        );

        self.after_add.emit(&face_id);
        Ok(face_id)
    }

    /// Unregisters a face
    ///
    /// Resets the face's id to [`FaceId::INVALID`], disconnects every
    /// subscriber from its events (the forwarding engine's and any other),
    /// closes the face and purges it from all FIB next-hop lists. A removed
    /// face can never be added again.
    pub fn remove(&mut self, face_id: FaceId) -> Result<Arc<Face>, FaceTableError> {
        if !self.faces.contains_key(&face_id) {
            return Err(FaceTableError::NotFound(face_id));
        }
        self.before_remove.emit(&face_id);

        let entry = self
            .faces
            .remove(&face_id)
            .ok_or(FaceTableError::NotFound(face_id))?;
        let face = entry.face;
        face.set_id(FaceId::INVALID);
        info!(face_id = %face_id, remote = %face.remote_uri(), "removeFace");

        face.on_receive_interest.disconnect(entry.interest_subscription);
        face.on_receive_data.disconnect(entry.data_subscription);
        // A removed face carries no subscribers at all.
        face.on_receive_interest.disconnect_all();
        face.on_receive_data.disconnect_all();
        face.close();

        self.forwarder.remove_next_hop_from_all_entries(face_id);
        Ok(face)
    }

    pub fn find(&self, face_id: FaceId) -> Option<Arc<Face>> {
        self.faces.get(&face_id).map(|entry| entry.face.clone())
    }

    pub fn contains(&self, face_id: FaceId) -> bool {
        self.faces.contains_key(&face_id)
    }

    /// Registered face ids in ascending order
    pub fn ids(&self) -> Vec<FaceId> {
        let mut ids: Vec<FaceId> = self.faces.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Face>> {
        self.faces.values().map(|entry| &entry.face)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

impl fmt::Debug for FaceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaceTable")
            .field("last_face_id", &self.last_face_id)
            .field("faces", &self.ids())
            .finish()
    }
}
