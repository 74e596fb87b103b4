// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Actor-based components using Tokio
//!
//! The face table is owned by a single actor task. Faces accepted on
//! channel background tasks, and management requests, reach it as
//! messages, so every table mutation happens on one task.

use crate::channel::AddFaceSink;
use crate::error::{FaceError, FaceTableError};
use crate::face::{Face, FaceId};
use crate::face_table::FaceTable;
use crate::status::{FaceStatus, face_dataset};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Default capacity of the face table mailbox
pub const FACE_TABLE_MAILBOX: usize = 64;

/// Messages for face table actor
#[derive(Debug)]
pub enum FaceTableMessage {
    Add {
        face: Arc<Face>,
        /// `None` for faces handed over by a listening channel
        response: Option<mpsc::Sender<Result<FaceId, FaceTableError>>>,
    },
    Remove {
        face_id: FaceId,
        response: mpsc::Sender<Result<Arc<Face>, FaceTableError>>,
    },
    Find {
        face_id: FaceId,
        response: mpsc::Sender<Option<Arc<Face>>>,
    },
    List {
        response: mpsc::Sender<Vec<FaceStatus>>,
    },
    Count {
        response: mpsc::Sender<usize>,
    },
}

/// Face table actor - sole owner of the [`FaceTable`]
pub struct FaceTableActor {
    table: FaceTable,
    receiver: mpsc::Receiver<FaceTableMessage>,
}

impl FaceTableActor {
    pub fn new(table: FaceTable, receiver: mpsc::Receiver<FaceTableMessage>) -> Self {
        Self { table, receiver }
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                FaceTableMessage::Add { face, response } => {
                    let result = self.table.add(face);
                    match response {
                        Some(response) => {
                            let _ = response.send(result).await;
                        }
                        None => {
                            if let Err(e) = result {
                                warn!(error = %e, "cannot register accepted face");
                            }
                        }
                    }
                }
                FaceTableMessage::Remove { face_id, response } => {
                    let result = self.table.remove(face_id);
                    let _ = response.send(result).await;
                }
                FaceTableMessage::Find { face_id, response } => {
                    let _ = response.send(self.table.find(face_id)).await;
                }
                FaceTableMessage::List { response } => {
                    let _ = response.send(face_dataset(&self.table)).await;
                }
                FaceTableMessage::Count { response } => {
                    let _ = response.send(self.table.len()).await;
                }
            }
        }
        debug!(faces = self.table.len(), "face table actor stopped");
    }
}

/// Actor handle for sending messages to an actor
pub struct ActorHandle<T> {
    sender: mpsc::Sender<T>,
}

impl<T> Clone for ActorHandle<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> ActorHandle<T> {
    pub fn new(sender: mpsc::Sender<T>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, msg: T) -> Result<(), FaceError> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| FaceError::ActorClosed)
    }
}

pub type FaceTableHandle = ActorHandle<FaceTableMessage>;

/// Spawns a face table actor on the current runtime
pub fn spawn_face_table(table: FaceTable) -> FaceTableHandle {
    let (tx, rx) = mpsc::channel(FACE_TABLE_MAILBOX);
    let actor = FaceTableActor::new(table, rx);
    tokio::spawn(async move {
        actor.run().await;
    });
    FaceTableHandle::new(tx)
}

async fn request<R>(
    handle: &FaceTableHandle,
    build: impl FnOnce(mpsc::Sender<R>) -> FaceTableMessage,
) -> Result<R, FaceError> {
    let (resp_tx, mut resp_rx) = mpsc::channel(1);
    handle.send(build(resp_tx)).await?;
    resp_rx.recv().await.ok_or(FaceError::ActorClosed)
}

impl ActorHandle<FaceTableMessage> {
    pub async fn add_face(&self, face: Arc<Face>) -> Result<FaceId, FaceError> {
        let result = request(self, |response| FaceTableMessage::Add {
            face,
            response: Some(response),
        })
        .await?;
        Ok(result?)
    }

    pub async fn remove_face(&self, face_id: FaceId) -> Result<Arc<Face>, FaceError> {
        let result =
            request(self, |response| FaceTableMessage::Remove { face_id, response }).await?;
        Ok(result?)
    }

    pub async fn find_face(&self, face_id: FaceId) -> Result<Option<Arc<Face>>, FaceError> {
        request(self, |response| FaceTableMessage::Find { face_id, response }).await
    }

    pub async fn list_faces(&self) -> Result<Vec<FaceStatus>, FaceError> {
        request(self, |response| FaceTableMessage::List { response }).await
    }

    pub async fn face_count(&self) -> Result<usize, FaceError> {
        request(self, |response| FaceTableMessage::Count { response }).await
    }

    /// Sink that forwards accepted faces into this actor
    ///
    /// Must be invoked from within a Tokio runtime; faces delivered
    /// elsewhere are dropped with a warning.
    pub fn add_face_sink(&self) -> AddFaceSink {
        let handle = self.clone();
        Arc::new(move |face: Arc<Face>| {
            let handle = handle.clone();
            match Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn(async move {
                        if let Err(e) = handle
                            .send(FaceTableMessage::Add {
                                face,
                                response: None,
                            })
                            .await
                        {
                            warn!(error = %e, "cannot hand face to face table");
                        }
                    });
                }
                Err(e) => warn!(
                    remote = %face.remote_uri(),
                    error = %e,
                    "dropping face delivered outside a runtime"
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::FacePersistency;
    use crate::forwarder::Forwarder;
    use std::time::Duration;

    fn new_face(port: u16) -> Arc<Face> {
        Arc::new(Face::new(
            "tcp",
            "127.0.0.1:6363".parse().unwrap(),
            crate::endpoint::Endpoint::new("127.0.0.1".parse().unwrap(), port),
            FacePersistency::Persistent,
            false,
        ))
    }

    #[tokio::test]
    async fn test_face_table_actor_add_and_remove() {
        let (tx, rx) = mpsc::channel(32);
        let actor = FaceTableActor::new(FaceTable::new(Arc::new(Forwarder::new())), rx);

        tokio::spawn(async move {
            actor.run().await;
        });

        let handle = FaceTableHandle::new(tx);

        let face = new_face(50001);
        let id = handle.add_face(face.clone()).await.unwrap();
        assert_eq!(id, FaceId::FIRST);
        assert_eq!(face.id(), id);
        assert_eq!(handle.face_count().await.unwrap(), 1);

        let found = handle.find_face(id).await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&found, &face));

        let removed = handle.remove_face(id).await.unwrap();
        assert!(Arc::ptr_eq(&removed, &face));
        assert_eq!(face.id(), FaceId::INVALID);
        assert!(handle.find_face(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_face_table_actor_reports_table_errors() {
        let handle = spawn_face_table(FaceTable::new(Arc::new(Forwarder::new())));

        let face = new_face(50002);
        handle.add_face(face.clone()).await.unwrap();
        let err = handle.add_face(face).await.unwrap_err();
        assert!(matches!(
            err,
            FaceError::FaceTable(FaceTableError::AlreadyRegistered(_))
        ));

        let err = handle.remove_face(FaceId::new(99)).await.unwrap_err();
        assert!(matches!(err, FaceError::FaceTable(FaceTableError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_face_sink_registers_face() {
        let handle = spawn_face_table(FaceTable::new(Arc::new(Forwarder::new())));
        let sink = handle.add_face_sink();

        sink(new_face(50003));
        sink(new_face(50004));

        let mut listed = Vec::new();
        for _ in 0..50 {
            listed = handle.list_faces().await.unwrap();
            if listed.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(listed.len(), 2);
        assert!(listed[0].face_id < listed[1].face_id);
    }

    #[tokio::test]
    async fn test_handle_reports_closed_actor() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = FaceTableHandle::new(tx);
        assert!(matches!(
            handle.face_count().await,
            Err(FaceError::ActorClosed)
        ));
    }
}
