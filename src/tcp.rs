// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! TCP channels
//!
//! A [`TcpChannel`] owns one local TCP endpoint. `listen` accepts inbound
//! connections on a background task and turns each one into an on-demand
//! face; `connect` opens an outbound connection and produces a face with
//! the requested persistency.
//!
//! The channel remembers the faces it produced by remote endpoint, holding
//! only weak references: a connection to a peer that already has a live
//! face hands back that face instead of creating a second one.

use crate::channel::{
    AcceptFailedSink, AddFaceSink, Channel, FaceCreatedCallback, FaceCreationFailedCallback,
    FaceCreationFailure,
};
use crate::endpoint::Endpoint;
use crate::face::{Face, FacePersistency, Transport};
use crate::face_uri::FaceUri;
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Scheme prefix of TCP face URIs
pub const TCP_PROTOCOL: &str = "tcp";

const LISTEN_BACKLOG: i32 = 128;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

/// Link carried by a TCP face
#[derive(Debug)]
pub struct TcpTransport {
    local: Endpoint,
    remote: Endpoint,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(local: Endpoint, remote: Endpoint, stream: TcpStream) -> Self {
        Self {
            local,
            remote,
            stream: Some(stream),
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Transport for TcpTransport {
    fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!(local = %self.local, remote = %self.remote, "closed TCP transport");
        }
    }
}

type ChannelFaces = Arc<Mutex<HashMap<Endpoint, Weak<Face>>>>;

fn lock_faces(faces: &ChannelFaces) -> MutexGuard<'_, HashMap<Endpoint, Weak<Face>>> {
    faces.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A face that is still alive and not closed
fn usable(weak: &Weak<Face>) -> Option<Arc<Face>> {
    weak.upgrade().filter(|face| !face.is_closed())
}

/// Returns the live face to `remote`, or wraps `stream` in a new one
fn find_or_create_face(
    faces: &ChannelFaces,
    stream: TcpStream,
    remote: Endpoint,
    persistency: FacePersistency,
    want_local_fields: bool,
) -> io::Result<Arc<Face>> {
    let mut faces = lock_faces(faces);
    if let Some(face) = faces.get(&remote).and_then(usable) {
        debug!(remote = %remote, "reusing existing TCP face");
        return Ok(face);
    }

    let local = Endpoint::from(stream.local_addr()?);
    let face = Arc::new(
        Face::new(TCP_PROTOCOL, local, remote, persistency, want_local_fields)
            .with_transport(Box::new(TcpTransport::new(local, remote, stream))),
    );
    faces.retain(|_, weak| usable(weak).is_some());
    faces.insert(remote, Arc::downgrade(&face));
    Ok(face)
}

fn bind_listener(endpoint: Endpoint) -> io::Result<TcpListener> {
    let addr = endpoint.socket_addr();
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    if endpoint.is_v6() {
        // Keep the v6 wildcard from also claiming the v4 port.
        socket.set_only_v6(true)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    socket.set_nonblocking(true)?;
    TcpListener::from_std(socket.into())
}

/// Channel over one local TCP endpoint
#[derive(Debug)]
pub struct TcpChannel {
    local: Endpoint,
    listening: Arc<AtomicBool>,
    faces: ChannelFaces,
    shutdown: CancellationToken,
    connect_timeout: Duration,
}

impl TcpChannel {
    pub fn new(local: Endpoint) -> Self {
        Self {
            local,
            listening: Arc::new(AtomicBool::new(false)),
            faces: Arc::new(Mutex::new(HashMap::new())),
            shutdown: CancellationToken::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn local_endpoint(&self) -> Endpoint {
        self.local
    }

    /// Starts accepting inbound connections
    ///
    /// The socket is bound before returning, so a port already in use is
    /// reported here. Every accepted connection then becomes an on-demand
    /// face passed to `on_face_created`; accept errors go to
    /// `on_accept_failed`. Calling `listen` on a listening channel does
    /// nothing. Must be called from within a Tokio runtime.
    pub fn listen(
        &self,
        on_face_created: AddFaceSink,
        on_accept_failed: Option<AcceptFailedSink>,
    ) -> io::Result<()> {
        if self.listening.swap(true, Ordering::SeqCst) {
            warn!(local = %self.local, "TCP channel is already listening");
            return Ok(());
        }

        let listener = match Handle::try_current()
            .map_err(io::Error::other)
            .and_then(|runtime| {
                let _guard = runtime.enter();
                bind_listener(self.local).map(|listener| (runtime, listener))
            }) {
            Ok(bound) => bound,
            Err(e) => {
                self.listening.store(false, Ordering::SeqCst);
                error!(local = %self.local, error = %e, "cannot bind TCP channel");
                return Err(e);
            }
        };
        let (runtime, listener) = listener;
        info!(local = %self.local, "TCP channel listening");

        let local = self.local;
        let listening = self.listening.clone();
        let faces = self.faces.clone();
        let shutdown = self.shutdown.clone();

        runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    accepted = listener.accept() => match accepted {
                        Ok((stream, peer)) => {
                            let remote = Endpoint::from(peer);
                            match find_or_create_face(
                                &faces,
                                stream,
                                remote,
                                FacePersistency::OnDemand,
                                false,
                            ) {
                                Ok(face) => {
                                    debug!(local = %local, remote = %remote, "accepted TCP connection");
                                    on_face_created(face);
                                }
                                Err(e) => warn!(remote = %remote, error = %e, "cannot create face"),
                            }
                        }
                        Err(e) => {
                            warn!(local = %local, error = %e, "accept failed");
                            if let Some(on_failed) = &on_accept_failed {
                                on_failed(FaceCreationFailure::resource_unavailable(format!(
                                    "Accept failed: {}",
                                    e
                                )));
                            }
                        }
                    }
                }
            }
            listening.store(false, Ordering::SeqCst);
            debug!(local = %local, "TCP channel stopped listening");
        });
        Ok(())
    }

    /// Opens an outbound connection to `remote`
    ///
    /// The outcome is delivered on the runtime: `on_created` with the face,
    /// or `on_failure` with code 504 if the connection fails or times out.
    pub fn connect(
        &self,
        remote: Endpoint,
        persistency: FacePersistency,
        want_local_fields: bool,
        on_created: FaceCreatedCallback,
        on_failure: FaceCreationFailedCallback,
    ) {
        if let Some(face) = lock_faces(&self.faces).get(&remote).and_then(usable) {
            debug!(remote = %remote, "face to remote already exists");
            on_created(face);
            return;
        }

        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                on_failure(FaceCreationFailure::resource_unavailable(format!(
                    "Cannot connect without a runtime: {}",
                    e
                )));
                return;
            }
        };

        let faces = self.faces.clone();
        let timeout = self.connect_timeout;
        debug!(local = %self.local, remote = %remote, "connecting");

        runtime.spawn(async move {
            let connected =
                tokio::time::timeout(timeout, TcpStream::connect(remote.socket_addr())).await;
            let stream = match connected {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    debug!(remote = %remote, error = %e, "connect failed");
                    on_failure(FaceCreationFailure::resource_unavailable(format!(
                        "Connection failed: {}",
                        e
                    )));
                    return;
                }
                Err(_) => {
                    debug!(remote = %remote, "connect timed out");
                    on_failure(FaceCreationFailure::resource_unavailable(
                        "Connection timed out",
                    ));
                    return;
                }
            };

            match find_or_create_face(&faces, stream, remote, persistency, want_local_fields) {
                Ok(face) => on_created(face),
                Err(e) => on_failure(FaceCreationFailure::resource_unavailable(format!(
                    "Connection failed: {}",
                    e
                ))),
            }
        });
    }
}

impl Channel for TcpChannel {
    fn uri(&self) -> FaceUri {
        FaceUri::from_endpoint(TCP_PROTOCOL, &self.local)
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    fn size(&self) -> usize {
        lock_faces(&self.faces)
            .values()
            .filter(|weak| usable(weak).is_some())
            .count()
    }

    fn close(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for TcpChannel {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
