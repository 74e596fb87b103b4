// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Integration test: inbound TCP connections become registered faces

use facemgr::{
    ConfigContext, ConfigMode, FaceId, FacePersistency, FaceScope, FaceSystem, FaceTable,
    FactoryRegistry, Forwarder, Name, StaticInterfaces, spawn_face_table,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_accepted_connection_is_registered_and_removed() {
    let forwarder = Arc::new(Forwarder::new());
    let faces = spawn_face_table(FaceTable::new(forwarder.clone()));
    let mut face_system = FaceSystem::new(
        &FactoryRegistry::with_builtin(),
        Arc::new(StaticInterfaces::new(vec!["127.0.0.1".parse().unwrap()])),
    );

    let port = free_port();
    let config: toml::Table = toml::from_str(&format!(
        "[tcp]\nlisten = \"yes\"\nport = {}\nenable_v6 = \"no\"",
        port
    ))
    .unwrap();
    face_system
        .process_config(
            Some(&config),
            &ConfigContext::new(ConfigMode::Apply, faces.add_face_sink()),
        )
        .unwrap();

    let mut client = None;
    for _ in 0..100 {
        if let Ok(stream) = TcpStream::connect(("127.0.0.1", port)).await {
            client = Some(stream);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let client = client.expect("channel should accept connections");

    let mut listed = Vec::new();
    for _ in 0..100 {
        listed = faces.list_faces().await.unwrap();
        if !listed.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(listed.len(), 1);
    let status = &listed[0];
    assert_eq!(status.face_id, FaceId::FIRST);
    assert_eq!(status.persistency, FacePersistency::OnDemand);
    assert_eq!(status.scope, FaceScope::Local);
    assert!(!status.local_fields_enabled);
    assert_eq!(
        status.remote_uri,
        format!("tcp4://{}", client.local_addr().unwrap())
    );
    assert_eq!(face_system.channels()[0].size(), 1);

    forwarder
        .fib_mut()
        .add_or_update_next_hop(Name::from("/example"), status.face_id, 10);

    let face = faces.remove_face(status.face_id).await.unwrap();
    assert_eq!(face.id(), FaceId::INVALID);
    assert!(!face.has_transport());
    assert!(face.is_closed());
    assert_eq!(face_system.channels()[0].size(), 0);
    assert!(!forwarder.fib().references(status.face_id));
    assert!(forwarder.fib().is_empty());
    assert_eq!(faces.face_count().await.unwrap(), 0);

    face_system.shutdown();
}
