// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Face and channel datasets for management introspection

use crate::channel::Channel;
use crate::face::{Face, FaceId, FacePersistency, FaceScope};
use crate::face_table::FaceTable;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One row of the face dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceStatus {
    pub face_id: FaceId,
    pub remote_uri: String,
    pub local_uri: String,
    pub persistency: FacePersistency,
    pub scope: FaceScope,
    pub local_fields_enabled: bool,
    pub n_in_interests: u64,
    pub n_in_data: u64,
}

impl FaceStatus {
    pub fn from_face(face: &Face) -> Self {
        Self {
            face_id: face.id(),
            remote_uri: face.remote_uri().to_string(),
            local_uri: face.local_uri().to_string(),
            persistency: face.persistency(),
            scope: face.scope(),
            local_fields_enabled: face.is_local_fields_enabled(),
            n_in_interests: face.counters().n_in_interests(),
            n_in_data: face.counters().n_in_data(),
        }
    }
}

/// One row of the channel dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStatus {
    pub local_uri: String,
    pub listening: bool,
    pub size: usize,
}

impl ChannelStatus {
    pub fn from_channel(channel: &dyn Channel) -> Self {
        Self {
            local_uri: channel.uri().to_string(),
            listening: channel.is_listening(),
            size: channel.size(),
        }
    }
}

/// Face dataset ordered by face id
pub fn face_dataset(table: &FaceTable) -> Vec<FaceStatus> {
    let mut faces: Vec<FaceStatus> = table
        .iter()
        .map(|face| FaceStatus::from_face(face))
        .collect();
    faces.sort_by_key(|status| status.face_id);
    faces
}

/// Channel dataset ordered by local URI
pub fn channel_dataset(channels: &[Arc<dyn Channel>]) -> Vec<ChannelStatus> {
    let mut rows: Vec<ChannelStatus> = channels
        .iter()
        .map(|channel| ChannelStatus::from_channel(channel.as_ref()))
        .collect();
    rows.sort_by(|a, b| a.local_uri.cmp(&b.local_uri));
    rows
}

/// Snapshot printed by `facemgrd --status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub schemes: Vec<String>,
    pub channels: Vec<ChannelStatus>,
    pub faces: Vec<FaceStatus>,
}

impl StatusReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forwarder::Forwarder;
    use crate::packet::Interest;
    use crate::tcp::TcpChannel;

    #[test]
    fn test_face_dataset() {
        let mut table = FaceTable::new(Arc::new(Forwarder::new()));
        let face = Arc::new(Face::new(
            "tcp",
            "127.0.0.1:6363".parse().unwrap(),
            "127.0.0.1:50000".parse().unwrap(),
            FacePersistency::OnDemand,
            true,
        ));
        let id = table.add(face.clone()).unwrap();
        face.receive_interest(Interest::new("/x", 7));

        let rows = face_dataset(&table);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].face_id, id);
        assert_eq!(rows[0].remote_uri, "tcp4://127.0.0.1:50000");
        assert_eq!(rows[0].scope, FaceScope::Local);
        assert!(rows[0].local_fields_enabled);
        assert_eq!(rows[0].n_in_interests, 1);
    }

    #[test]
    fn test_report_json() {
        let channels: Vec<Arc<dyn Channel>> = vec![
            Arc::new(TcpChannel::new("[::]:6363".parse().unwrap())),
            Arc::new(TcpChannel::new("0.0.0.0:6363".parse().unwrap())),
        ];
        let report = StatusReport {
            schemes: vec!["tcp".into(), "tcp4".into(), "tcp6".into()],
            channels: channel_dataset(&channels),
            faces: Vec::new(),
        };
        assert_eq!(report.channels[0].local_uri, "tcp4://0.0.0.0:6363");

        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["channels"][1]["local_uri"], "tcp6://[::]:6363");
        assert_eq!(value["channels"][1]["listening"], false);
    }
}
