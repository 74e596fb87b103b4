// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

use clap::Parser;
use facemgr::status::channel_dataset;
use facemgr::{
    CliArgs, ConfigContext, DaemonConfiguration, FaceError, FacePersistency, FaceRequest,
    FaceSystem, FaceTable, FaceTableHandle, FaceUri, Forwarder, StatusReport, spawn_face_table,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    let config = match DaemonConfiguration::from_cli(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("facemgrd: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.log_level);
    config.log_summary();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "facemgrd failed");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over the configured level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn run(config: DaemonConfiguration) -> Result<(), FaceError> {
    let forwarder = Arc::new(Forwarder::new());
    let faces = spawn_face_table(FaceTable::new(forwarder));
    let mut face_system = FaceSystem::with_builtin();

    face_system.process_config(
        config.face_system.as_ref(),
        &ConfigContext::new(config.config_mode(), faces.add_face_sink()),
    )?;
    if config.dry_run {
        info!("configuration is valid");
        return Ok(());
    }

    for uri in config.connect {
        connect(&face_system, &faces, uri).await?;
    }

    if config.print_status {
        let report = StatusReport {
            schemes: face_system.provided_schemes().into_iter().collect(),
            channels: channel_dataset(&face_system.channels()),
            faces: faces.list_faces().await?,
        };
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => warn!(error = %e, "cannot render status"),
        }
    }

    info!("facemgrd running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    face_system.shutdown();
    Ok(())
}

/// Opens a persistent face to `uri` and registers it
async fn connect(
    face_system: &FaceSystem,
    faces: &FaceTableHandle,
    uri: FaceUri,
) -> Result<(), FaceError> {
    if !uri.is_canonical() {
        warn!(remote = %uri, "skipping non-canonical remote URI");
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let tx_failed = tx.clone();
    face_system.create_face(
        FaceRequest::new(uri.clone(), FacePersistency::Persistent),
        Box::new(move |face| {
            let _ = tx.send(Ok(face));
        }),
        Box::new(move |failure| {
            let _ = tx_failed.send(Err(failure));
        }),
    )?;

    match rx.recv().await {
        Some(Ok(face)) if face.is_registered() => {
            info!(remote = %uri, face_id = %face.id(), "face already exists");
        }
        Some(Ok(face)) => {
            let face_id = faces.add_face(face).await?;
            info!(remote = %uri, face_id = %face_id, "face created");
        }
        Some(Err(failure)) => warn!(remote = %uri, %failure, "cannot create face"),
        None => warn!(remote = %uri, "face creation abandoned"),
    }
    Ok(())
}
