// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Configuration management for the face manager daemon
//!
//! Supports both command-line arguments and a TOML configuration file.
//! The `face_system` table is kept as raw TOML: each protocol factory
//! validates its own section.

use crate::error::ConfigError;
use crate::face_uri::FaceUri;
use crate::factory::ConfigMode;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use toml::Table;
use tracing::info;

/// Command-line arguments for the daemon
#[derive(Parser, Debug)]
#[command(name = "facemgrd")]
#[command(author = "facemgr Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Face management daemon", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Validate the configuration and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Log level or filter directive (overrides the config file)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Print face and channel status as JSON once configured
    #[arg(long)]
    pub status: bool,

    /// Remote URIs to open persistent faces to (e.g., "tcp4://192.0.2.1:6363")
    #[arg(long, value_name = "URI", value_delimiter = ',')]
    pub connect: Vec<FaceUri>,
}

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub log: LogConfig,
    /// Protocol sections, keyed by factory id
    #[serde(default)]
    pub face_system: Option<Table>,
}

/// Log section of config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Resolved daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfiguration {
    pub source: Option<PathBuf>,
    pub log_level: String,
    pub face_system: Option<Table>,
    pub dry_run: bool,
    pub print_status: bool,
    pub connect: Vec<FaceUri>,
}

impl DaemonConfiguration {
    /// Creates configuration from command-line arguments
    pub fn from_cli(args: CliArgs) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        Ok(Self {
            source: args.config,
            log_level: args.log_level.unwrap_or(file.log.level),
            face_system: file.face_system,
            dry_run: args.dry_run,
            print_status: args.status,
            connect: args.connect,
        })
    }

    /// Mode of the single configuration pass at startup
    pub fn config_mode(&self) -> ConfigMode {
        if self.dry_run {
            ConfigMode::ValidateOnly
        } else {
            ConfigMode::Apply
        }
    }

    /// Logs a configuration summary
    pub fn log_summary(&self) {
        let protocols: Vec<&str> = self
            .face_system
            .as_ref()
            .map(|t| t.keys().map(String::as_str).collect())
            .unwrap_or_default();
        info!(
            source = ?self.source,
            log_level = %self.log_level,
            protocols = ?protocols,
            dry_run = self.dry_run,
            "configuration loaded"
        );
    }
}

impl TomlConfig {
    /// Loads configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[log]
level = "debug"

[face_system.tcp]
listen = "yes"
port = 6363
enable_v6 = "no"
"#;

    #[test]
    fn test_parse_sample() {
        let config = TomlConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.log.level, "debug");
        let face_system = config.face_system.unwrap();
        let tcp = face_system["tcp"].as_table().unwrap();
        assert_eq!(tcp["port"].as_integer(), Some(6363));
        assert_eq!(tcp["enable_v6"].as_str(), Some("no"));
    }

    #[test]
    fn test_missing_sections() {
        let config = TomlConfig::parse("").unwrap();
        assert_eq!(config.log.level, "info");
        assert!(config.face_system.is_none());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            TomlConfig::parse("[face_system\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = TomlConfig::from_file(file.path()).unwrap();
        assert!(config.face_system.is_some());

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            TomlConfig::from_file(&missing),
            Err(ConfigError::Read(_))
        ));
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = CliArgs::try_parse_from([
            "facemgrd",
            "--config",
            path.as_str(),
            "--log-level",
            "trace",
            "--dry-run",
            "--connect",
            "tcp4://192.0.2.1:6363,tcp6://[2001:db8::1]:6363",
        ])
        .unwrap();
        let config = DaemonConfiguration::from_cli(args).unwrap();

        assert_eq!(config.log_level, "trace");
        assert!(config.dry_run);
        assert_eq!(config.config_mode(), ConfigMode::ValidateOnly);
        assert!(!config.print_status);
        assert_eq!(config.connect.len(), 2);
        assert_eq!(config.connect[1].scheme(), "tcp6");
    }

    #[test]
    fn test_cli_without_file() {
        let args = CliArgs::try_parse_from(["facemgrd"]).unwrap();
        let config = DaemonConfiguration::from_cli(args).unwrap();
        assert_eq!(config.log_level, "info");
        assert!(config.face_system.is_none());
        assert!(config.connect.is_empty());
        assert_eq!(config.config_mode(), ConfigMode::Apply);
    }
}
