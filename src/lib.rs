//! # OTT MongoDB Backup Exporter
//!
//! A Prometheus exporter reporting the on-disk size of daily MongoDB backups.
//!
//! ## Overview
//!
//! Backups are expected at `{BACKUP_DIR}/{YYYY-MM-DD}/{database}/`. On every
//! scrape the exporter walks today's folder for each configured database and
//! publishes one `ott_mongodb_backup_size{database="..."}` gauge per database.
//! A missing folder is reported as zero bytes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ott_mongodb_backup_exporter::{config::Settings, metrics::MetricsCollector, server::start_server};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load configuration
//!     let settings = Arc::new(Settings::load(None)?);
//!
//!     let metrics = MetricsCollector::new(settings.clone())?;
//!
//!     // Start HTTP server
//!     start_server(&settings.listen_address(), &settings.metrics_path, metrics).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! The exporter can be configured via:
//! - Environment variables (`BACKUP_DIR`, `DATABASES`, `SERVER_HOST`, `SERVER_PORT`, `DEBUG`)
//! - An optional TOML configuration file
//!
//! See [`config::Settings`] for details.
//!
//! ## Modules
//!
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling
//! - [`metrics`] - Backup size collector and Prometheus registry
//! - [`probe`] - Directory size measurement
//! - [`server`] - HTTP server for exposing metrics

pub mod config;
pub mod error;
pub mod metrics;
pub mod probe;
pub mod server;

pub use error::{ExporterError, Result};
