//! Configuration management for the backup exporter.
//!
//! Supports loading configuration from:
//! - An optional TOML configuration file
//! - Environment variables (`BACKUP_DIR`, `DATABASES`, `SERVER_HOST`, ...)
//!
//! Environment variables take precedence over file values.

use crate::error::{ExporterError, Result};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::Path;

/// Paths served by the exporter itself that the metrics endpoint may not use.
const RESERVED_PATHS: &[&str] = &["/", "/health"];

/// Exporter settings, loaded once at startup and never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Root directory holding one `YYYY-MM-DD` folder per backup day.
    /// A single trailing `/` is stripped at load time.
    pub backup_dir: String,

    /// Address to bind the HTTP server to
    #[serde(default = "default_server_host")]
    pub server_host: String,

    /// Port to bind the HTTP server to
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    /// Databases to report on, in the order they were configured.
    /// Accepts a comma-separated string or a list.
    #[serde(deserialize_with = "deserialize_databases")]
    pub databases: Vec<String>,

    /// Raise log verbosity to debug
    #[serde(default)]
    pub debug: bool,

    /// Path of the metrics endpoint
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    9001
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DatabaseList {
    List(Vec<String>),
    Csv(String),
}

fn deserialize_databases<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = match DatabaseList::deserialize(deserializer)? {
        DatabaseList::List(names) => names,
        DatabaseList::Csv(raw) => raw.split(',').map(str::to_string).collect(),
    };

    Ok(names.into_iter().map(|name| name.trim().to_string()).collect())
}

impl Settings {
    /// Load configuration from an optional file and the process environment.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ott_mongodb_backup_exporter::config::Settings;
    ///
    /// let settings = Settings::load(None).unwrap();
    /// println!("reporting on {:?}", settings.databases);
    /// ```
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::from_sources(config_path, config::Environment::default())
    }

    /// Load configuration from an optional file and the given environment source.
    pub fn from_sources(
        config_path: Option<&str>,
        environment: config::Environment,
    ) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(config::File::with_name(path));
            }
        }

        builder = builder.add_source(environment);

        let config = builder.build()?;
        let mut settings: Settings = config.try_deserialize()?;

        settings.validate()?;
        settings.normalize();
        Ok(settings)
    }

    /// Strip exactly one trailing separator from the backup root.
    fn normalize(&mut self) {
        if let Some(stripped) = self.backup_dir.strip_suffix('/') {
            self.backup_dir = stripped.to_string();
        }
    }

    /// Validate configuration settings.
    fn validate(&self) -> Result<()> {
        if self.backup_dir.is_empty() {
            return Err(ExporterError::invalid_config("BACKUP_DIR cannot be empty"));
        }

        if self.databases.is_empty() {
            return Err(ExporterError::invalid_config(
                "DATABASES must name at least one database",
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.databases {
            if name.is_empty() {
                return Err(ExporterError::invalid_config(
                    "DATABASES contains an empty database name",
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ExporterError::invalid_config(format!(
                    "DATABASES lists '{}' more than once",
                    name
                )));
            }
        }

        if !self.metrics_path.starts_with('/') {
            return Err(ExporterError::invalid_config(
                "METRICS_PATH must start with '/'",
            ));
        }

        let has_route_syntax = self.metrics_path.contains(['{', '}'])
            || self
                .metrics_path
                .split('/')
                .any(|segment| segment.starts_with([':', '*']));
        if has_route_syntax {
            return Err(ExporterError::invalid_config(format!(
                "METRICS_PATH '{}' must be a literal path",
                self.metrics_path
            )));
        }

        if RESERVED_PATHS.contains(&self.metrics_path.as_str()) {
            return Err(ExporterError::invalid_config(format!(
                "METRICS_PATH cannot be '{}'",
                self.metrics_path
            )));
        }

        Ok(())
    }

    /// `host:port` the HTTP server binds to.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Log filter directive derived from the debug flag.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}
