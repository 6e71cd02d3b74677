//! Prometheus metrics definitions and collection logic.
//!
//! The backup size gauge is produced by [`BackupSizeCollector`], a custom
//! [`Collector`] registered once at startup. Its descriptor is static while
//! its values are measured from disk every time the registry is gathered,
//! so each scrape reflects the current state of today's backup folders.

use crate::config::Settings;
use crate::error::{ExporterError, Result};
use crate::probe;
use chrono::{Local, NaiveDate};
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error};

/// Name of the backup size metric family.
pub const BACKUP_SIZE_METRIC: &str = "ott_mongodb_backup_size";
const BACKUP_SIZE_HELP: &str = "shows backup size in bytes";
const DATABASE_LABEL: &str = "database";

/// Layout of the per-day backup folder name.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Size of one database's backup as measured during a scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupSample {
    pub database: String,
    pub bytes: f64,
}

/// Measures `{backup_dir}/{date}/{database}` for every configured database.
pub struct BackupSizeCollector {
    settings: Arc<Settings>,
    desc: Desc,
}

impl BackupSizeCollector {
    /// Create a collector for the databases listed in `settings`.
    pub fn new(settings: Arc<Settings>) -> Result<Self> {
        let desc = Desc::new(
            BACKUP_SIZE_METRIC.to_string(),
            BACKUP_SIZE_HELP.to_string(),
            vec![DATABASE_LABEL.to_string()],
            HashMap::new(),
        )
        .map_err(|e| ExporterError::Metrics(e.to_string()))?;

        Ok(Self { settings, desc })
    }

    /// Static descriptor of the backup size gauge.
    pub fn describe(&self) -> &Desc {
        &self.desc
    }

    /// Directory holding `database`'s backup for `date`.
    pub fn backup_path(&self, date: NaiveDate, database: &str) -> PathBuf {
        PathBuf::from(format!(
            "{}/{}/{}",
            self.settings.backup_dir,
            date.format(DATE_FORMAT),
            database
        ))
    }

    /// Measure every configured database for `date`, in configured order.
    ///
    /// A database whose folder is missing or unreadable reports zero bytes.
    pub fn samples_for(&self, date: NaiveDate) -> Vec<BackupSample> {
        self.settings
            .databases
            .iter()
            .map(|database| {
                let path = self.backup_path(date, database);
                let bytes = match probe::measure(&path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        debug!(
                            error = %e,
                            database = %database,
                            "Backup not measurable, reporting 0"
                        );
                        0.0
                    }
                };
                BackupSample {
                    database: database.clone(),
                    bytes,
                }
            })
            .collect()
    }

    /// Measure every configured database for the current local date.
    pub fn samples(&self) -> Vec<BackupSample> {
        self.samples_for(Local::now().date_naive())
    }

    fn families(&self, samples: &[BackupSample]) -> Result<Vec<MetricFamily>> {
        let gauges = GaugeVec::new(
            Opts::new(BACKUP_SIZE_METRIC, BACKUP_SIZE_HELP),
            &[DATABASE_LABEL],
        )
        .map_err(|e| ExporterError::Metrics(e.to_string()))?;

        for sample in samples {
            gauges
                .with_label_values(&[sample.database.as_str()])
                .set(sample.bytes);
        }

        Ok(gauges.collect())
    }
}

impl Collector for BackupSizeCollector {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let samples = self.samples();
        match self.families(&samples) {
            Ok(families) => families,
            Err(e) => {
                error!("Failed to build backup size metrics: {}", e);
                Vec::new()
            }
        }
    }
}

/// Metrics registry for the exporter.
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Registry,
}

impl MetricsCollector {
    /// Create the registry and register the backup size collector.
    pub fn new(settings: Arc<Settings>) -> Result<Self> {
        let registry = Registry::new();

        let backup_size = BackupSizeCollector::new(settings)?;
        registry
            .register(Box::new(backup_size))
            .map_err(|e| ExporterError::Metrics(e.to_string()))?;

        #[cfg(target_os = "linux")]
        registry
            .register(Box::new(
                prometheus::process_collector::ProcessCollector::for_self(),
            ))
            .map_err(|e| ExporterError::Metrics(e.to_string()))?;

        Ok(Self { registry })
    }

    /// Run a collection pass and encode it in Prometheus text format.
    ///
    /// Walks the filesystem, so callers on an async runtime should run this
    /// on a blocking thread.
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::with_capacity(1024);
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| ExporterError::Metrics(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| ExporterError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn settings(backup_dir: &str, databases: &[&str]) -> Arc<Settings> {
        Arc::new(Settings {
            backup_dir: backup_dir.to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 9001,
            databases: databases.iter().map(|d| d.to_string()).collect(),
            debug: false,
            metrics_path: "/metrics".to_string(),
            log_json: false,
        })
    }

    fn scrape_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_backup_path_layout() {
        let collector =
            BackupSizeCollector::new(settings("/data/backups", &["alpha"])).unwrap();
        assert_eq!(
            collector.backup_path(scrape_date(), "alpha"),
            PathBuf::from("/data/backups/2024-03-01/alpha")
        );
    }

    #[test]
    fn test_describe_returns_single_descriptor() {
        let collector = BackupSizeCollector::new(settings("/data", &["alpha"])).unwrap();

        assert_eq!(collector.describe().fq_name, BACKUP_SIZE_METRIC);
        assert_eq!(collector.describe().help, BACKUP_SIZE_HELP);
        assert_eq!(collector.describe().variable_labels, vec![DATABASE_LABEL]);
        assert_eq!(collector.desc().len(), 1);
    }

    #[test]
    fn test_present_and_missing_databases() {
        let root = TempDir::new().unwrap();
        let alpha = root.path().join("2024-03-01/alpha");
        fs::create_dir_all(&alpha).unwrap();
        fs::write(alpha.join("dump.bson"), vec![1u8; 500]).unwrap();

        let collector = BackupSizeCollector::new(settings(
            root.path().to_str().unwrap(),
            &["alpha", "beta"],
        ))
        .unwrap();

        let samples = collector.samples_for(scrape_date());
        assert_eq!(
            samples,
            vec![
                BackupSample {
                    database: "alpha".to_string(),
                    bytes: 500.0
                },
                BackupSample {
                    database: "beta".to_string(),
                    bytes: 0.0
                },
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_backup_reports_zero() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let alpha = root.path().join("2024-03-01/alpha");
        fs::create_dir_all(alpha.join("locked")).unwrap();
        fs::write(alpha.join("dump.bson"), vec![1u8; 500]).unwrap();
        fs::set_permissions(alpha.join("locked"), fs::Permissions::from_mode(0o000)).unwrap();

        let readable = fs::read_dir(alpha.join("locked")).is_ok();
        let collector =
            BackupSizeCollector::new(settings(root.path().to_str().unwrap(), &["alpha"]))
                .unwrap();
        let samples = collector.samples_for(scrape_date());
        fs::set_permissions(alpha.join("locked"), fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].bytes, 0.0);
    }

    #[test]
    fn test_other_days_are_ignored() {
        let root = TempDir::new().unwrap();
        let yesterday = root.path().join("2024-02-29/alpha");
        fs::create_dir_all(&yesterday).unwrap();
        fs::write(yesterday.join("dump.bson"), vec![1u8; 900]).unwrap();

        let collector =
            BackupSizeCollector::new(settings(root.path().to_str().unwrap(), &["alpha"]))
                .unwrap();

        let samples = collector.samples_for(scrape_date());
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].bytes, 0.0);
    }

    #[test]
    fn test_one_sample_per_database_in_order() {
        let databases = ["users", "orders", "audit", "sessions"];
        let collector =
            BackupSizeCollector::new(settings("/nonexistent/root", &databases)).unwrap();

        let samples = collector.samples_for(scrape_date());
        let names: Vec<&str> = samples.iter().map(|s| s.database.as_str()).collect();
        assert_eq!(names, databases);
        assert!(samples.iter().all(|s| s.bytes == 0.0));
    }

    #[test]
    fn test_collect_emits_gauge_family() {
        let collector =
            BackupSizeCollector::new(settings("/nonexistent/root", &["alpha", "beta"])).unwrap();

        let families = collector.collect();
        assert_eq!(families.len(), 1);

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        let samples: Vec<&str> = output
            .lines()
            .filter(|line| line.starts_with(BACKUP_SIZE_METRIC))
            .collect();
        assert_eq!(samples.len(), 2);
        assert!(output.contains(r#"ott_mongodb_backup_size{database="alpha"} 0"#));
        assert!(output.contains(r#"ott_mongodb_backup_size{database="beta"} 0"#));
    }

    #[test]
    fn test_encode_text_format() {
        let root = TempDir::new().unwrap();
        let today = Local::now().date_naive().format(DATE_FORMAT).to_string();
        let alpha = root.path().join(&today).join("alpha");
        fs::create_dir_all(&alpha).unwrap();
        fs::write(alpha.join("dump.bson"), vec![1u8; 500]).unwrap();

        let metrics = MetricsCollector::new(settings(
            root.path().to_str().unwrap(),
            &["alpha", "beta"],
        ))
        .unwrap();
        let output = metrics.encode().unwrap();

        assert!(output.contains("# HELP ott_mongodb_backup_size shows backup size in bytes"));
        assert!(output.contains("# TYPE ott_mongodb_backup_size gauge"));
        assert!(output.contains(r#"ott_mongodb_backup_size{database="alpha"} 500"#));
        assert!(output.contains(r#"ott_mongodb_backup_size{database="beta"} 0"#));
    }
}
