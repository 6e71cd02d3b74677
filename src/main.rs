use anyhow::Result;
use clap::Parser;
use ott_mongodb_backup_exporter::{
    config::Settings, metrics::MetricsCollector, server::start_server,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// OTT MongoDB Backup Exporter - Prometheus exporter for daily backup sizes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration
    let settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            init_logging("info", false);
            error!(error = %e, "config init");
            return Err(e.into());
        }
    };

    // Initialize logging
    init_logging(settings.log_level(), settings.log_json);

    info!("Starting OTT MongoDB Backup Exporter");
    info!("Backup directory: {}", settings.backup_dir);
    info!("Databases: {}", settings.databases.join(", "));

    let settings = Arc::new(settings);
    let metrics = MetricsCollector::new(Arc::clone(&settings))?;
    info!("Metrics collector initialized");

    info!(
        "ott mongodb backup exporter started on {}",
        settings.listen_address()
    );
    if let Err(e) = start_server(
        &settings.listen_address(),
        &settings.metrics_path,
        metrics,
    )
    .await
    {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

/// Initialize structured logging with tracing.
fn init_logging(log_level: &str, json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
