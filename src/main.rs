use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use sixaxis::config::MonitorConfig;
use sixaxis::controller::{ControllerError, ControllerHandle, DecodeError, Monitor};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let mut config = MonitorConfig::load().wrap_err("Failed to load configuration")?;
    if let Some(device) = std::env::args_os().nth(1) {
        config.device = PathBuf::from(device);
    }
    info!(
        "Monitoring {} with {:?} records",
        config.device.display(),
        config.record_layout
    );

    let handle = ControllerHandle::open(&config.device, Some(config.controller_settings()))
        .await
        .wrap_err("Failed to start controller")?;
    let cancel = handle.cancellation_token();

    // Ctrl-C stops ingestion; the monitor follows once the publisher closes
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupted, shutting down");
                signal_cancel.cancel();
            }
            Err(e) => error!("Unable to listen for Ctrl-C: {}", e),
        }
    });

    let mut monitor = Monitor::new(
        handle.subscribe(),
        config.monitor_settings(),
        std::io::stdout(),
    );
    let monitor_cancel = cancel.clone();
    let monitor_task = tokio::spawn(async move { monitor.run(monitor_cancel).await });

    let ingestion = handle.join().await;
    cancel.cancel();
    monitor_task
        .await
        .wrap_err("Monitor task panicked")?
        .wrap_err("Monitor failed")?;

    match ingestion {
        Ok(summary) => {
            info!(
                "Processed {} records ({} state changes)",
                summary.records, summary.changes
            );
            Ok(())
        }
        Err(ControllerError::DecodeError(DecodeError::Truncated { actual: 0, .. })) => {
            info!("Input device closed");
            Ok(())
        }
        Err(e) => Err(eyre!("Ingestion failed: {}", e)),
    }
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;

    let requested = std::env::var("RUST_LOG").ok();
    let level = log_level(requested.as_deref());
    setup_logging_env(level.unwrap_or(Level::INFO));
    if let (Some(value), None) = (&requested, level) {
        warn!(
            "RUST_LOG={:?} is not a bare level (trace, debug, info, warn, error), using info",
            value
        );
    }
    Ok(())
}

/// Only a bare level name is accepted, filter directives are not.
fn log_level(value: Option<&str>) -> Option<Level> {
    match value {
        None => Some(Level::INFO),
        Some(value) => Level::from_str(value.trim()).ok(),
    }
}

fn setup_logging_env(level: Level) {
    // stdout carries the rendered state, logs go to stderr
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_names_parse() {
        assert_eq!(log_level(None), Some(Level::INFO));
        assert_eq!(log_level(Some("debug")), Some(Level::DEBUG));
        assert_eq!(log_level(Some("WARN")), Some(Level::WARN));
    }

    #[test]
    fn filter_directives_are_rejected() {
        assert_eq!(log_level(Some("sixaxis=debug")), None);
        assert_eq!(log_level(Some("info,tokio=warn")), None);
    }
}
