use field_device::{Config, FieldDevice, init_logger_with_file, print_banner};
use std::time::Duration;

/// Interval between background task health checks
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (.env is optional)
    dotenv::dotenv().ok();

    // 2. Configuration and logging
    let config = Config::from_env()?;
    init_logger_with_file(&config.log_level, config.is_production(), Some(&config.log_dir()))?;

    print_banner();
    tracing::info!(environment = %config.environment, "Briefing field device starting...");

    config.validate()?;

    // 3. Printer
    let mut device = FieldDevice::new(config)?;
    if let Err(e) = device.verify_printer().await {
        tracing::error!(error = %e, "Printer check failed");
        return Err(e.into());
    }
    device.prepare().await?;

    // 4. Background tasks
    device.start()?;
    tracing::info!("Field device running, press Ctrl+C to stop");

    let mut health = tokio::time::interval(HEALTH_CHECK_INTERVAL);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let broken = loop {
        tokio::select! {
            _ = &mut shutdown => break None,
            _ = health.tick() => {
                let report = device.check_health();
                if !report.pipeline_intact() {
                    break Some(report.pipeline_down());
                }
            }
        }
    };

    // 5. Graceful shutdown
    device.shutdown().await;
    if let Some(down) = broken {
        tracing::error!(down = ?down, "Field device stopped, briefing pipeline broken");
        anyhow::bail!("briefing pipeline tasks exited: {}", down.join(", "));
    }
    tracing::info!("Field device stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
