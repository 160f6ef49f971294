mod comm;
mod config;
mod executor;

use comm::{Comm, CommConfig};
use config::AppConfig;
use executor::ExecutionService;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neurohub=debug,tower_http=info".into()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting neurohub...");

    let (base_dir, config) = AppConfig::from_env()?;
    let AppConfig {
        comm: comm_config,
        executor: executor_config,
    } = config;

    info!(
        base_dir = %base_dir.display(),
        resources = %comm_config.resources_file.display(),
        workflows = %executor_config.workflows_dir.display(),
        "Configuration loaded"
    );

    // Create directories if they don't exist
    for dir in [&executor_config.workflows_dir, &comm_config.templates_dir] {
        tokio::fs::create_dir_all(dir).await?;
    }

    let service = Arc::new(ExecutionService::from_config(&executor_config));

    let open_browser = comm_config.open_browser;
    warn_if_exposed(&comm_config, executor_config.allow_ad_hoc_commands);

    let comm = Comm::new(comm_config, service).await?;
    let url = format!("http://{}", comm.local_addr()?);
    info!(url = %url, "Comm initialized, press Ctrl+C to stop");

    if open_browser {
        open_in_browser(&url);
    }

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Received shutdown signal");
    };

    if let Err(e) = comm.run(shutdown).await {
        error!(error = %e, "Comm server error");
        return Err(e.into());
    }

    info!("Goodbye!");
    Ok(())
}

/// Ad-hoc commands have no whitelist; say so when reachable off-host
fn warn_if_exposed(config: &CommConfig, allow_ad_hoc: bool) {
    let loopback = config
        .bind_addr()
        .map(|addr| addr.ip().is_loopback())
        .unwrap_or(false);

    if allow_ad_hoc && !loopback {
        warn!(
            listen_addr = %config.listen_addr,
            "Ad-hoc commands are enabled on a non-loopback address; any caller can run commands on this host"
        );
    }
}

/// Best-effort launch of the default browser
fn open_in_browser(url: &str) {
    let mut cmd = if cfg!(target_os = "macos") {
        tokio::process::Command::new("open")
    } else if cfg!(windows) {
        let mut cmd = tokio::process::Command::new("cmd");
        cmd.args(["/C", "start", ""]);
        cmd
    } else {
        tokio::process::Command::new("xdg-open")
    };

    match cmd.arg(url).spawn() {
        Ok(_) => info!(url = %url, "Opened browser"),
        Err(e) => warn!(url = %url, error = %e, "Could not open browser"),
    }
}
