mod analytics;
mod commands;
mod config;
mod data;
mod poller;
mod render;
mod view;

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::mpsc;

use config::{Config, EnvConfig};
use data::dashboard_api::HttpDashboardApi;
use poller::scheduler::{Poller, PollerSettings};
use render::console::ConsoleTarget;
use render::Renderer;

#[tokio::main]
async fn main() -> Result<()> {
    // Panels own stdout; logs go to stderr.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    tracing::info!("Klik dashboard starting...");

    let env_config = EnvConfig::load()?;
    tracing::info!("Loading configuration: {}", env_config.config_path);
    let config = Config::load(&env_config.config_path)?;

    tracing::info!("Backend: {}", config.backend.base_url);
    tracing::info!("Symbols: {}", config.dashboard.symbols.join(", "));
    tracing::info!("Poll interval: {}s", config.dashboard.poll_interval_secs);
    tracing::info!("Chart output: {}", config.output.chart_path.display());

    let api = HttpDashboardApi::new(
        &config.backend.base_url,
        Duration::from_secs(config.backend.request_timeout_secs),
    )
    .context("Failed to build HTTP client")?;

    let target = ConsoleTarget::new(config.output.chart_path.clone())?;
    let mut poller = Poller::new(api, Renderer::new(target), PollerSettings::from_config(&config));

    let commands = commands::input::spawn_stdin_commands();
    let live = if config.backend.live_feed {
        data::live::spawn_live_feed(
            &config.backend.base_url,
            Duration::from_secs(config.backend.live_reconnect_secs),
        )
    } else {
        // Closed immediately; the poller stops listening on it.
        mpsc::channel(1).1
    };

    tracing::info!("Commands: symbol <SYM>, timeframe <TF>, pause, resume, backtest, export, advise key=value...");

    poller
        .run(commands, live, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    tracing::info!("Shutting down...");

    Ok(())
}
