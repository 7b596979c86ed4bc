//! Fleet Console
//!
//! Headless console runner: mounts one device view (when configured), keeps
//! the audit log and device status fresh on a schedule, and reports policy
//! compliance until interrupted.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use validator::Validate;

use fleet_console::api::{ConsoleClient, HttpTransport};
use fleet_console::config::Config;
use fleet_console::dispatch::CommandDispatcher;
use fleet_console::sync::{audit_log_feed, device_feed};
use fleet_console::view::DeviceView;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleet_console=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;

    tracing::info!("Fleet Console starting...");
    let transport = HttpTransport::new(&config).context("Failed to create backend transport")?;
    tracing::info!("Backend: {}", transport.base_url());
    tracing::info!("Environment: {}", config.environment);
    if config.session_cookie.is_none() {
        tracing::warn!("No session cookie configured; backend calls will likely be rejected");
    }

    let client = ConsoleClient::new(Arc::new(transport));
    let dispatcher = CommandDispatcher::new(client.clone(), config.dispatch_timeout());

    // Device view
    if let Some(device_id) = &config.device_id {
        let mut view = DeviceView::new(device_id.clone());
        match view.mount(dispatcher.client()).await {
            Ok(()) => {
                let running = view.processes().into_iter().filter(|p| p.is_killable()).count();
                tracing::info!("{} running processes on {}", running, device_id);
                for (extension, classification) in view.classified_extensions() {
                    tracing::info!("  {} ({}): {}", extension.name, extension.category, classification);
                }
                for (category, name) in view.policy().policy().overlaps() {
                    tracing::warn!("'{}' is whitelisted ({}) and blacklisted", name, category);
                }
            }
            Err(e) => tracing::error!("Failed to mount {}: {}", device_id, e),
        }

        match client.patch_status(device_id).await {
            Ok(patch) => tracing::info!(
                "Patch status for {}: {} ({})",
                device_id,
                patch.status,
                patch.timestamp.as_deref().unwrap_or("never")
            ),
            Err(e) => tracing::warn!("Patch status unavailable for {}: {}", device_id, e),
        }
    }

    // Scheduled refresh
    let audit = audit_log_feed(client.clone(), config.device_id.clone(), config.audit_refresh_interval());
    let devices = device_feed(client.clone(), config.device_poll_interval());

    tracing::info!("Running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;

    tracing::info!(
        "Shutting down: {} devices ({} online), {} audit entries",
        devices.len(),
        devices.online(),
        audit.len()
    );
    audit.shutdown().await;
    devices.shutdown().await;

    Ok(())
}
