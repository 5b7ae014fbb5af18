mod api_client;
mod config;
mod guide;
mod poller;
mod programmer;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api_client::{HttpPortalApi, PortalApi};
use crate::config::{Config, DashboardRole};
use crate::guide::GuideDashboard;
use crate::programmer::ProgrammerDashboard;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Aegis dashboard v{}", env!("CARGO_PKG_VERSION"));
    info!("API base URL: {}", config.api_base_url);

    let api: Arc<dyn PortalApi> = Arc::new(HttpPortalApi::new(config.api_base_url.clone()));

    match config.role {
        DashboardRole::Guide => {
            let dashboard = GuideDashboard::mount(api, config.user_id);
            info!("Guide dashboard mounted; polling pending requests (ctrl-c to exit)");
            tokio::signal::ctrl_c().await?;
            dashboard.unmount().await;
        }
        DashboardRole::Programmer => {
            let dashboard = ProgrammerDashboard::mount(api, config.user_id);
            info!("Programmer dashboard mounted; polling notifications and sessions (ctrl-c to exit)");
            tokio::signal::ctrl_c().await?;
            dashboard.unmount().await;
        }
    }

    info!("Dashboard unmounted");
    Ok(())
}
