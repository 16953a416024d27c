mod app;
mod calendar;
mod config;
mod domain;
mod http;
mod infrastructure;
mod mail;
mod spam;
mod store;
mod tasks;

use anyhow::Result;
use infrastructure::{directories, instance_guard::InstanceGuard, logging, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    let _instance_guard = InstanceGuard::acquire(&paths)?;

    let shutdown = shutdown::Shutdown::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let app = app::ContactIntakeApp::initialize(config, paths, shutdown.clone()).await?;
    app.run().await
}
