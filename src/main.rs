mod app;
mod catalog;
mod config;
mod error;
mod feed;
mod format;
mod ui;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::app::App;
use crate::catalog::TmdbClient;
use crate::config::Config;
use crate::error::Result;

fn setup_logging() -> Result<()> {
    let data_dir = config::data_dir()?;
    std::fs::create_dir_all(&data_dir)?;

    let file_appender = tracing_appender::rolling::daily(&data_dir, "marquee.log");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("marquee=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Log to a file, the TUI owns the terminal
    if let Err(e) = setup_logging() {
        eprintln!("Warning: Could not set up logging: {}", e);
    }

    info!("Starting marquee");

    let config = Config::load()?;
    info!(base_url = %config.catalog.base_url, listing = %config.ui.default_listing, "Loaded config");
    if !config.has_api_key() {
        // Not fatal here: the list shows the setup instructions instead
        warn!("No catalog API key configured");
    }

    let client = TmdbClient::new(&config.catalog)?;

    let mut terminal = app::init_terminal()?;

    let mut app = App::new(config, Arc::new(client));
    let result = app.run(&mut terminal).await;

    app::restore_terminal()?;

    result
}
