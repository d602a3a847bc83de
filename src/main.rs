use std::path::PathBuf;

use anyhow::Result;
use tracing::{error, info};

mod auth;
mod browser;
mod config;
mod deal_finder;
mod error;
mod extract;
mod logging;
mod models;
mod scrapers;
mod storage;
#[cfg(test)]
mod testing;
mod traits;

use config::Config;
use deal_finder::DealFinder;
use error::ConfigError;

/// Log directory to use even when the configuration could not be loaded
fn log_dir(loaded: &Result<Config, ConfigError>) -> PathBuf {
    match loaded {
        Ok(config) => config.log_dir.clone(),
        Err(_) => Config::default().log_dir,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let loaded = Config::load();
    if let Some(path) = logging::init(&log_dir(&loaded))? {
        info!("Logging to {}", path.display());
    }

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Ok(());
        }
    };

    info!("Starting Amazon best-seller deal finder");

    let finder = match DealFinder::new(config) {
        Ok(finder) => finder,
        Err(e) => {
            error!("Failed to set up scraper: {:#}", e);
            return Ok(());
        }
    };

    match finder.run().await {
        Ok(summary) if !summary.logged_in => error!("Login failed, nothing was scraped"),
        Ok(summary) => info!(
            "Scraping complete: {} products across {} categories ({} skipped)",
            summary.total_products, summary.categories_scraped, summary.categories_skipped
        ),
        Err(e) => error!("Scraping failed: {:#}", e),
    }

    Ok(())
}
