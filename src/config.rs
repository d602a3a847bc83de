//! Runtime configuration.
//!
//! Settings come from an optional TOML file (`DEAL_FINDER_CONFIG`, or
//! `deal_finder.toml` in the working directory) layered over built-in
//! defaults. Credentials are always read from the environment
//! (`AMAZON_EMAIL`, `AMAZON_PASSWORD`), which `main` populates from `.env`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;

const CONFIG_PATH_VAR: &str = "DEAL_FINDER_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "deal_finder.toml";
const EMAIL_VAR: &str = "AMAZON_EMAIL";
const PASSWORD_VAR: &str = "AMAZON_PASSWORD";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub email: String,
    #[serde(skip)]
    pub password: String,

    pub base_url: String,
    /// Landing page opened once login succeeds
    pub bestsellers_url: String,
    pub category_urls: Vec<String>,

    pub max_products_per_category: usize,
    pub min_discount_percentage: f64,

    pub implicit_wait_secs: u64,
    pub page_load_timeout_secs: u64,
    pub login_timeout_secs: u64,
    pub listing_wait_secs: u64,
    pub category_attempts: u32,
    pub retry_delay_secs: u64,
    /// Pause after navigations so client-side rendering can finish
    pub page_settle_ms: u64,

    pub output_dir: PathBuf,
    pub log_dir: PathBuf,

    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            base_url: "https://www.amazon.in".to_string(),
            bestsellers_url: "https://www.amazon.in/gp/bestsellers".to_string(),
            category_urls: [
                "kitchen",
                "shoes",
                "computers",
                "electronics",
                "beauty",
                "clothing",
                "sporting-goods",
                "home-improvement",
                "toys",
                "books",
            ]
            .iter()
            .map(|c| format!("https://www.amazon.in/gp/bestsellers/{c}/"))
            .collect(),
            max_products_per_category: 1500,
            min_discount_percentage: 50.0,
            implicit_wait_secs: 10,
            page_load_timeout_secs: 30,
            login_timeout_secs: 30,
            listing_wait_secs: 10,
            category_attempts: 3,
            retry_delay_secs: 5,
            page_settle_ms: 2000,
            output_dir: PathBuf::from("data/output"),
            log_dir: PathBuf::from("logs"),
            headless: false,
            chrome_executable: None,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

impl Config {
    /// Load the config file (if any) and credentials from the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .ok()
            .or_else(|| {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            });

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.email = required_env(EMAIL_VAR)?;
        config.password = required_env(PASSWORD_VAR)?;

        Ok(config)
    }

    /// Parse a TOML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn implicit_wait(&self) -> Duration {
        Duration::from_secs(self.implicit_wait_secs)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn listing_wait(&self) -> Duration {
        Duration::from_secs(self.listing_wait_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }
}

fn required_env(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingCredential(name))
}
