//! Error types for the deal finder.
//!
//! Each layer gets its own enum so the caller can decide how far a failure
//! travels: browser and category errors are retried or skipped, login errors
//! collapse into a boolean, and only a failed browser launch ends the run.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures raised by the browser session.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("devtools protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("no secondary browsing context to close")]
    NoSecondaryContext,
}

/// Failures while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("missing required environment variable {0}")]
    MissingCredential(&'static str),
}

/// Failures that abort a single category attempt.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("invalid base URL `{url}`: {source}")]
    BaseUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("category banner not found on {0}")]
    MissingBanner(String),

    #[error("no listing rows found on page {0}")]
    NoListings(usize),

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

/// A login attempt that stopped at a given step.
#[derive(Debug, Error)]
#[error("login failed while {step}: {source}")]
pub struct LoginError {
    pub step: &'static str,
    #[source]
    pub source: BrowserError,
}
