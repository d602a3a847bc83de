//! In-memory browser used by the unit tests.
//!
//! Pages are canned HTML keyed by URL. Clicking a selector follows a link
//! registered with [`FakeDriver::link`]; everything else behaves like a
//! static page. Failures can be injected per URL.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::config::Config;
use crate::error::BrowserError;
use crate::traits::Driver;

/// Config with every delay set to zero
pub fn test_config() -> Config {
    Config {
        page_settle_ms: 0,
        retry_delay_secs: 0,
        implicit_wait_secs: 0,
        listing_wait_secs: 0,
        login_timeout_secs: 0,
        base_url: "https://shop.test".to_string(),
        output_dir: PathBuf::from("unused"),
        ..Config::default()
    }
}

#[derive(Default)]
pub struct FakeDriver {
    pages: HashMap<String, String>,
    links: HashMap<(String, String), String>,
    navigation_failures: HashMap<String, usize>,
    broken_content: HashSet<String>,
    content_failures: HashMap<String, usize>,
    tabs: Vec<String>,
    /// Every navigation attempt, including failed ones
    pub visits: Vec<String>,
    /// Every URL opened in a secondary context
    pub opened: Vec<String>,
    pub fills: Vec<(String, String)>,
    pub clicks: Vec<String>,
    /// Largest number of contexts open at once
    pub peak_contexts: usize,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            tabs: vec!["about:blank".to_string()],
            peak_contexts: 1,
            ..Self::default()
        }
    }

    pub fn page(&mut self, url: &str, html: &str) -> &mut Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Clicking `selector` while on `from` navigates to `to`
    pub fn link(&mut self, from: &str, selector: &str, to: &str) -> &mut Self {
        self.links
            .insert((from.to_string(), selector.to_string()), to.to_string());
        self
    }

    /// The next `times` navigations to `url` fail
    pub fn fail_navigation(&mut self, url: &str, times: usize) -> &mut Self {
        self.navigation_failures.insert(url.to_string(), times);
        self
    }

    /// Reading the DOM of `url` always fails
    pub fn break_content(&mut self, url: &str) -> &mut Self {
        self.broken_content.insert(url.to_string());
        self
    }

    /// The next `times` reads of the DOM of `url` fail
    pub fn fail_content(&mut self, url: &str, times: usize) -> &mut Self {
        self.content_failures.insert(url.to_string(), times);
        self
    }

    pub fn current_url(&self) -> &str {
        self.tabs.last().map_or("", String::as_str)
    }

    fn current_html(&self) -> Option<&String> {
        self.pages.get(self.current_url())
    }

    fn matches(&self, selector: &str) -> bool {
        let Ok(parsed) = Selector::parse(selector) else {
            return false;
        };
        self.current_html()
            .is_some_and(|html| Html::parse_document(html).select(&parsed).next().is_some())
    }

    fn navigate_active(&mut self, url: &str) -> Result<(), BrowserError> {
        self.visits.push(url.to_string());

        if let Some(remaining) = self.navigation_failures.get_mut(url)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(BrowserError::Timeout {
                what: format!("navigation to {url}"),
                after: Duration::ZERO,
            });
        }

        if let Some(tab) = self.tabs.last_mut() {
            *tab = url.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.navigate_active(url)
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        let url = self.current_url().to_string();
        if self.broken_content.contains(&url) {
            return Err(BrowserError::ElementNotFound(format!("document of {url}")));
        }
        if let Some(remaining) = self.content_failures.get_mut(&url)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(BrowserError::ElementNotFound(format!("document of {url}")));
        }
        self.current_html()
            .cloned()
            .ok_or(BrowserError::ElementNotFound(format!("document of {url}")))
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        if self.matches(selector) {
            Ok(())
        } else {
            Err(BrowserError::Timeout {
                what: selector.to_string(),
                after: timeout,
            })
        }
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        if !self.matches(selector) {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        self.clicks.push(selector.to_string());

        let key = (self.current_url().to_string(), selector.to_string());
        match self.links.get(&key).cloned() {
            Some(target) => self.navigate_active(&target),
            None => Ok(()),
        }
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<(), BrowserError> {
        if !self.matches(selector) {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        self.fills.push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn open_context(&mut self, url: &str) -> Result<(), BrowserError> {
        self.tabs.push("about:blank".to_string());
        self.peak_contexts = self.peak_contexts.max(self.tabs.len());
        self.opened.push(url.to_string());
        self.navigate_active(url)
    }

    async fn close_context(&mut self) -> Result<(), BrowserError> {
        if self.tabs.len() <= 1 {
            return Err(BrowserError::NoSecondaryContext);
        }
        self.tabs.pop();
        Ok(())
    }

    fn context_count(&self) -> usize {
        self.tabs.len()
    }
}
