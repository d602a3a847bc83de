//! Browser session backed by chromiumoxide (Chrome DevTools Protocol).
//!
//! The session owns one browser process, the task pumping its CDP handler,
//! and a stack of open pages. The bottom page is the listing context; detail
//! pages are pushed on top and popped again by [`Driver::close_context`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::BrowserError;
use crate::traits::Driver;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

const CHROME_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/opt/google/chrome/google-chrome",
];

/// Flags for a quiet, stable automation browser
const CHROME_ARGS: &[&str] = &[
    "--disable-gpu",
    "--disable-software-rasterizer",
    "--disable-dev-shm-usage",
    "--no-sandbox",
    "--disable-notifications",
    "--disable-popup-blocking",
    "--disable-extensions",
    "--disable-logging",
    "--log-level=3",
    "--silent",
    "--ignore-gpu-blocklist",
];

fn find_chrome(configured: Option<&Path>) -> Result<PathBuf, BrowserError> {
    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }

    CHROME_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            BrowserError::Launch(
                "Chrome/Chromium not found; set chrome_executable in the config".to_string(),
            )
        })
}

pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    pages: Vec<Page>,
    implicit_wait: Duration,
    page_load_timeout: Duration,
}

impl BrowserSession {
    /// Launch the browser and open the initial page.
    ///
    /// If anything after the launch fails, the browser process and handler
    /// task are shut down before the error is returned.
    pub async fn open(config: &Config) -> Result<Self, BrowserError> {
        let chrome = find_chrome(config.chrome_executable.as_deref())?;
        info!("Launching browser at {} (headless={})", chrome.display(), config.headless);

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome)
            .window_size(config.window_width, config.window_height)
            .request_timeout(config.page_load_timeout())
            .args(CHROME_ARGS.iter().copied());

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder.build().map_err(BrowserError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(browser_config).await?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                warn!("Browser started but no page could be opened: {}", e);
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(e.into());
            }
        };

        info!("Browser session ready");

        Ok(Self {
            browser,
            handler,
            pages: vec![page],
            implicit_wait: config.implicit_wait(),
            page_load_timeout: config.page_load_timeout(),
        })
    }

    /// Shut the browser down. Errors are logged; the process is gone either way.
    pub async fn close(mut self) {
        for page in self.pages.drain(..).rev() {
            let _ = page.close().await;
        }

        if let Err(e) = self.browser.close().await {
            debug!("Browser close request failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("Waiting for browser exit failed: {}", e);
        }
        self.handler.abort();

        info!("Browser closed");
    }

    fn active(&self) -> &Page {
        // `pages` always holds the root page until `close` consumes the session
        &self.pages[self.pages.len() - 1]
    }

    /// Poll for an element until `wait` elapses
    async fn find(&self, selector: &str, wait: Duration) -> Result<Element, BrowserError> {
        let deadline = Instant::now() + wait;
        loop {
            if let Ok(element) = self.active().find_element(selector).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::ElementNotFound(selector.to_string()));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn navigate(&self, page: &Page, url: &str) -> Result<(), BrowserError> {
        match timeout(self.page_load_timeout, page.goto(url)).await {
            Ok(result) => {
                result?;
                Ok(())
            }
            Err(_) => Err(BrowserError::Timeout {
                what: format!("navigation to {url}"),
                after: self.page_load_timeout,
            }),
        }
    }
}

#[async_trait]
impl Driver for BrowserSession {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        debug!("Navigating to {}", url);
        self.navigate(self.active(), url).await
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        Ok(self.active().content().await?)
    }

    async fn wait_for(&mut self, selector: &str, wait: Duration) -> Result<(), BrowserError> {
        self.find(selector, wait)
            .await
            .map(|_| ())
            .map_err(|_| BrowserError::Timeout {
                what: selector.to_string(),
                after: wait,
            })
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        let element = self.find(selector, self.implicit_wait).await?;
        element.scroll_into_view().await?;
        element.click().await?;
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<(), BrowserError> {
        let element = self.find(selector, self.implicit_wait).await?;
        element
            .call_js_fn("function() { this.value = ''; }", false)
            .await?;
        element.click().await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn open_context(&mut self, url: &str) -> Result<(), BrowserError> {
        let page = self.browser.new_page("about:blank").await?;
        // Pushed before navigating so a failed load is still closed by the caller
        self.pages.push(page);
        self.navigate(self.active(), url).await
    }

    async fn close_context(&mut self) -> Result<(), BrowserError> {
        if self.pages.len() <= 1 {
            return Err(BrowserError::NoSecondaryContext);
        }
        if let Some(page) = self.pages.pop() {
            page.close().await?;
        }
        Ok(())
    }

    fn context_count(&self) -> usize {
        self.pages.len()
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
