use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::auth::Authenticator;
use crate::browser::BrowserSession;
use crate::config::Config;
use crate::models::ProductRecord;
use crate::scrapers::amazon;
use crate::scrapers::category::CategoryWalker;
use crate::scrapers::detail::DetailExtractor;
use crate::storage::{ALL_PRODUCTS, JsonSink, category_slug};
use crate::traits::{Driver, SiteSelectors};

/// What a run achieved
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub logged_in: bool,
    pub categories_scraped: usize,
    pub categories_skipped: usize,
    pub total_products: usize,
}

pub struct DealFinder {
    config: Config,
    selectors: SiteSelectors,
    extractor: DetailExtractor,
    sink: JsonSink,
}

impl DealFinder {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_selectors(config, amazon::selectors())
    }

    pub fn with_selectors(config: Config, selectors: SiteSelectors) -> Result<Self> {
        let extractor =
            DetailExtractor::new(&selectors, &config).context("Invalid detail selectors")?;
        let sink = JsonSink::new(config.output_dir.clone());

        Ok(Self {
            config,
            selectors,
            extractor,
            sink,
        })
    }

    /// Launch the browser, scrape everything, and shut the browser down.
    ///
    /// Only a failure to start the browser is returned as an error.
    pub async fn run(&self) -> Result<RunSummary> {
        let mut session = BrowserSession::open(&self.config)
            .await
            .context("Failed to start browser session")?;

        let summary = self.scrape_all(&mut session).await;
        session.close().await;

        Ok(summary)
    }

    /// Log in, then walk every configured category in order
    pub async fn scrape_all<D: Driver + ?Sized>(&self, driver: &mut D) -> RunSummary {
        let mut summary = RunSummary::default();

        if !Authenticator::new(&self.config, &self.selectors)
            .login(driver)
            .await
        {
            error!("Failed to login");
            return summary;
        }
        summary.logged_in = true;

        let walker = match CategoryWalker::new(
            &self.config,
            &self.selectors,
            &self.extractor,
            &self.sink,
        ) {
            Ok(walker) => walker,
            Err(e) => {
                error!("Cannot build category walker: {}", e);
                return summary;
            }
        };

        let total = self.config.category_urls.len();
        let mut all_products: Vec<ProductRecord> = Vec::new();

        for (i, category_url) in self.config.category_urls.iter().enumerate() {
            info!("Processing category {} of {}", i + 1, total);

            let outcome = walker.scrape_category(driver, category_url).await;

            match outcome.category_name {
                Some(name) => {
                    summary.categories_scraped += 1;
                    if outcome.records.is_empty() {
                        continue;
                    }

                    self.sink.save(&outcome.records, &category_slug(&name));
                    info!("Saved {} products from {}", outcome.records.len(), name);
                    all_products.extend(outcome.records);

                    self.sink.save(&all_products, ALL_PRODUCTS);
                    info!(
                        "Updated {}.json - Total products: {}",
                        ALL_PRODUCTS,
                        all_products.len()
                    );
                }
                None => summary.categories_skipped += 1,
            }
        }

        if all_products.is_empty() {
            warn!(
                "No products found with at least {}% discount",
                self.config.min_discount_percentage
            );
        }

        summary.total_products = all_products.len();
        info!(
            "Run finished: {} categories scraped, {} skipped, {} products",
            summary.categories_scraped, summary.categories_skipped, summary.total_products
        );
        info!("Results saved in {}", self.sink.output_dir().display());
        summary
    }
}
