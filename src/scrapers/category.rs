//! Best-seller category traversal.
//!
//! One attempt resolves the category name, then pages through the listing
//! until the row budget is spent or there is no next page. Any error in an
//! attempt restarts the category from its entry URL, up to the configured
//! number of attempts; after that the category is skipped.
//!
//! Accepted records and the processed-row count carry over between attempts,
//! so the category snapshot on disk only ever grows. A record found again on a
//! retry is recognised by its URL and not added twice.

use scraper::{CaseSensitivity, Html, Selector};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::ScrapeError;
use crate::extract::{Chain, compile};
use crate::models::{CategoryOutcome, ListingRow, ProductRecord};
use crate::scrapers::detail::DetailExtractor;
use crate::storage::{JsonSink, category_slug};
use crate::traits::{Driver, SiteSelectors};

/// State of the pagination control on a listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    Available,
    Disabled,
    Absent,
}

#[derive(Debug)]
pub struct ListingPage {
    pub rows: Vec<ListingRow>,
    pub next: NextPage,
}

/// Work done on one category so far, shared by all of its attempts
#[derive(Debug, Default)]
struct Progress {
    records: Vec<ProductRecord>,
    processed: usize,
}

impl Progress {
    fn accept(&mut self, record: ProductRecord) -> bool {
        if self.records.iter().any(|r| r.url == record.url) {
            return false;
        }
        self.records.push(record);
        true
    }
}

pub struct CategoryWalker<'a> {
    config: &'a Config,
    selectors: &'a SiteSelectors,
    extractor: &'a DetailExtractor,
    sink: &'a JsonSink,
    banner: Chain,
    banner_wait: String,
    listing_row: Selector,
    next_page_item: Selector,
    next_page_link: Selector,
}

impl<'a> CategoryWalker<'a> {
    pub fn new(
        config: &'a Config,
        selectors: &'a SiteSelectors,
        extractor: &'a DetailExtractor,
        sink: &'a JsonSink,
    ) -> Result<Self, ScrapeError> {
        Ok(Self {
            config,
            selectors,
            extractor,
            sink,
            banner: Chain::parse(&selectors.category_banner)?,
            banner_wait: selectors.category_banner.join(", "),
            listing_row: compile(&selectors.listing_row)?,
            next_page_item: compile(&selectors.next_page_item)?,
            next_page_link: compile(&selectors.next_page_link)?,
        })
    }

    /// Scrape one category, retrying the whole category on failure
    pub async fn scrape_category<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        entry_url: &str,
    ) -> CategoryOutcome {
        let attempts = self.config.category_attempts.max(1);
        let mut progress = Progress::default();

        for attempt in 1..=attempts {
            match self.attempt(driver, entry_url, &mut progress).await {
                Ok(name) => {
                    return CategoryOutcome {
                        records: progress.records,
                        category_name: Some(name),
                    };
                }
                Err(e) => {
                    error!(
                        "Error scraping category {} (attempt {}/{}): {}",
                        entry_url, attempt, attempts, e
                    );
                    if attempt < attempts {
                        sleep(self.config.retry_delay()).await;
                    }
                }
            }
        }

        warn!("Giving up on category {}", entry_url);
        CategoryOutcome::skipped()
    }

    async fn attempt<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        entry_url: &str,
        progress: &mut Progress,
    ) -> Result<String, ScrapeError> {
        driver.goto(entry_url).await?;
        sleep(self.config.page_settle()).await;

        let name = self.resolve_name(driver, entry_url).await?;
        let scope = category_slug(&name);
        info!("Started scraping category: {}", name);

        let cap = self.config.max_products_per_category;
        let mut page = 1usize;

        while progress.processed < cap {
            info!("Processing page {} of {}", page, name);

            driver
                .wait_for(&self.selectors.listing_row, self.config.listing_wait())
                .await?;
            let listing = self.parse_listing(&driver.content().await?);
            if listing.rows.is_empty() {
                return Err(ScrapeError::NoListings(page));
            }
            info!("Found {} products on page {}", listing.rows.len(), page);

            for row in &listing.rows {
                if let Some(record) = self.extractor.extract(driver, row, &name).await {
                    let (product, discount) = (record.product_name.clone(), record.sale_discount);
                    if progress.accept(record) {
                        info!("Found discounted product: {} - {:?}% off", product, discount);
                        self.sink.save(&progress.records, &scope);
                    } else {
                        debug!("Already recorded {}", product);
                    }
                }

                progress.processed += 1;
                if progress.processed >= cap {
                    break;
                }
            }

            if progress.processed >= cap {
                info!("Reached the limit of {} products for {}", cap, name);
                break;
            }

            if listing.next != NextPage::Available {
                info!("No more pages available for {}", name);
                break;
            }
            if let Err(e) = driver.click(&self.selectors.next_page_link).await {
                info!("No more pages available for {} ({})", name, e);
                break;
            }
            page += 1;
            sleep(self.config.page_settle()).await;
        }

        info!(
            "Completed scraping {}. Found {} products with at least {}% discount",
            name,
            progress.records.len(),
            self.config.min_discount_percentage
        );

        Ok(name)
    }

    async fn resolve_name<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        entry_url: &str,
    ) -> Result<String, ScrapeError> {
        driver
            .wait_for(&self.banner_wait, self.config.listing_wait())
            .await?;
        let html = driver.content().await?;

        self.category_name(&html)
            .ok_or_else(|| ScrapeError::MissingBanner(entry_url.to_string()))
    }

    /// Display name from the category banner, without the fixed suffix
    pub fn category_name(&self, html: &str) -> Option<String> {
        let doc = Html::parse_document(html);
        let banner = self.banner.text(doc.root_element())?;
        let name = banner.replace(&self.selectors.banner_suffix, "").trim().to_string();

        if name.is_empty() { None } else { Some(name) }
    }

    /// Rows and pagination state of one listing page
    pub fn parse_listing(&self, html: &str) -> ListingPage {
        let doc = Html::parse_document(html);

        let rows = doc
            .select(&self.listing_row)
            .map(|el| ListingRow { html: el.html() })
            .collect();

        let next = match doc.select(&self.next_page_item).next() {
            None => NextPage::Absent,
            Some(item) => {
                let disabled = item
                    .value()
                    .has_class(&self.selectors.disabled_class, CaseSensitivity::CaseSensitive);
                if !disabled && item.select(&self.next_page_link).next().is_some() {
                    NextPage::Available
                } else {
                    NextPage::Disabled
                }
            }
        };

        ListingPage { rows, next }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScrapeSnapshot;
    use crate::scrapers::amazon;
    use crate::testing::{FakeDriver, test_config};

    const ENTRY: &str = "https://shop.test/gp/bestsellers/kitchen/";

    fn page_url(n: usize) -> String {
        format!("{ENTRY}?pg={n}")
    }

    fn listing_html(ids: &[String], next: Option<bool>) -> String {
        let rows: String = ids
            .iter()
            .map(|id| {
                format!(
                    r#"<div id="gridItemRoot"><div class="a-cardui _cDEzb_grid-cell_1uMOS zg-grid-general-faceout">
                        <a class="a-link-normal aok-block" href="/item-{id}/dp/{id}/">
                        <div class="_cDEzb_p13n-sc-css-line-clamp-3_g3dy1">Item {id}</div></a>
                    </div></div>"#
                )
            })
            .collect();
        let pagination = match next {
            Some(true) => r#"<ul class="a-pagination"><li class="a-last"><a href="?pg=next">Next page</a></li></ul>"#,
            Some(false) => r#"<ul class="a-pagination"><li class="a-disabled a-last">Next page</li></ul>"#,
            None => "",
        };
        format!(
            r#"<html><body><div id="zg_banner_text">Home &amp; Kitchen Best Sellers</div>{rows}{pagination}</body></html>"#
        )
    }

    fn detail_html(current: u32, original: u32) -> String {
        format!(
            r#"<span class="a-price-whole">{current}.</span><span class="a-price-fraction">00</span>
               <span class="a-text-price"><span class="a-offscreen">₹{original}.00</span></span>"#
        )
    }

    /// Register `pages` listing pages of `per_page` rows each. Rows for which
    /// `deep` returns true (by zero-based position) are 60% off, others 20%.
    fn category_site(
        driver: &mut FakeDriver,
        pages: usize,
        per_page: usize,
        deep: impl Fn(usize) -> bool,
    ) {
        let mut index = 0;
        for p in 1..=pages {
            let ids: Vec<String> = (0..per_page)
                .map(|_| {
                    index += 1;
                    format!("P{index}")
                })
                .collect();

            for (offset, id) in ids.iter().enumerate() {
                let global = (p - 1) * per_page + offset;
                let current = if deep(global) { 400 } else { 800 };
                driver.page(&format!("https://shop.test/item-{id}/dp/{id}/"), &detail_html(current, 1000));
            }

            let url = if p == 1 { ENTRY.to_string() } else { page_url(p) };
            driver.page(&url, &listing_html(&ids, Some(p < pages)));
            if p < pages {
                driver.link(&url, "li.a-last a", &page_url(p + 1));
            }
        }
    }

    fn even(i: usize) -> bool {
        i % 2 == 0
    }

    struct Fixture {
        config: Config,
        selectors: SiteSelectors,
        extractor: DetailExtractor,
        sink: JsonSink,
        _dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new(cap: usize) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut config = test_config();
            config.max_products_per_category = cap;
            let selectors = amazon::selectors();
            let extractor = DetailExtractor::new(&selectors, &config).unwrap();
            Self {
                sink: JsonSink::new(dir.path()),
                config,
                selectors,
                extractor,
                _dir: dir,
            }
        }

        fn walker(&self) -> CategoryWalker<'_> {
            CategoryWalker::new(&self.config, &self.selectors, &self.extractor, &self.sink).unwrap()
        }

        fn snapshot(&self, scope: &str) -> ScrapeSnapshot {
            let raw = std::fs::read_to_string(self.sink.path_for(scope)).unwrap();
            serde_json::from_str(&raw).unwrap()
        }
    }

    #[test]
    fn banner_suffix_is_stripped() {
        let fx = Fixture::new(10);
        let name = fx.walker().category_name(&listing_html(&[], None));
        assert_eq!(name.as_deref(), Some("Home & Kitchen"));
    }

    #[test]
    fn pagination_state_is_detected() {
        let fx = Fixture::new(10);
        let walker = fx.walker();
        let ids = vec!["A".to_string()];

        assert_eq!(walker.parse_listing(&listing_html(&ids, Some(true))).next, NextPage::Available);
        assert_eq!(walker.parse_listing(&listing_html(&ids, Some(false))).next, NextPage::Disabled);
        assert_eq!(walker.parse_listing(&listing_html(&ids, None)).next, NextPage::Absent);
        assert_eq!(walker.parse_listing(&listing_html(&ids, None)).rows.len(), 1);
    }

    #[tokio::test]
    async fn walks_every_page_and_keeps_discounted_rows() {
        let fx = Fixture::new(1500);
        let mut driver = FakeDriver::new();
        category_site(&mut driver, 3, 4, even);

        let outcome = fx.walker().scrape_category(&mut driver, ENTRY).await;

        assert_eq!(outcome.category_name.as_deref(), Some("Home & Kitchen"));
        assert_eq!(driver.opened.len(), 12);
        assert_eq!(outcome.records.len(), 6);
        assert!(outcome.records.iter().all(|r| r.sale_discount == Some(60.0)));
        assert_eq!(driver.context_count(), 1);
    }

    #[tokio::test]
    async fn stops_at_the_row_budget() {
        let fx = Fixture::new(1500);
        let mut driver = FakeDriver::new();
        category_site(&mut driver, 31, 50, |_| false);

        let outcome = fx.walker().scrape_category(&mut driver, ENTRY).await;

        assert_eq!(driver.opened.len(), 1500);
        assert_eq!(driver.opened.last().unwrap(), "https://shop.test/item-P1500/dp/P1500/");
        assert!(!driver.visits.iter().any(|u| u == &page_url(31)));
        assert!(outcome.records.is_empty());
        assert_eq!(driver.clicks.len(), 29);
    }

    #[tokio::test]
    async fn budget_can_end_mid_page() {
        let fx = Fixture::new(5);
        let mut driver = FakeDriver::new();
        category_site(&mut driver, 3, 3, even);

        fx.walker().scrape_category(&mut driver, ENTRY).await;

        assert_eq!(driver.opened.len(), 5);
        assert_eq!(driver.clicks.len(), 1);
    }

    #[tokio::test]
    async fn retries_until_an_attempt_succeeds() {
        let fx = Fixture::new(1500);
        let mut driver = FakeDriver::new();
        category_site(&mut driver, 1, 2, even);
        driver.fail_navigation(ENTRY, 2);

        let outcome = fx.walker().scrape_category(&mut driver, ENTRY).await;

        assert_eq!(driver.visits.iter().filter(|u| *u == ENTRY).count(), 3);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.category_name.as_deref(), Some("Home & Kitchen"));
    }

    #[tokio::test]
    async fn gives_up_after_the_last_attempt() {
        let fx = Fixture::new(1500);
        let mut driver = FakeDriver::new();
        driver.page(ENTRY, "<html><body><p>Sorry, something went wrong</p></body></html>");

        let outcome = fx.walker().scrape_category(&mut driver, ENTRY).await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.category_name, None);
        assert_eq!(driver.visits.iter().filter(|u| *u == ENTRY).count(), 3);
    }

    #[tokio::test]
    async fn retry_keeps_records_saved_by_earlier_attempts() {
        let fx = Fixture::new(1500);
        let mut driver = FakeDriver::new();
        category_site(&mut driver, 2, 3, |_| true);
        driver.fail_content(&page_url(2), 1);

        let outcome = fx.walker().scrape_category(&mut driver, ENTRY).await;

        // the first attempt saved P1..P3 before page 2 failed
        assert_eq!(driver.visits.iter().filter(|u| *u == ENTRY).count(), 2);
        let urls: Vec<_> = outcome.records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            (1..=6)
                .map(|i| format!("https://shop.test/item-P{i}/dp/P{i}/"))
                .collect::<Vec<_>>()
        );
        let snapshot = fx.snapshot("home_&_kitchen");
        assert_eq!(snapshot.total_products, 6);
        assert_eq!(snapshot.products, outcome.records);
    }

    #[tokio::test]
    async fn failed_retries_leave_the_saved_snapshot_in_place() {
        let fx = Fixture::new(1500);
        let mut driver = FakeDriver::new();
        category_site(&mut driver, 2, 3, |_| true);
        driver.break_content(&page_url(2));

        let outcome = fx.walker().scrape_category(&mut driver, ENTRY).await;

        assert_eq!(outcome.category_name, None);
        assert_eq!(driver.visits.iter().filter(|u| *u == ENTRY).count(), 3);
        let snapshot = fx.snapshot("home_&_kitchen");
        assert_eq!(snapshot.total_products, 3);
        assert_eq!(snapshot.products[2].url, "https://shop.test/item-P3/dp/P3/");
    }

    #[tokio::test]
    async fn snapshot_tracks_accepted_records_as_they_arrive() {
        let fx = Fixture::new(1500);
        let mut driver = FakeDriver::new();
        category_site(&mut driver, 1, 5, even);
        driver.break_content("https://shop.test/item-P5/dp/P5/");

        let outcome = fx.walker().scrape_category(&mut driver, ENTRY).await;

        // P1 and P3 are discounted; P5 would be but its page fails
        assert_eq!(outcome.records.len(), 2);
        let snapshot = fx.snapshot("home_&_kitchen");
        assert_eq!(snapshot.total_products, 2);
        assert_eq!(snapshot.products, outcome.records);
        assert_eq!(driver.context_count(), 1);
    }
}
