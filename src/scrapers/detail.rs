//! Product detail extraction.
//!
//! A listing row supplies the product name and link; the detail page is
//! opened in its own tab so the listing page keeps its pagination state. The
//! tab is closed again on every path out of [`DetailExtractor::extract`].

use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{BrowserError, ScrapeError};
use crate::extract::images::{ImageSet, high_res_url};
use crate::extract::price::{clean_price, join_price_parts, sale_discount};
use crate::extract::{Chain, attr_of, compile, parse_rank, text_of};
use crate::models::{ListingRow, ProductRecord};
use crate::traits::{Driver, SiteSelectors};

const MAIN_IMAGE_ATTRS: &[&str] = &["src", "data-old-hires"];

/// Everything read from a detail page. Every field is independent.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DetailFields {
    pub price: Option<f64>,
    pub sale_discount: Option<f64>,
    pub best_seller_rating: Option<String>,
    pub ship_from: Option<String>,
    pub sold_by: Option<String>,
    pub rating: Option<String>,
    pub description: Option<String>,
    pub bought_past_month: Option<String>,
    pub images: Vec<String>,
}

pub struct DetailExtractor {
    row_name: Chain,
    row_link: Chain,
    price_whole: Chain,
    price_fraction: Chain,
    original_price: Chain,
    sales_rank: Chain,
    ship_from: Chain,
    sold_by: Chain,
    rating: Chain,
    rating_text: Chain,
    description: Chain,
    bought_past_month: Chain,
    gallery_images: Selector,
    main_image: Selector,
    swatch_images: Selector,
    base_url: Url,
    min_discount: f64,
    settle: Duration,
}

impl DetailExtractor {
    pub fn new(selectors: &SiteSelectors, config: &Config) -> Result<Self, ScrapeError> {
        let base_url = Url::parse(&config.base_url).map_err(|source| ScrapeError::BaseUrl {
            url: config.base_url.clone(),
            source,
        })?;

        Ok(Self {
            row_name: Chain::parse(&selectors.row_name)?,
            row_link: Chain::parse(&selectors.row_link)?,
            price_whole: Chain::parse(&selectors.price_whole)?,
            price_fraction: Chain::parse(&selectors.price_fraction)?,
            original_price: Chain::parse(&selectors.original_price)?,
            sales_rank: Chain::parse(&selectors.sales_rank)?,
            ship_from: Chain::parse(&selectors.ship_from)?,
            sold_by: Chain::parse(&selectors.sold_by)?,
            rating: Chain::parse(&selectors.rating)?,
            rating_text: Chain::parse(&selectors.rating_text)?,
            description: Chain::parse(&selectors.description)?,
            bought_past_month: Chain::parse(&selectors.bought_past_month)?,
            gallery_images: compile(&selectors.gallery_images)?,
            main_image: compile(&selectors.main_image)?,
            swatch_images: compile(&selectors.swatch_images)?,
            base_url,
            min_discount: config.min_discount_percentage,
            settle: config.page_settle(),
        })
    }

    /// Build a record for one listing row, or `None` when the row cannot be
    /// read or the product is not discounted enough.
    pub async fn extract<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        row: &ListingRow,
        category_name: &str,
    ) -> Option<ProductRecord> {
        let (name, url) = self.read_row(row);

        let Some(product_name) = name else {
            error!("Could not find product name");
            return None;
        };
        let Some(url) = url else {
            warn!("No detail link for {}", product_name);
            return None;
        };

        let html = match self.fetch_detail(driver, &url).await {
            Ok(html) => html,
            Err(e) => {
                error!("Error getting product details for {}: {}", url, e);
                return None;
            }
        };

        let fields = self.parse_detail(&html);
        debug!("Total images found: {}", fields.images.len());

        let record = ProductRecord {
            category_name: category_name.to_string(),
            product_name,
            product_price: fields.price,
            sale_discount: fields.sale_discount,
            best_seller_rating: fields.best_seller_rating,
            ship_from: fields.ship_from,
            sold_by: fields.sold_by,
            rating: fields.rating,
            product_description: fields.description,
            number_bought_past_month: fields.bought_past_month,
            images: fields.images,
            url,
        };

        match record.sale_discount {
            Some(discount) if discount >= self.min_discount => {
                info!("Found product with {}% discount", discount);
                Some(record)
            }
            _ => {
                debug!(
                    "Skipping {} (discount {:?} below {}%)",
                    record.product_name, record.sale_discount, self.min_discount
                );
                None
            }
        }
    }

    /// Product name and absolute detail URL from a listing row
    pub fn read_row(&self, row: &ListingRow) -> (Option<String>, Option<String>) {
        let fragment = Html::parse_fragment(&row.html);
        let root = fragment.root_element();

        let name = self.row_name.text(root);
        let url = self
            .row_link
            .first(root, |el| attr_of(el, "href"))
            .and_then(|href| self.base_url.join(&href).ok())
            .map(String::from);

        (name, url)
    }

    /// Load `url` in a fresh tab and return its DOM, closing the tab afterwards
    async fn fetch_detail<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        url: &str,
    ) -> Result<String, BrowserError> {
        let before = driver.context_count();

        let result = async {
            driver.open_context(url).await?;
            sleep(self.settle).await;
            driver.content().await
        }
        .await;

        restore_contexts(driver, before).await;
        result
    }

    /// Read every field of a detail page; a missing field never affects the others
    pub fn parse_detail(&self, html: &str) -> DetailFields {
        let doc = Html::parse_document(html);
        let root = doc.root_element();

        let price = self
            .price_whole
            .first(root, raw_text_of)
            .map(|whole| {
                join_price_parts(&whole, self.price_fraction.first(root, raw_text_of).as_deref())
            })
            .and_then(|joined| clean_price(&joined));

        let original = self.original_price.text(root);
        if original.is_none() {
            debug!("No original price on page; treating discount as 0");
        }

        DetailFields {
            price,
            sale_discount: sale_discount(original.as_deref(), price),
            best_seller_rating: self
                .sales_rank
                .first(root, |el| text_of(el).and_then(|t| parse_rank(&t))),
            ship_from: self.ship_from.text(root),
            sold_by: self.sold_by.text(root),
            rating: self
                .rating
                .first(root, |el| attr_of(el, "title"))
                .or_else(|| self.rating_text.text(root)),
            description: self.description.text(root),
            bought_past_month: self.bought_past_month.text(root),
            images: self.collect_images(root),
        }
    }

    fn collect_images(&self, root: ElementRef<'_>) -> Vec<String> {
        let mut images = ImageSet::new();

        for img in root.select(&self.gallery_images) {
            if let Some(src) = attr_of(img, "src")
                && images.push_thumbnail(&src)
            {
                debug!("Added image: {}", src);
            }
        }

        let main = root.select(&self.main_image).find_map(|el| {
            MAIN_IMAGE_ATTRS
                .iter()
                .filter_map(|name| attr_of(el, name))
                .find(|src| high_res_url(src).is_some())
        });
        if let Some(src) = main
            && images.push_front(&src)
        {
            debug!("Added main image: {}", src);
        }

        for img in root.select(&self.swatch_images) {
            if let Some(src) = attr_of(img, "src")
                && images.push(&src)
            {
                debug!("Added color variation image: {}", src);
            }
        }

        images.into_vec()
    }
}

/// Close tabs until only `target` contexts remain
async fn restore_contexts<D: Driver + ?Sized>(driver: &mut D, target: usize) {
    while driver.context_count() > target {
        if let Err(e) = driver.close_context().await {
            warn!("Failed to close product tab: {}", e);
            break;
        }
    }
}

/// Concatenated text with no separators, for split price spans
fn raw_text_of(element: ElementRef<'_>) -> Option<String> {
    let text: String = element.text().collect::<String>().trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}
