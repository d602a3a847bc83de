//! Traits and interfaces for driving a browser against a best-seller site

use std::time::Duration;

use async_trait::async_trait;

use crate::error::BrowserError;

/// CSS selectors for every part of the site the scraper touches.
///
/// Fields that are `Vec<String>` are fallback chains: the first selector that
/// yields a usable value wins.
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Sign-in control in the navigation bar
    pub sign_in: String,
    /// Email input on the sign-in form
    pub email_input: String,
    /// "Continue" button after the email step
    pub continue_button: String,
    /// Password input on the sign-in form
    pub password_input: String,
    /// Final "Sign in" submit button
    pub sign_in_submit: String,
    /// Personalised account menu that only renders after a successful login
    pub logged_in_marker: String,

    /// Category banner holding the display name
    pub category_banner: Vec<String>,
    /// Suffix stripped from the banner text
    pub banner_suffix: String,
    /// One listing row (product tile)
    pub listing_row: String,
    /// Product name inside a listing row
    pub row_name: Vec<String>,
    /// Detail-page link inside a listing row
    pub row_link: Vec<String>,
    /// Pagination "next" list item, used to check whether it is disabled
    pub next_page_item: String,
    /// Clickable "next" link inside the pagination item
    pub next_page_link: String,
    /// Class marking the pagination item as disabled
    pub disabled_class: String,

    /// Whole part of the current price
    pub price_whole: Vec<String>,
    /// Fractional part of the current price
    pub price_fraction: Vec<String>,
    /// Strikethrough (original) price
    pub original_price: Vec<String>,
    /// Best-seller rank block
    pub sales_rank: Vec<String>,
    pub ship_from: Vec<String>,
    pub sold_by: Vec<String>,
    /// Element carrying the aggregate rating in its `title` attribute
    pub rating: Vec<String>,
    /// Fallback elements carrying the aggregate rating as text
    pub rating_text: Vec<String>,
    pub description: Vec<String>,
    pub bought_past_month: Vec<String>,

    /// Thumbnails in the alternate-images gallery
    pub gallery_images: String,
    /// Primary landing image
    pub main_image: String,
    /// Colour-variant swatches
    pub swatch_images: String,
}

/// A live browser, reduced to the handful of operations the scraper needs.
///
/// Implementations keep a stack of browsing contexts; every operation acts on
/// the top of the stack. `open_context` pushes a new tab and `close_context`
/// pops it, returning focus to the tab beneath.
#[async_trait]
pub trait Driver: Send {
    /// Navigate the active context
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Serialized DOM of the active context
    async fn content(&mut self) -> Result<String, BrowserError>;

    /// Block until `selector` matches in the active context or `timeout` elapses
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Click the first element matching `selector`
    async fn click(&mut self, selector: &str) -> Result<(), BrowserError>;

    /// Clear the input matching `selector` and type `value` into it
    async fn fill(&mut self, selector: &str, value: &str) -> Result<(), BrowserError>;

    /// Open `url` in a new tab and make it the active context
    async fn open_context(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Close the active tab and return focus to the previous one
    async fn close_context(&mut self) -> Result<(), BrowserError>;

    /// Number of open browsing contexts
    fn context_count(&self) -> usize;
}
