//! Field extraction helpers shared by the listing and detail parsers.
//!
//! A field is described by a [`Chain`] of selectors. Looking a field up walks
//! the chain in order and returns the first value a reader accepts, so a
//! missing element is an ordinary `None` rather than an error.

pub mod images;
pub mod price;

use scraper::{ElementRef, Selector};

use crate::error::ScrapeError;

/// Compile a single CSS selector, keeping the source text in the error
pub fn compile(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Ordered fallback selectors for one field
#[derive(Debug, Clone)]
pub struct Chain {
    selectors: Vec<Selector>,
}

impl Chain {
    pub fn parse<S: AsRef<str>>(sources: &[S]) -> Result<Self, ScrapeError> {
        let selectors = sources
            .iter()
            .map(|s| compile(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { selectors })
    }

    /// First value `read` accepts, trying every match of every selector in order
    pub fn first<'a, T>(
        &self,
        scope: ElementRef<'a>,
        read: impl Fn(ElementRef<'a>) -> Option<T>,
    ) -> Option<T> {
        self.selectors
            .iter()
            .find_map(|selector| scope.select(selector).find_map(&read))
    }

    /// First non-empty text value
    pub fn text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.first(scope, text_of)
    }
}

/// Visible text of an element with whitespace collapsed; `None` when blank
pub fn text_of(element: ElementRef<'_>) -> Option<String> {
    non_empty(element.text().collect::<Vec<_>>().join(" "))
}

/// Trimmed, non-empty attribute value
pub fn attr_of<'a>(element: ElementRef<'a>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn non_empty(raw: String) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Rank number from a "#N in Category" marker
pub fn parse_rank(text: &str) -> Option<String> {
    let (_, after) = text.split_once('#')?;
    let rank = after.split_whitespace().next()?;
    if rank.chars().any(|c| c.is_ascii_digit()) {
        Some(rank.to_string())
    } else {
        None
    }
}
