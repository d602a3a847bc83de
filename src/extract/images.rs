//! Product image URL normalization.
//!
//! Thumbnails on a detail page point at resized variants such as
//! `.../I/41abc123._SX38_SY50_CR,0,0,38,50_.jpg`. Cutting the modifier
//! segment off the file name gives the full-size asset `.../I/41abc123.jpg`.

use std::collections::HashSet;

/// Path fragment shared by every product image on the media host
const PRODUCT_IMAGE_MARKER: &str = "images/I";

/// Substrings that mark decorative assets rather than product photos
const DECORATIVE_MARKERS: &[&str] = &["play-button", "sprite", "overlay", "icon"];

const KNOWN_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Rewrite a product image URL to its high-resolution variant.
///
/// Returns `None` for URLs that do not point into the product image store.
/// URLs that are already full size come back unchanged (with a `.jpg`
/// extension), so the rewrite is idempotent.
pub fn high_res_url(src: &str) -> Option<String> {
    let src = src.trim();
    if !src.contains(PRODUCT_IMAGE_MARKER) {
        return None;
    }

    let (dir, file) = src.rsplit_once('/')?;

    let mut stem = file;
    if let Some(idx) = stem.find("._") {
        stem = &stem[..idx];
    }
    if let Some(idx) = stem.find("_S") {
        stem = &stem[..idx];
    }
    for ext in KNOWN_EXTENSIONS {
        if let Some(stripped) = stem.strip_suffix(ext) {
            stem = stripped;
            break;
        }
    }
    let stem = stem.trim_end_matches('.');

    if stem.is_empty() {
        return None;
    }

    Some(format!("{dir}/{stem}.jpg"))
}

/// Whether a rewritten URL is a UI asset (play buttons, sprites, ...)
pub fn is_decorative(url: &str) -> bool {
    DECORATIVE_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Ordered, de-duplicated list of high-resolution image URLs
#[derive(Debug, Default)]
pub struct ImageSet {
    urls: Vec<String>,
    seen: HashSet<String>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, url: String, front: bool) -> bool {
        if !self.seen.insert(url.clone()) {
            return false;
        }
        if front {
            self.urls.insert(0, url);
        } else {
            self.urls.push(url);
        }
        true
    }

    /// Append an image if it is new. Returns whether it was added.
    pub fn push(&mut self, src: &str) -> bool {
        high_res_url(src).is_some_and(|url| self.insert(url, false))
    }

    /// Append a gallery thumbnail if it is new and not decorative
    pub fn push_thumbnail(&mut self, src: &str) -> bool {
        high_res_url(src)
            .filter(|url| !is_decorative(url))
            .is_some_and(|url| self.insert(url, false))
    }

    /// Put an image at the front if it is new. Returns whether it was added.
    pub fn push_front(&mut self, src: &str) -> bool {
        high_res_url(src).is_some_and(|url| self.insert(url, true))
    }

    pub fn into_vec(self) -> Vec<String> {
        self.urls
    }
}
