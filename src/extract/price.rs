//! Price parsing and discount arithmetic

const CURRENCY_SYMBOLS: &[char] = &['₹', '$', '€', '£', '¥'];

/// Parse a displayed price such as `"₹1,234.50"` into a number.
///
/// Currency symbols, thousands separators and whitespace are dropped. Returns
/// `None` for anything that does not leave a finite, non-negative number.
pub fn clean_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c))
        .collect();

    if cleaned.is_empty() || cleaned == "." {
        return None;
    }

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Join the whole and fractional price spans into one price string.
///
/// The whole part is rendered with a trailing decimal point on the site; when
/// no fraction is available the price is completed with `.00`.
pub fn join_price_parts(whole: &str, fraction: Option<&str>) -> String {
    let whole = whole.trim().trim_end_matches('.');
    if whole.contains('.') {
        return whole.to_string();
    }

    let fraction = fraction
        .map(str::trim)
        .filter(|f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or("00");

    format!("{whole}.{fraction}")
}

/// Round to two decimal places, ties to even
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Percentage saved going from `original` to `current`, when there is a saving
pub fn discount_percentage(original: f64, current: f64) -> Option<f64> {
    if original > current && original > 0.0 {
        Some(round2((original - current) / original * 100.0))
    } else {
        None
    }
}

/// Discount for a detail page.
///
/// `original_text` is `None` when the strikethrough price element is absent
/// altogether; that counts as zero discount. A present but unusable original
/// price, or one that is not above the current price, yields `None`.
pub fn sale_discount(original_text: Option<&str>, current: Option<f64>) -> Option<f64> {
    let Some(original_text) = original_text else {
        return Some(0.0);
    };

    match (clean_price(original_text), current) {
        (Some(original), Some(current)) => discount_percentage(original, current),
        _ => None,
    }
}
