use crate::error::ZooError;
use crate::filtering::{listing_price, mean_approved_rating};
use crate::models::Listing;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

static LEADING_ARTICLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)(the|a|an|der|die|das|le|la|les|el|los|las|il|lo|i|gli|un|une|een)\s+")
        .expect("article pattern compiles")
});

/// Orderings offered for result lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    /// Cheapest first
    Price,
    /// Best rated first
    Rating,
}

impl FromStr for SortKey {
    type Err = ZooError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "price" => Ok(SortKey::Price),
            "rating" => Ok(SortKey::Rating),
            other => Err(ZooError::UnknownSortKey(other.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Name => "name",
            SortKey::Price => "price",
            SortKey::Rating => "rating",
        })
    }
}

/// Sort listings in place. The sort is stable; price and rating ties are
/// broken by name.
pub fn sort_listings(listings: &mut [Listing], key: SortKey) {
    listings.sort_by(|a, b| match key {
        SortKey::Name => compare_names(&a.name, &b.name),
        SortKey::Price => listing_price(a)
            .total_cmp(&listing_price(b))
            .then_with(|| compare_names(&a.name, &b.name)),
        SortKey::Rating => mean_approved_rating(&b.reviews)
            .total_cmp(&mean_approved_rating(&a.reviews))
            .then_with(|| compare_names(&a.name, &b.name)),
    });
}

/// Library-style comparison: normalized form first, raw name for ties
fn compare_names(a: &str, b: &str) -> Ordering {
    normalize_for_sorting(a)
        .cmp(&normalize_for_sorting(b))
        .then_with(|| a.cmp(b))
}

/// Normalize a name for library science sorting
/// - Strip leading articles (a, an, the, and common European equivalents)
/// - Normalize unicode (NFD then lowercase)
/// - Collapse whitespace
pub fn normalize_for_sorting(s: &str) -> String {
    let without_articles = strip_leading_articles(s);
    let normalized: String = without_articles.nfd().collect::<String>().to_lowercase();
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn strip_leading_articles(s: &str) -> String {
    LEADING_ARTICLE.replace(s, "").to_string()
}
