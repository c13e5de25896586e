use clap::Args;
use zoodir_core::{decode_filters, DistanceFilter, FilterSpec, PriceRange, RatingFilter};

/// Filter flags shared by `filter` and `share`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterFlags {
    /// Accept this zoo type (repeat for OR)
    #[arg(long = "zoo-type", value_name = "TYPE")]
    pub zoo_types: Vec<String>,

    /// Accept listings with this animal species or category (repeat for OR)
    #[arg(long = "animal", value_name = "NAME")]
    pub animal_types: Vec<String>,

    /// Accept listings offering this amenity (repeat for OR)
    #[arg(long = "amenity", value_name = "NAME")]
    pub amenities: Vec<String>,

    /// Maximum distance in miles from the visitor, or "all"
    #[arg(long, value_name = "MILES")]
    pub distance: Option<String>,

    /// Price bucket: all, free, low, medium or high
    #[arg(long, value_name = "BUCKET")]
    pub price: Option<String>,

    /// Minimum mean rating, e.g. "4+", or "all"
    #[arg(long, value_name = "N+")]
    pub rating: Option<String>,

    /// Start from an encoded `filters` URL parameter; other flags add to it
    #[arg(long = "filters", value_name = "ENCODED")]
    pub encoded: Option<String>,
}

/// Filter spec built from flags, plus warnings for flags that were ignored
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFilters {
    pub spec: FilterSpec,
    pub warnings: Vec<String>,
}

fn extend_unique(target: &mut Vec<String>, values: &[String]) {
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !target.iter().any(|existing| existing == value) {
            target.push(value.to_string());
        }
    }
}

fn parse_distance(raw: &str) -> Option<DistanceFilter> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("all") {
        return Some(DistanceFilter::All);
    }
    raw.parse::<u32>().ok().filter(|miles| *miles > 0).map(DistanceFilter::Within)
}

fn parse_price(raw: &str) -> Option<PriceRange> {
    let raw = raw.trim().to_lowercase();
    match PriceRange::parse_lenient(&raw) {
        PriceRange::All if raw != "all" => None,
        range => Some(range),
    }
}

fn parse_rating(raw: &str) -> Option<RatingFilter> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("all") {
        return Some(RatingFilter::All);
    }
    raw.strip_suffix('+')
        .unwrap_or(raw)
        .parse::<u32>()
        .ok()
        .filter(|stars| (1..=5).contains(stars))
        .map(RatingFilter::AtLeast)
}

/// Build a filter spec from command-line flags.
/// Malformed scalar flags are ignored with a warning, like malformed URL state.
pub fn build_filter_spec(flags: &FilterFlags) -> ParsedFilters {
    let mut spec = flags
        .encoded
        .as_deref()
        .map(decode_filters)
        .unwrap_or_default();
    let mut warnings = Vec::new();

    extend_unique(&mut spec.zoo_types, &flags.zoo_types);
    extend_unique(&mut spec.animal_types, &flags.animal_types);
    extend_unique(&mut spec.amenities, &flags.amenities);

    if let Some(raw) = &flags.distance {
        match parse_distance(raw) {
            Some(distance) => spec.distance = distance,
            None => warnings.push(format!(
                "Invalid distance '{}'. Expected a number of miles or 'all'",
                raw
            )),
        }
    }

    if let Some(raw) = &flags.price {
        match parse_price(raw) {
            Some(price_range) => spec.price_range = price_range,
            None => warnings.push(format!(
                "Invalid price '{}'. Expected all, free, low, medium or high",
                raw
            )),
        }
    }

    if let Some(raw) = &flags.rating {
        match parse_rating(raw) {
            Some(rating) => spec.rating = rating,
            None => warnings.push(format!(
                "Invalid rating '{}'. Expected 1+ to 5+ or 'all'",
                raw
            )),
        }
    }

    ParsedFilters { spec, warnings }
}
