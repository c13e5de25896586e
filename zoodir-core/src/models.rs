use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::ZooError;

/// Outcome of sanitizing one piece of CMS data.
///
/// `data` is always safe to use, even when `is_valid` is false. `errors`
/// describe input that could not serve its purpose; `warnings` describe
/// input that was usable but had to be defaulted or corrected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation<T> {
    pub is_valid: bool,
    pub data: T,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl<T> Validation<T> {
    pub fn valid(data: T) -> Self {
        Self {
            is_valid: true,
            data,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn invalid(data: T, error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            data,
            errors: vec![error.into()],
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// A bare latitude/longitude pair, e.g. the visitor's position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_in_range(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Parses `"lat,lng"`
impl FromStr for Coordinates {
    type Err = ZooError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ZooError::InvalidCoordinates(s.to_string());

        let (lat, lng) = s.split_once(',').ok_or_else(invalid)?;
        let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;

        let coords = Coordinates::new(lat, lng);
        if coords.is_in_range() {
            Ok(coords)
        } else {
            Err(invalid())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

impl Location {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

fn default_slug_type() -> String {
    "slug".to_string()
}

fn default_image_type() -> String {
    "image".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slug {
    pub current: Option<String>,
    #[serde(rename = "_type", default = "default_slug_type")]
    pub kind: String,
}

impl Slug {
    /// Placeholder for listings that cannot be linked to
    pub fn missing() -> Self {
        Self {
            current: None,
            kind: default_slug_type(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub asset: Value,
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspot: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<Value>,
    #[serde(rename = "_type", default = "default_image_type")]
    pub kind: String,
}

impl Image {
    /// CMS asset identifier, e.g. `image-abc123-400x300-jpg`.
    /// Accepts both unexpanded references (`_ref`) and expanded assets (`_id`).
    pub fn asset_ref(&self) -> Option<&str> {
        match &self.asset {
            Value::Object(asset) => asset
                .get("_ref")
                .or_else(|| asset.get("_id"))
                .and_then(Value::as_str),
            Value::String(reference) => Some(reference.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adult: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub senior: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Pricing {
    pub fn has_any_price(&self) -> bool {
        self.adult.is_some() || self.child.is_some() || self.senior.is_some() || self.group.is_some()
    }
}

/// Remove `key` from `map` and keep it only if it is a non-empty string
fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_approved: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Review {
    /// Lenient conversion; only JSON numbers count as ratings and only
    /// JSON booleans count as approval flags.
    pub fn from_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            return Self::default();
        };

        let mut extra = fields.clone();
        let rating = extra.remove("rating").and_then(|v| v.as_f64());
        let is_approved = extra.remove("isApproved").and_then(|v| v.as_bool());

        Self {
            rating,
            is_approved,
            extra,
        }
    }

    /// Approval defaults to true when the flag is absent
    pub fn is_approved(&self) -> bool {
        self.is_approved != Some(false)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Animal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Animal {
    pub fn from_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            return Self::default();
        };

        let mut extra = fields.clone();
        Self {
            name: take_string(&mut extra, "name"),
            species: take_string(&mut extra, "species"),
            category: take_string(&mut extra, "category"),
            extra,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Amenity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Amenity {
    pub fn from_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            return Self::default();
        };

        let mut extra = fields.clone();
        Self {
            name: take_string(&mut extra, "name"),
            description: take_string(&mut extra, "description"),
            category: take_string(&mut extra, "category"),
            extra,
        }
    }
}

/// A petting zoo (or legacy "property") after sanitization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub location: Option<Location>,
    pub main_image: Option<Image>,
    pub images: Vec<Image>,
    pub admission_price: Option<Pricing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_night: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoo_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub reviews: Vec<Review>,
    pub amenities: Vec<Amenity>,
    pub animals: Vec<Animal>,
    pub contact_info: Map<String, Value>,
    pub hours: Map<String, Value>,
    pub website: Option<String>,
    pub phone: Option<String>,
}

impl Listing {
    pub const DEFAULT_NAME: &'static str = "Unnamed Petting Zoo";

    /// Stand-in used when the raw record is not an object at all
    pub fn fallback(id: String) -> Self {
        Self {
            id,
            name: Self::DEFAULT_NAME.to_string(),
            slug: Slug::missing(),
            description: "Information not available".to_string(),
            location: None,
            main_image: None,
            images: Vec::new(),
            admission_price: None,
            price_per_night: None,
            zoo_type: None,
            address: None,
            reviews: Vec::new(),
            amenities: Vec::new(),
            animals: Vec::new(),
            contact_info: Map::new(),
            hours: Map::new(),
            website: None,
            phone: None,
        }
    }
}

/// Result of sanitizing a whole API response
#[derive(Debug, Clone, PartialEq)]
pub enum SanitizedPayload {
    /// An array of records, or a wrapper object holding one.
    /// Wrapper keys other than the record arrays are kept in `extra`.
    Collection {
        listings: Vec<Listing>,
        extra: Map<String, Value>,
    },
    Single(Listing),
}

impl SanitizedPayload {
    pub fn listings(&self) -> &[Listing] {
        match self {
            SanitizedPayload::Collection { listings, .. } => listings,
            SanitizedPayload::Single(listing) => std::slice::from_ref(listing),
        }
    }

    pub fn into_listings(self) -> Vec<Listing> {
        match self {
            SanitizedPayload::Collection { listings, .. } => listings,
            SanitizedPayload::Single(listing) => vec![listing],
        }
    }
}

/// Parse the leading run of ASCII digits, the way form values like
/// `"25"` or `"4+"` are read.
fn leading_number(s: &str) -> Option<u32> {
    let s = s.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

fn number_value(value: &Value) -> Option<u32> {
    value
        .as_f64()
        .filter(|n| n.is_finite() && *n >= 0.0 && *n <= u32::MAX as f64)
        .map(|n| n.trunc() as u32)
}

/// Filter values travel as strings (`"all"`, `"25"`, `"low"`, `"4+"`).
/// Anything unrecognised deserializes as "no constraint".
macro_rules! lenient_string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = Value::deserialize(deserializer)?;
                Ok(<$ty>::from_value(&value))
            }
        }
    };
}

/// Maximum distance in miles from the visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceFilter {
    #[default]
    All,
    Within(u32),
}

impl DistanceFilter {
    pub fn parse_lenient(s: &str) -> Self {
        if s == "all" {
            return DistanceFilter::All;
        }
        leading_number(s)
            .map(DistanceFilter::Within)
            .unwrap_or(DistanceFilter::All)
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::parse_lenient(s),
            Value::Number(_) => number_value(value)
                .map(DistanceFilter::Within)
                .unwrap_or(DistanceFilter::All),
            _ => DistanceFilter::All,
        }
    }

    pub fn is_active(&self) -> bool {
        *self != DistanceFilter::All
    }
}

impl fmt::Display for DistanceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceFilter::All => write!(f, "all"),
            DistanceFilter::Within(miles) => write!(f, "{}", miles),
        }
    }
}

lenient_string_serde!(DistanceFilter);

/// Admission price buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceRange {
    #[default]
    All,
    Free,
    Low,
    Medium,
    High,
}

impl PriceRange {
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "free" => PriceRange::Free,
            "low" => PriceRange::Low,
            "medium" => PriceRange::Medium,
            "high" => PriceRange::High,
            _ => PriceRange::All,
        }
    }

    fn from_value(value: &Value) -> Self {
        value
            .as_str()
            .map(Self::parse_lenient)
            .unwrap_or(PriceRange::All)
    }

    pub fn is_active(&self) -> bool {
        *self != PriceRange::All
    }

    /// Whether `price` falls inside this bucket
    pub fn contains(&self, price: f64) -> bool {
        match self {
            PriceRange::All => true,
            PriceRange::Free => price == 0.0,
            PriceRange::Low => price > 0.0 && price < 10.0,
            PriceRange::Medium => (10.0..=25.0).contains(&price),
            PriceRange::High => price > 25.0,
        }
    }

    /// Human-readable label used in result summaries
    pub fn label(&self) -> Option<&'static str> {
        match self {
            PriceRange::All => None,
            PriceRange::Free => Some("free"),
            PriceRange::Low => Some("under £10"),
            PriceRange::Medium => Some("£10-£25"),
            PriceRange::High => Some("over £25"),
        }
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriceRange::All => "all",
            PriceRange::Free => "free",
            PriceRange::Low => "low",
            PriceRange::Medium => "medium",
            PriceRange::High => "high",
        };
        f.write_str(s)
    }
}

lenient_string_serde!(PriceRange);

/// Minimum mean review rating, written `"N+"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatingFilter {
    #[default]
    All,
    AtLeast(u32),
}

impl RatingFilter {
    pub fn parse_lenient(s: &str) -> Self {
        if s == "all" {
            return RatingFilter::All;
        }
        leading_number(s)
            .map(RatingFilter::AtLeast)
            .unwrap_or(RatingFilter::All)
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::parse_lenient(s),
            Value::Number(_) => number_value(value)
                .map(RatingFilter::AtLeast)
                .unwrap_or(RatingFilter::All),
            _ => RatingFilter::All,
        }
    }

    pub fn is_active(&self) -> bool {
        *self != RatingFilter::All
    }
}

impl fmt::Display for RatingFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatingFilter::All => write!(f, "all"),
            RatingFilter::AtLeast(min) => write!(f, "{}+", min),
        }
    }
}

lenient_string_serde!(RatingFilter);

fn lenient_string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(values) => values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// User-selected criteria. Every field defaults to "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    #[serde(deserialize_with = "lenient_string_list")]
    pub zoo_types: Vec<String>,
    #[serde(deserialize_with = "lenient_string_list")]
    pub animal_types: Vec<String>,
    #[serde(deserialize_with = "lenient_string_list")]
    pub amenities: Vec<String>,
    pub distance: DistanceFilter,
    pub price_range: PriceRange,
    pub rating: RatingFilter,
}

/// Distinct values offered by the filter panel
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub zoo_types: Vec<String>,
    pub animal_types: Vec<String>,
    pub amenities: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_spec_defaults_for_missing_fields() {
        let spec: FilterSpec = serde_json::from_value(json!({"zooTypes": ["farm"]})).unwrap();
        assert_eq!(spec.zoo_types, vec!["farm".to_string()]);
        assert!(spec.animal_types.is_empty());
        assert_eq!(spec.distance, DistanceFilter::All);
        assert_eq!(spec.price_range, PriceRange::All);
        assert_eq!(spec.rating, RatingFilter::All);
    }

    #[test]
    fn test_malformed_filter_values_mean_no_constraint() {
        let spec: FilterSpec = serde_json::from_value(json!({
            "zooTypes": "farm",
            "amenities": [1, "Parking", null],
            "distance": "far",
            "priceRange": "cheap",
            "rating": true
        }))
        .unwrap();

        assert!(spec.zoo_types.is_empty());
        assert_eq!(spec.amenities, vec!["Parking".to_string()]);
        assert_eq!(spec.distance, DistanceFilter::All);
        assert_eq!(spec.price_range, PriceRange::All);
        assert_eq!(spec.rating, RatingFilter::All);
    }

    #[test]
    fn test_filter_values_serialize_as_strings() {
        let spec = FilterSpec {
            distance: DistanceFilter::Within(25),
            price_range: PriceRange::Medium,
            rating: RatingFilter::AtLeast(4),
            ..Default::default()
        };
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["distance"], json!("25"));
        assert_eq!(value["priceRange"], json!("medium"));
        assert_eq!(value["rating"], json!("4+"));
    }

    #[test]
    fn test_numeric_distance_is_accepted() {
        let spec: FilterSpec = serde_json::from_value(json!({"distance": 50})).unwrap();
        assert_eq!(spec.distance, DistanceFilter::Within(50));
    }

    #[test]
    fn test_price_buckets_do_not_overlap() {
        assert!(PriceRange::Free.contains(0.0));
        assert!(!PriceRange::Low.contains(0.0));
        assert!(PriceRange::Low.contains(9.99));
        assert!(!PriceRange::Low.contains(10.0));
        assert!(PriceRange::Medium.contains(10.0));
        assert!(PriceRange::Medium.contains(25.0));
        assert!(!PriceRange::High.contains(25.0));
        assert!(PriceRange::High.contains(25.01));
    }

    #[test]
    fn test_coordinates_from_str() {
        let coords: Coordinates = "51.5, -0.12".parse().unwrap();
        assert_eq!(coords, Coordinates::new(51.5, -0.12));
        assert!("91,0".parse::<Coordinates>().is_err());
        assert!("north".parse::<Coordinates>().is_err());
    }

    #[test]
    fn test_review_approval_defaults_to_true() {
        let review = Review::from_value(&json!({"rating": 4, "reviewText": "Lovely goats"}));
        assert!(review.is_approved());
        assert_eq!(review.rating, Some(4.0));
        assert_eq!(review.extra.get("reviewText"), Some(&json!("Lovely goats")));

        let rejected = Review::from_value(&json!({"rating": 2, "isApproved": false}));
        assert!(!rejected.is_approved());
    }

    #[test]
    fn test_image_asset_ref_variants() {
        let image = Image {
            asset: json!({"_ref": "image-abc-10x10-png"}),
            alt: "x".to_string(),
            caption: None,
            hotspot: None,
            crop: None,
            kind: "image".to_string(),
        };
        assert_eq!(image.asset_ref(), Some("image-abc-10x10-png"));

        let expanded = Image {
            asset: json!({"_id": "image-def-20x20-jpg", "url": "https://cdn"}),
            ..image.clone()
        };
        assert_eq!(expanded.asset_ref(), Some("image-def-20x20-jpg"));

        let broken = Image {
            asset: json!(true),
            ..image
        };
        assert_eq!(broken.asset_ref(), None);
    }
}
