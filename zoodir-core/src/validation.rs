use crate::models::{
    Amenity, Animal, Image, Listing, Location, Pricing, Review, SanitizedPayload, Slug, Validation,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Wrapper key holding petting zoo records
pub const COLLECTION_KEY: &str = "pettingZoos";
/// Wrapper key holding legacy property records
pub const LEGACY_COLLECTION_KEY: &str = "properties";

static SLUG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern compiles"));

static NUMERIC_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("numeric pattern compiles")
});

static NULL: Value = Value::Null;

fn field<'a>(fields: &'a Map<String, Value>, key: &str) -> &'a Value {
    fields.get(key).unwrap_or(&NULL)
}

/// Whether a CMS field carries something (null, false, 0 and "" do not)
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => true,
    }
}

fn non_empty_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a float from a JSON number or from the numeric prefix of a string
/// (`"12.5"`, `" 7 GBP"`). Everything else is not a number.
pub fn parse_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => NUMERIC_PREFIX
            .find(s.trim_start())
            .and_then(|m| m.as_str().parse::<f64>().ok()),
        _ => None,
    }
}

fn parse_price(value: &Value) -> Option<f64> {
    parse_float(value).filter(|price| price.is_finite() && *price >= 0.0)
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Coerce anything to an array: non-arrays become empty, nulls are dropped,
/// order is preserved.
pub fn sanitize_array(raw: &Value) -> Vec<Value> {
    match raw {
        Value::Array(items) => items.iter().filter(|item| !item.is_null()).cloned().collect(),
        _ => Vec::new(),
    }
}

/// Validate a CMS image. Images without an asset reference are unusable
/// and produce no data.
pub fn validate_image(raw: &Value) -> Validation<Option<Image>> {
    let Some(image) = raw.as_object() else {
        return Validation::invalid(None, "Image data is null or invalid");
    };

    let asset = field(image, "asset");
    if !is_present(asset) {
        return Validation::invalid(None, "Image missing asset reference");
    }

    let alt = non_empty_string(field(image, "alt"));
    let present = |key: &str| Some(field(image, key).clone()).filter(is_present);

    let sanitized = Image {
        asset: asset.clone(),
        alt: alt.clone().unwrap_or_else(|| "Petting zoo image".to_string()),
        caption: non_empty_string(field(image, "caption")),
        hotspot: present("hotspot"),
        crop: present("crop"),
        kind: non_empty_string(field(image, "_type")).unwrap_or_else(|| "image".to_string()),
    };

    let result = Validation::valid(Some(sanitized));
    if alt.is_none() {
        result.with_warning("Image missing alt text, using default")
    } else {
        result
    }
}

/// Validate a geopoint. Coordinates are accepted together or not at all.
pub fn validate_location(raw: &Value) -> Validation<Option<Location>> {
    let Some(location) = raw.as_object() else {
        return Validation::invalid(None, "Location data is null or invalid");
    };

    let mut errors = Vec::new();

    let lat = parse_float(field(location, "lat")).filter(|lat| (-90.0..=90.0).contains(lat));
    if lat.is_none() {
        errors.push("Invalid latitude value".to_string());
    }

    let lng = parse_float(field(location, "lng")).filter(|lng| (-180.0..=180.0).contains(lng));
    if lng.is_none() {
        errors.push("Invalid longitude value".to_string());
    }

    let (Some(lat), Some(lng)) = (lat, lng) else {
        return Validation {
            is_valid: false,
            data: None,
            errors,
            warnings: Vec::new(),
        };
    };

    Validation::valid(Some(Location {
        lat,
        lng,
        address: non_empty_string(field(location, "address")),
        city: non_empty_string(field(location, "city")),
        state: non_empty_string(field(location, "state")),
        zip_code: non_empty_string(field(location, "zipCode")),
    }))
}

/// Validate a slug object. A present but non-canonical value is normalized
/// and kept with a warning so the listing stays linkable.
pub fn validate_slug(raw: &Value) -> Validation<Slug> {
    let Some(slug) = raw.as_object() else {
        return Validation::invalid(Slug::missing(), "Slug data is null or invalid");
    };

    let current = match field(slug, "current") {
        Value::String(s) if !s.trim().is_empty() => s,
        _ => return Validation::invalid(Slug::missing(), "Slug missing current value"),
    };

    let sanitized = Slug {
        current: Some(current.to_lowercase().trim().to_string()),
        kind: non_empty_string(field(slug, "_type")).unwrap_or_else(|| "slug".to_string()),
    };

    let result = Validation::valid(sanitized);
    if SLUG_PATTERN.is_match(current) {
        result
    } else {
        result.with_warning("Slug format may not be URL-safe")
    }
}

/// Validate admission prices. Each field is parsed on its own; when none
/// survives the whole structure collapses to `None`.
pub fn validate_pricing(raw: &Value) -> Validation<Option<Pricing>> {
    let Some(pricing) = raw.as_object() else {
        return Validation::invalid(None, "Pricing data is null or invalid");
    };

    let sanitized = Pricing {
        adult: parse_price(field(pricing, "adult")),
        child: parse_price(field(pricing, "child")),
        senior: parse_price(field(pricing, "senior")),
        group: parse_price(field(pricing, "group")),
        currency: non_empty_string(field(pricing, "currency")).unwrap_or_else(|| "USD".to_string()),
    };

    if sanitized.has_any_price() {
        Validation::valid(Some(sanitized))
    } else {
        Validation::valid(None).with_warning("No valid pricing information available")
    }
}

/// Validate one petting zoo or legacy property record.
///
/// `data` is always populated. Only problems that make the listing
/// unusable as a page (not an object, no slug) clear `is_valid`; a rejected
/// location is reported in `errors` but the listing is kept without it.
pub fn validate_listing(raw: &Value) -> Validation<Listing> {
    let Some(zoo) = raw.as_object() else {
        return Validation::invalid(
            Listing::fallback(format!("fallback-{}", now_millis())),
            "Zoo data is null or not an object",
        );
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let id = non_empty_string(field(zoo, "_id")).unwrap_or_else(|| {
        warnings.push("Zoo missing _id, using temporary ID".to_string());
        format!("temp-{}", now_millis())
    });

    let name = non_empty_string(field(zoo, "name"))
        .or_else(|| non_empty_string(field(zoo, "title")))
        .unwrap_or_else(|| {
            warnings.push("Zoo missing name, using default".to_string());
            Listing::DEFAULT_NAME.to_string()
        });

    let slug = validate_slug(field(zoo, "slug"));
    let linkable = slug.is_valid;
    if !linkable {
        errors.push("Zoo missing valid slug".to_string());
    }
    warnings.extend(slug.warnings);

    let description = non_empty_string(field(zoo, "description")).unwrap_or_else(|| {
        warnings.push("Zoo missing description, using default".to_string());
        "No description available".to_string()
    });

    let location = match field(zoo, "location") {
        Value::Null => None,
        raw_location => {
            let result = validate_location(raw_location);
            errors.extend(
                result
                    .errors
                    .into_iter()
                    .map(|e| format!("Zoo location rejected: {}", e)),
            );
            result.data
        }
    };

    let main_image = match field(zoo, "mainImage") {
        Value::Null => None,
        raw_image => {
            let result = validate_image(raw_image);
            if !result.is_valid {
                warnings.push(format!(
                    "Zoo main image unusable: {}",
                    result.errors.join("; ")
                ));
            }
            result.data
        }
    };

    let raw_images = sanitize_array(field(zoo, "images"));
    let images: Vec<Image> = raw_images
        .iter()
        .filter_map(|image| validate_image(image).data)
        .collect();
    let dropped_images = raw_images.len() - images.len();
    if dropped_images > 0 {
        warnings.push(format!("Dropped {} invalid gallery image(s)", dropped_images));
    }

    let admission_price = match field(zoo, "admissionPrice") {
        Value::Null => None,
        raw_pricing => {
            let result = validate_pricing(raw_pricing);
            warnings.extend(result.errors);
            warnings.extend(result.warnings);
            result.data
        }
    };

    let listing = Listing {
        id,
        name,
        slug: slug.data,
        description,
        location,
        main_image,
        images,
        admission_price,
        price_per_night: parse_price(field(zoo, "pricePerNight")),
        zoo_type: non_empty_string(field(zoo, "zooType"))
            .or_else(|| non_empty_string(field(zoo, "propertyType"))),
        address: non_empty_string(field(zoo, "address")),
        reviews: sanitize_array(field(zoo, "reviews"))
            .iter()
            .map(Review::from_value)
            .collect(),
        amenities: sanitize_array(field(zoo, "amenities"))
            .iter()
            .map(Amenity::from_value)
            .collect(),
        animals: sanitize_array(field(zoo, "animals"))
            .iter()
            .map(Animal::from_value)
            .collect(),
        contact_info: field(zoo, "contactInfo")
            .as_object()
            .cloned()
            .unwrap_or_default(),
        hours: zoo
            .get("hours")
            .filter(|hours| !hours.is_null())
            .or_else(|| zoo.get("operatingHours"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
        website: non_empty_string(field(zoo, "website")),
        phone: non_empty_string(field(zoo, "phone")),
    };

    tracing::debug!(
        id = %listing.id,
        errors = errors.len(),
        warnings = warnings.len(),
        "validated listing"
    );

    Validation {
        is_valid: linkable,
        data: listing,
        errors,
        warnings,
    }
}

/// Shape of an API response, decided once before validation
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload<'a> {
    /// Nothing was received
    Empty,
    /// A bare array, or a wrapper object holding record arrays
    Collection {
        records: Vec<&'a Value>,
        extra: Map<String, Value>,
    },
    /// A single record
    Single(&'a Value),
}

impl<'a> RawPayload<'a> {
    pub fn resolve(raw: &'a Value) -> Self {
        match raw {
            Value::Null | Value::Bool(false) => RawPayload::Empty,
            Value::String(s) if s.is_empty() => RawPayload::Empty,
            Value::Array(items) => RawPayload::Collection {
                records: items.iter().collect(),
                extra: Map::new(),
            },
            Value::Object(fields) if is_wrapper(fields) => {
                let records = [COLLECTION_KEY, LEGACY_COLLECTION_KEY]
                    .iter()
                    .filter_map(|key| fields.get(*key).and_then(Value::as_array))
                    .flatten()
                    .collect();
                let extra = fields
                    .iter()
                    .filter(|(key, _)| *key != COLLECTION_KEY && *key != LEGACY_COLLECTION_KEY)
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                RawPayload::Collection { records, extra }
            }
            other => RawPayload::Single(other),
        }
    }
}

fn is_wrapper(fields: &Map<String, Value>) -> bool {
    fields.get(COLLECTION_KEY).is_some_and(Value::is_array)
        || fields.get(LEGACY_COLLECTION_KEY).is_some_and(Value::is_array)
}

/// Validate a whole API response.
///
/// Inside a collection, records that fail validation are dropped rather
/// than defaulted; a single record is always returned. Errors and warnings
/// from every record are concatenated, prefixed with the record they came
/// from.
pub fn validate_and_sanitize_collection(raw: &Value) -> Validation<SanitizedPayload> {
    match RawPayload::resolve(raw) {
        RawPayload::Empty => Validation::invalid(
            SanitizedPayload::Collection {
                listings: Vec::new(),
                extra: Map::new(),
            },
            "No data received from API",
        ),
        RawPayload::Collection { records, extra } => {
            let mut errors = Vec::new();
            let mut warnings = Vec::new();
            let mut listings = Vec::new();

            for (idx, record) in records.iter().enumerate() {
                let result = validate_listing(record);
                let record_ref = format!("Zoo #{} ('{}')", idx + 1, result.data.name);

                errors.extend(result.errors.iter().map(|e| format!("{}: {}", record_ref, e)));
                warnings.extend(result.warnings.iter().map(|w| format!("{}: {}", record_ref, w)));

                if result.is_valid {
                    listings.push(result.data);
                }
            }

            let dropped = records.len() - listings.len();
            if dropped > 0 {
                tracing::warn!(dropped, kept = listings.len(), "dropped invalid listings");
            }

            Validation {
                is_valid: errors.is_empty(),
                data: SanitizedPayload::Collection { listings, extra },
                errors,
                warnings,
            }
        }
        RawPayload::Single(record) => {
            let result = validate_listing(record);
            Validation {
                is_valid: result.errors.is_empty(),
                data: SanitizedPayload::Single(result.data),
                errors: result.errors,
                warnings: result.warnings,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn goat_farm() -> Value {
        json!({
            "_id": "zoo-1",
            "name": "Goat Farm",
            "slug": {"current": "goat-farm", "_type": "slug"},
            "description": "Friendly goats",
            "location": {"lat": 51.5, "lng": -0.12, "city": "London"},
            "mainImage": {"asset": {"_ref": "image-abc-400x300-jpg"}, "alt": "Goats"},
            "admissionPrice": {"adult": 8, "child": "4.50", "currency": "GBP"},
            "zooType": "farm",
            "reviews": [{"rating": 5}, null],
            "animals": [{"name": "Billy", "species": "Goat", "category": "Farm Animals"}],
            "amenities": [{"name": "Parking"}]
        })
    }

    #[test]
    fn test_sanitize_array_non_array_inputs() {
        for input in [json!(null), json!("goats"), json!(42), json!({"a": 1}), json!(true)] {
            assert!(sanitize_array(&input).is_empty(), "input {} should give []", input);
        }
    }

    #[test]
    fn test_sanitize_array_drops_nulls_in_order_and_is_idempotent() {
        let input = json!([1, null, "two", null, {"three": 3}]);
        let once = sanitize_array(&input);
        assert_eq!(once, vec![json!(1), json!("two"), json!({"three": 3})]);

        let twice = sanitize_array(&Value::Array(once.clone()));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_object_listing() {
        let result = validate_listing(&json!({}));

        assert!(!result.is_valid);
        assert!(result.errors.contains(&"Zoo missing valid slug".to_string()));
        assert!(result.warnings.contains(&"Zoo missing _id, using temporary ID".to_string()));
        assert!(result.warnings.contains(&"Zoo missing name, using default".to_string()));
        assert_eq!(result.data.name, "Unnamed Petting Zoo");
        assert!(result.data.id.starts_with("temp-"));
        assert_eq!(result.data.slug.current, None);
    }

    #[test]
    fn test_non_object_listing_gets_fallback() {
        let result = validate_listing(&json!("not a zoo"));
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["Zoo data is null or not an object".to_string()]);
        assert!(result.data.id.starts_with("fallback-"));
        assert_eq!(result.data.description, "Information not available");
    }

    #[test]
    fn test_complete_listing() {
        let result = validate_listing(&goat_farm());
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty(), "unexpected warnings: {:?}", result.warnings);

        let listing = result.data;
        assert_eq!(listing.id, "zoo-1");
        assert_eq!(listing.slug.as_str(), Some("goat-farm"));
        assert_eq!(listing.location.as_ref().and_then(|l| l.city.clone()), Some("London".to_string()));
        assert_eq!(listing.zoo_type.as_deref(), Some("farm"));
        assert_eq!(listing.reviews.len(), 1);
        assert_eq!(listing.animals[0].species.as_deref(), Some("Goat"));

        let pricing = listing.admission_price.unwrap();
        assert_eq!(pricing.adult, Some(8.0));
        assert_eq!(pricing.child, Some(4.5));
        assert_eq!(pricing.currency, "GBP");
    }

    #[test]
    fn test_invalid_location_dropped_but_listing_kept() {
        let mut raw = goat_farm();
        raw["location"] = json!({"lat": 123.0, "lng": "west"});

        let result = validate_listing(&raw);
        assert!(result.is_valid);
        assert!(result.data.location.is_none());
        assert_eq!(
            result.errors,
            vec![
                "Zoo location rejected: Invalid latitude value".to_string(),
                "Zoo location rejected: Invalid longitude value".to_string(),
            ]
        );
    }

    #[test]
    fn test_legacy_property_fields() {
        let result = validate_listing(&json!({
            "_id": "p-1",
            "title": "Old Barn",
            "slug": {"current": "old-barn"},
            "propertyType": "barn",
            "pricePerNight": 12
        }));
        assert_eq!(result.data.name, "Old Barn");
        assert_eq!(result.data.zoo_type.as_deref(), Some("barn"));
        assert_eq!(result.data.price_per_night, Some(12.0));
    }

    #[test]
    fn test_null_hours_fall_back_to_operating_hours() {
        let result = validate_listing(&json!({
            "slug": {"current": "old-barn"},
            "hours": null,
            "operatingHours": {"monday": "9-5"}
        }));
        assert_eq!(result.data.hours.get("monday"), Some(&json!("9-5")));
    }

    #[test]
    fn test_image_without_asset_is_invalid() {
        let result = validate_image(&json!({"alt": "x"}));
        assert!(!result.is_valid);
        assert!(result.data.is_none());
        assert_eq!(result.errors, vec!["Image missing asset reference".to_string()]);
    }

    #[test]
    fn test_image_missing_alt_is_warning() {
        let result = validate_image(&json!({"asset": {"_ref": "image-a-1x1-png"}}));
        assert!(result.is_valid);
        assert_eq!(result.data.unwrap().alt, "Petting zoo image");
        assert_eq!(result.warnings, vec!["Image missing alt text, using default".to_string()]);
    }

    #[test]
    fn test_gallery_drops_invalid_images() {
        let mut raw = goat_farm();
        raw["images"] = json!([
            {"asset": {"_ref": "image-b-1x1-png"}, "alt": "Pen"},
            {"alt": "no asset"},
            null
        ]);
        let result = validate_listing(&raw);
        assert_eq!(result.data.images.len(), 1);
        assert!(result
            .warnings
            .contains(&"Dropped 1 invalid gallery image(s)".to_string()));
    }

    #[test]
    fn test_location_parses_numeric_strings() {
        let result = validate_location(&json!({"lat": "40.7128", "lng": "-74.0060abc"}));
        assert!(result.is_valid);
        let location = result.data.unwrap();
        assert_eq!(location.lat, 40.7128);
        assert_eq!(location.lng, -74.006);
    }

    #[test]
    fn test_location_is_atomic() {
        let result = validate_location(&json!({"lat": 10.0, "lng": 200.0}));
        assert!(!result.is_valid);
        assert!(result.data.is_none());
        assert_eq!(result.errors, vec!["Invalid longitude value".to_string()]);
    }

    #[test]
    fn test_slug_non_canonical_is_normalized_with_warning() {
        let result = validate_slug(&json!({"current": " Goat-Farm "}));
        assert!(result.is_valid);
        assert_eq!(result.data.as_str(), Some("goat-farm"));
        assert_eq!(result.warnings, vec!["Slug format may not be URL-safe".to_string()]);
    }

    #[test]
    fn test_slug_missing_or_blank() {
        assert_eq!(
            validate_slug(&json!(null)).errors,
            vec!["Slug data is null or invalid".to_string()]
        );
        for raw in [json!({}), json!({"current": ""}), json!({"current": "   "}), json!({"current": 7})] {
            let result = validate_slug(&raw);
            assert!(!result.is_valid);
            assert_eq!(result.data, Slug::missing());
            assert_eq!(result.errors, vec!["Slug missing current value".to_string()]);
        }
    }

    #[test]
    fn test_pricing_collapses_when_nothing_parses() {
        let result = validate_pricing(&json!({"adult": "free", "child": -2, "currency": "GBP"}));
        assert!(result.is_valid);
        assert!(result.data.is_none());
        assert_eq!(
            result.warnings,
            vec!["No valid pricing information available".to_string()]
        );
    }

    #[test]
    fn test_pricing_keeps_zero_and_defaults_currency() {
        let pricing = validate_pricing(&json!({"adult": 0, "senior": "3"})).data.unwrap();
        assert_eq!(pricing.adult, Some(0.0));
        assert_eq!(pricing.senior, Some(3.0));
        assert_eq!(pricing.child, None);
        assert_eq!(pricing.currency, "USD");
    }

    #[test]
    fn test_resolve_payload_shapes() {
        assert_eq!(RawPayload::resolve(&json!(null)), RawPayload::Empty);

        let array = json!([{}, {}]);
        match RawPayload::resolve(&array) {
            RawPayload::Collection { records, extra } => {
                assert_eq!(records.len(), 2);
                assert!(extra.is_empty());
            }
            other => panic!("expected collection, got {:?}", other),
        }

        let wrapper = json!({"pettingZoos": [{}], "properties": [{}, {}], "total": 3});
        match RawPayload::resolve(&wrapper) {
            RawPayload::Collection { records, extra } => {
                assert_eq!(records.len(), 3);
                assert_eq!(extra.get("total"), Some(&json!(3)));
            }
            other => panic!("expected collection, got {:?}", other),
        }

        let single = json!({"name": "Solo"});
        assert!(matches!(RawPayload::resolve(&single), RawPayload::Single(_)));
    }

    #[test]
    fn test_collection_drops_invalid_records() {
        let raw = json!({
            "pettingZoos": [goat_farm(), {"name": "No Slug"}, null],
            "fetchedAt": "2024-01-01"
        });
        let result = validate_and_sanitize_collection(&raw);

        assert!(!result.is_valid);
        assert_eq!(result.data.listings().len(), 1);
        assert_eq!(result.data.listings()[0].name, "Goat Farm");
        assert!(result
            .errors
            .contains(&"Zoo #2 ('No Slug'): Zoo missing valid slug".to_string()));
        match result.data {
            SanitizedPayload::Collection { extra, .. } => {
                assert_eq!(extra.get("fetchedAt"), Some(&json!("2024-01-01")));
            }
            SanitizedPayload::Single(_) => panic!("expected collection"),
        }
    }

    #[test]
    fn test_bare_array_keeps_valid_records_in_order() {
        let mut second = goat_farm();
        second["_id"] = json!("c");
        second["slug"] = json!({"current": "second-farm"});
        let raw = json!([goat_farm(), {"name": "x"}, null, second]);

        let result = validate_and_sanitize_collection(&raw);
        let ids: Vec<&str> = result.data.listings().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["zoo-1", "c"]);
        assert!(!result.is_valid);
        match result.data {
            SanitizedPayload::Collection { extra, .. } => assert!(extra.is_empty()),
            SanitizedPayload::Single(_) => panic!("expected collection"),
        }
    }

    #[test]
    fn test_single_record_is_defaulted_not_dropped() {
        let result = validate_and_sanitize_collection(&json!({"name": "No Slug"}));
        assert!(!result.is_valid);
        assert_eq!(result.data.listings().len(), 1);
        assert_eq!(result.data.listings()[0].name, "No Slug");
    }

    #[test]
    fn test_empty_payload() {
        let result = validate_and_sanitize_collection(&json!(null));
        assert!(!result.is_valid);
        assert!(result.data.listings().is_empty());
        assert_eq!(result.errors, vec!["No data received from API".to_string()]);
    }
}
