use crate::error::{ZooError, ZooResult};
use crate::models::FilterSpec;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

/// Query parameter holding the free-text search term
pub const SEARCH_PARAM: &str = "search";
/// Query parameter holding the encoded filter spec
pub const FILTERS_PARAM: &str = "filters";

/// Characters left alone by a browser's `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Search and filter state carried in a page URL
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UrlState {
    pub search: String,
    pub filters: FilterSpec,
}

/// Encode the non-default parts of a filter spec for the `filters` query
/// parameter. Returns `None` when every filter is at its default.
pub fn encode_filters(spec: &FilterSpec) -> Option<String> {
    let mut fields = Map::new();

    let lists = [
        ("zooTypes", &spec.zoo_types),
        ("animalTypes", &spec.animal_types),
        ("amenities", &spec.amenities),
    ];
    for (key, values) in lists {
        if !values.is_empty() {
            fields.insert(key.to_string(), Value::from(values.clone()));
        }
    }

    if spec.distance.is_active() {
        fields.insert("distance".to_string(), Value::String(spec.distance.to_string()));
    }
    if spec.price_range.is_active() {
        fields.insert("priceRange".to_string(), Value::String(spec.price_range.to_string()));
    }
    if spec.rating.is_active() {
        fields.insert("rating".to_string(), Value::String(spec.rating.to_string()));
    }

    if fields.is_empty() {
        return None;
    }

    let json = Value::Object(fields).to_string();
    Some(utf8_percent_encode(&json, URI_COMPONENT).to_string())
}

/// Decode a `filters` query parameter. Anything that does not decode to a
/// filter object yields the default spec.
pub fn decode_filters(param: &str) -> FilterSpec {
    let decoded = match percent_decode_str(param).decode_utf8() {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!(error = %e, "filters parameter is not valid UTF-8");
            return FilterSpec::default();
        }
    };

    serde_json::from_str(&decoded).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to parse filters from URL");
        FilterSpec::default()
    })
}

/// Build a link to `base` that restores the given search and filters.
/// Any query or fragment already on `base` is discarded.
pub fn shareable_url(base: &str, search: &str, spec: &FilterSpec) -> ZooResult<String> {
    let mut url = Url::parse(base).map_err(|source| ZooError::InvalidUrl {
        url: base.to_string(),
        source,
    })?;
    url.set_query(None);
    url.set_fragment(None);

    let mut pairs = Vec::new();
    if !search.trim().is_empty() {
        pairs.push((SEARCH_PARAM, search.to_string()));
    }
    if let Some(filters) = encode_filters(spec) {
        pairs.push((FILTERS_PARAM, filters));
    }

    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }

    Ok(url.to_string())
}

/// Read search and filter state from a query string (leading `?` optional)
pub fn parse_url_params(query: &str) -> UrlState {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut state = UrlState::default();
    let mut seen_search = false;
    let mut seen_filters = false;

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match &*key {
            SEARCH_PARAM if !seen_search => {
                seen_search = true;
                state.search = value.into_owned();
            }
            FILTERS_PARAM if !seen_filters => {
                seen_filters = true;
                if !value.is_empty() {
                    state.filters = decode_filters(&value);
                }
            }
            _ => {}
        }
    }

    state
}
