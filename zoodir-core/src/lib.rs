// Public modules
pub mod diagnostics;
pub mod error;
pub mod filtering;
pub mod grouping;
pub mod io;
pub mod models;
pub mod render;
pub mod schema_validation;
pub mod search;
pub mod sorting;
pub mod url_state;
pub mod validation;

// Re-export commonly used types for convenience
pub use diagnostics::{Component, DiagnosticsSink, ErrorKind, ErrorMonitor, NullSink, Trend};
pub use error::{ZooError, ZooResult};
pub use filtering::{
    active_filter_count, apply_filters, distance_miles, has_filters, listing_price,
    matches_filters, mean_approved_rating, summarize,
};
pub use grouping::{collect_filter_options, group_by_zoo_type, UNSPECIFIED_GROUP};
pub use io::{load_listings, load_payload, save_listings};
pub use models::{
    Coordinates, DistanceFilter, FilterOptions, FilterSpec, Listing, PriceRange, RatingFilter,
    SanitizedPayload, Validation,
};
pub use render::{
    diagnose_image, plan_map, safe_image, safe_link, sanitize_href, CdnConfig, ImageRequest,
    Rendered,
};
pub use schema_validation::{petting_zoo_schema, validate_against_schema};
pub use search::search_listings;
pub use sorting::{normalize_for_sorting, sort_listings, SortKey};
pub use url_state::{decode_filters, encode_filters, parse_url_params, shareable_url, UrlState};
pub use validation::{
    sanitize_array, validate_and_sanitize_collection, validate_image, validate_listing,
    validate_location, validate_pricing, validate_slug, RawPayload,
};
