use crate::models::{Coordinates, DistanceFilter, FilterSpec, Listing, RatingFilter, Review};

/// Mean Earth radius in miles
const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Apply filters to a list of listings, returning only those that match.
/// Input order is preserved.
pub fn apply_filters(
    listings: &[Listing],
    spec: &FilterSpec,
    user_location: Option<Coordinates>,
) -> Vec<Listing> {
    listings
        .iter()
        .filter(|listing| matches_filters(listing, spec, user_location))
        .cloned()
        .collect()
}

/// Check if a listing matches the given filters.
/// AND logic between filter categories, OR logic within a category.
pub fn matches_filters(
    listing: &Listing,
    spec: &FilterSpec,
    user_location: Option<Coordinates>,
) -> bool {
    // A listing without a type cannot satisfy a zoo type filter
    if !spec.zoo_types.is_empty() {
        let matches_type = listing
            .zoo_type
            .as_ref()
            .is_some_and(|zoo_type| spec.zoo_types.contains(zoo_type));

        if !matches_type {
            return false;
        }
    }

    // Animal filter matches on species or category
    if !spec.animal_types.is_empty() {
        let accepts = |value: &Option<String>| {
            value
                .as_ref()
                .is_some_and(|v| spec.animal_types.contains(v))
        };
        let matches_animal = listing
            .animals
            .iter()
            .any(|animal| accepts(&animal.species) || accepts(&animal.category));

        if !matches_animal {
            return false;
        }
    }

    if !spec.amenities.is_empty() {
        let matches_amenity = listing.amenities.iter().any(|amenity| {
            amenity
                .name
                .as_ref()
                .is_some_and(|name| spec.amenities.contains(name))
        });

        if !matches_amenity {
            return false;
        }
    }

    // Distance is only checked when both ends are known
    if let DistanceFilter::Within(max_miles) = spec.distance {
        if let (Some(user), Some(location)) = (user_location, listing.location.as_ref()) {
            let miles = distance_miles(user.lat, user.lng, location.lat, location.lng);
            if miles > f64::from(max_miles) {
                return false;
            }
        }
    }

    if spec.price_range.is_active() && !spec.price_range.contains(listing_price(listing)) {
        return false;
    }

    if let RatingFilter::AtLeast(min_rating) = spec.rating {
        if mean_approved_rating(&listing.reviews) < f64::from(min_rating) {
            return false;
        }
    }

    true
}

/// Check if any filter is active
pub fn has_filters(spec: &FilterSpec) -> bool {
    active_filter_count(spec) > 0
}

/// Number of selected list entries plus one per active scalar filter
pub fn active_filter_count(spec: &FilterSpec) -> usize {
    spec.zoo_types.len()
        + spec.animal_types.len()
        + spec.amenities.len()
        + usize::from(spec.distance.is_active())
        + usize::from(spec.price_range.is_active())
        + usize::from(spec.rating.is_active())
}

/// Great-circle distance in miles (haversine)
pub fn distance_miles(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_MILES * c
}

/// Mean of approved, non-zero ratings; 0 when there are none
pub fn mean_approved_rating(reviews: &[Review]) -> f64 {
    let ratings: Vec<f64> = reviews
        .iter()
        .filter(|review| review.is_approved())
        .filter_map(|review| review.rating)
        .filter(|rating| rating.is_finite() && *rating != 0.0)
        .collect();

    if ratings.is_empty() {
        return 0.0;
    }

    ratings.iter().sum::<f64>() / ratings.len() as f64
}

/// Adult admission price, else legacy nightly price, else 0.
/// Zero values fall through to the next source.
pub fn listing_price(listing: &Listing) -> f64 {
    listing
        .admission_price
        .as_ref()
        .and_then(|pricing| pricing.adult)
        .filter(|price| *price != 0.0)
        .or(listing.price_per_night.filter(|price| *price != 0.0))
        .unwrap_or(0.0)
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    format!("{} {}", count, if count == 1 { singular } else { plural })
}

/// Human-readable description of a filtered result set
pub fn summarize(spec: &FilterSpec, total: usize, filtered: usize) -> String {
    let mut parts = Vec::new();

    if !spec.zoo_types.is_empty() {
        parts.push(plural(spec.zoo_types.len(), "zoo type", "zoo types"));
    }
    if !spec.animal_types.is_empty() {
        parts.push(plural(spec.animal_types.len(), "animal type", "animal types"));
    }
    if !spec.amenities.is_empty() {
        parts.push(plural(spec.amenities.len(), "amenity", "amenities"));
    }
    if spec.distance.is_active() {
        parts.push(format!("within {} miles", spec.distance));
    }
    if let Some(label) = spec.price_range.label() {
        parts.push(label.to_string());
    }
    if spec.rating.is_active() {
        parts.push(format!("{} stars", spec.rating));
    }

    if parts.is_empty() {
        format!("Showing all {} petting zoos", total)
    } else {
        format!(
            "Showing {} of {} petting zoos ({})",
            filtered,
            total,
            parts.join(", ")
        )
    }
}
