use crate::models::Listing;

/// Free-text search over the listing fields a visitor would recognise.
/// A blank term matches everything; input order is preserved.
pub fn search_listings(listings: &[Listing], term: &str) -> Vec<Listing> {
    if term.trim().is_empty() {
        return listings.to_vec();
    }

    let needle = term.to_lowercase();
    listings
        .iter()
        .filter(|listing| matches_term(listing, &needle))
        .cloned()
        .collect()
}

/// `needle` must already be lower-cased
fn matches_term(listing: &Listing, needle: &str) -> bool {
    let contains = |value: Option<&str>| value.is_some_and(|v| v.to_lowercase().contains(needle));

    let own_fields = [
        Some(listing.name.as_str()),
        Some(listing.description.as_str()),
        listing.zoo_type.as_deref(),
        listing.address.as_deref(),
    ];
    if own_fields.into_iter().any(contains) {
        return true;
    }

    let animal_match = listing.animals.iter().any(|animal| {
        contains(animal.name.as_deref())
            || contains(animal.species.as_deref())
            || contains(animal.category.as_deref())
    });

    animal_match
        || listing.amenities.iter().any(|amenity| {
            contains(amenity.name.as_deref()) || contains(amenity.description.as_deref())
        })
}
