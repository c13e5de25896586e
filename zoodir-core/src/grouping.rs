use crate::models::{FilterOptions, Listing};
use std::collections::{BTreeMap, BTreeSet};

/// Group key for listings without a zoo type
pub const UNSPECIFIED_GROUP: &str = "_unspecified_";

/// Group listings by zoo type. Keys come back sorted.
pub fn group_by_zoo_type(listings: &[Listing]) -> BTreeMap<String, Vec<Listing>> {
    let mut groups: BTreeMap<String, Vec<Listing>> = BTreeMap::new();

    for listing in listings {
        let key = listing
            .zoo_type
            .clone()
            .unwrap_or_else(|| UNSPECIFIED_GROUP.to_string());
        groups.entry(key).or_default().push(listing.clone());
    }

    groups
}

/// Distinct values for the filter panel, sorted.
/// Animal types take both species and category.
pub fn collect_filter_options(listings: &[Listing]) -> FilterOptions {
    let mut zoo_types = BTreeSet::new();
    let mut animal_types = BTreeSet::new();
    let mut amenities = BTreeSet::new();

    for listing in listings {
        if let Some(zoo_type) = &listing.zoo_type {
            zoo_types.insert(zoo_type.clone());
        }
        for animal in &listing.animals {
            animal_types.extend(animal.species.iter().cloned());
            animal_types.extend(animal.category.iter().cloned());
        }
        amenities.extend(listing.amenities.iter().filter_map(|a| a.name.clone()));
    }

    FilterOptions {
        zoo_types: zoo_types.into_iter().collect(),
        animal_types: animal_types.into_iter().collect(),
        amenities: amenities.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_listing;
    use serde_json::json;

    fn listings() -> Vec<Listing> {
        [
            json!({
                "_id": "1", "name": "One", "slug": {"current": "one"}, "zooType": "farm",
                "animals": [{"species": "Goat", "category": "Farm Animals"}],
                "amenities": [{"name": "Parking"}, {"name": "Cafe"}]
            }),
            json!({
                "_id": "2", "name": "Two", "slug": {"current": "two"}, "zooType": "farm",
                "animals": [{"species": "Sheep", "category": "Farm Animals"}, {"name": "Nameless"}],
                "amenities": [{"name": "Parking"}, {"description": "no name"}]
            }),
            json!({"_id": "3", "name": "Three", "slug": {"current": "three"}}),
        ]
        .iter()
        .map(|raw| validate_listing(raw).data)
        .collect()
    }

    #[test]
    fn test_group_by_zoo_type() {
        let groups = group_by_zoo_type(&listings());
        let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["_unspecified_", "farm"]);
        assert_eq!(groups["farm"].len(), 2);
        assert_eq!(groups[UNSPECIFIED_GROUP][0].id, "3");
    }

    #[test]
    fn test_collect_filter_options_unique_and_sorted() {
        let options = collect_filter_options(&listings());
        assert_eq!(options.zoo_types, vec!["farm".to_string()]);
        assert_eq!(
            options.animal_types,
            vec!["Farm Animals".to_string(), "Goat".to_string(), "Sheep".to_string()]
        );
        assert_eq!(options.amenities, vec!["Cafe".to_string(), "Parking".to_string()]);
    }
}
