use crate::error::{ZooError, ZooResult};
use crate::models::{Listing, SanitizedPayload, Validation};
use crate::validation::validate_and_sanitize_collection;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Load a raw CMS payload from a JSON file
pub fn load_payload<P: AsRef<Path>>(path: P) -> ZooResult<Value> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ZooError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let payload = serde_json::from_str(&contents)?;
    Ok(payload)
}

/// Load a JSON file and run it through collection validation
pub fn load_listings<P: AsRef<Path>>(path: P) -> ZooResult<Validation<SanitizedPayload>> {
    let payload = load_payload(path.as_ref())?;
    let result = validate_and_sanitize_collection(&payload);
    tracing::debug!(
        path = %path.as_ref().display(),
        listings = result.data.listings().len(),
        errors = result.errors.len(),
        "loaded listings"
    );
    Ok(result)
}

/// Save sanitized listings to a JSON file with pretty printing
pub fn save_listings<P: AsRef<Path>>(listings: &[Listing], path: P) -> ZooResult<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(listings)?;
    fs::write(path, json).map_err(|source| ZooError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("zoodir-io-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_load_listings_from_file() {
        let path = temp_path("payload.json");
        let payload = json!({
            "pettingZoos": [
                {"_id": "1", "name": "Goat Farm", "slug": {"current": "goat-farm"}},
                {"_id": "2", "name": "No Slug"}
            ]
        });
        fs::write(&path, payload.to_string()).unwrap();

        let result = load_listings(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(result.data.listings().len(), 1);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_payload(temp_path("does-not-exist.json"));
        assert!(matches!(result, Err(ZooError::Io { .. })));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let path = temp_path("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let result = load_payload(&path);
        fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ZooError::Serialization(_))));
    }

    #[test]
    fn test_saved_listings_reload_as_collection() {
        let path = temp_path("saved.json");
        let listing = crate::validation::validate_listing(&json!({
            "_id": "1", "name": "Goat Farm", "slug": {"current": "goat-farm"}
        }))
        .data;
        save_listings(std::slice::from_ref(&listing), &path).unwrap();

        let reloaded = load_listings(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(reloaded.data.into_listings(), vec![listing]);
    }
}
