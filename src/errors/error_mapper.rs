use std::io::ErrorKind as IoErrorKind;
use zoodir_core::ZooError;

/// Map a command failure to user-friendly text.
/// Returns (title, message, details)
pub fn map_command_error(error: &anyhow::Error) -> (String, String, String) {
    let details = format!("{:#}", error);

    let Some(zoo_error) = error.chain().find_map(|e| e.downcast_ref::<ZooError>()) else {
        return (
            "Error".to_string(),
            "The command failed.".to_string(),
            details,
        );
    };

    match zoo_error {
        ZooError::Io { path, source } if source.kind() == IoErrorKind::NotFound => (
            "File Not Found".to_string(),
            "The file could not be found.".to_string(),
            format!(
                "Path: {}\n\nPlease verify the file exists and you have permission to read it.",
                path.display()
            ),
        ),
        ZooError::Io { path, source } if source.kind() == IoErrorKind::PermissionDenied => (
            "Permission Denied".to_string(),
            "Permission denied.".to_string(),
            format!("You don't have permission to access this file:\n{}", path.display()),
        ),
        ZooError::Io { .. } => (
            "Error Accessing File".to_string(),
            "Failed to read or write the file.".to_string(),
            details,
        ),
        ZooError::Serialization(_) => (
            "Invalid JSON".to_string(),
            "The file is not valid JSON.".to_string(),
            details,
        ),
        ZooError::InvalidCoordinates(_) => (
            "Invalid Location".to_string(),
            "Locations must be written as LAT,LNG.".to_string(),
            details,
        ),
        ZooError::InvalidUrl { .. } => (
            "Invalid URL".to_string(),
            "The site URL could not be parsed.".to_string(),
            "Check the site_url setting or the --base flag.".to_string(),
        ),
        ZooError::UnknownSortKey(_) => (
            "Invalid Sort Key".to_string(),
            "Sort by name, price or rating.".to_string(),
            details,
        ),
    }
}
