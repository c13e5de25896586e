use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use zoodir_core::*;

use super::Settings;

/// State shared by every command: settings plus the failure log
#[derive(Debug)]
pub struct AppState {
    pub settings: Settings,
    pub monitor: ErrorMonitor,
}

/// A payload file after sanitization, with the raw document kept for
/// schema checks
#[derive(Debug)]
pub struct LoadedPayload {
    pub raw: Value,
    pub result: Validation<SanitizedPayload>,
}

impl LoadedPayload {
    pub fn listings(&self) -> &[Listing] {
        self.result.data.listings()
    }
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let monitor = ErrorMonitor::new(settings.monitoring_enabled);
        Self { settings, monitor }
    }

    /// Load and sanitize a payload file. Content problems are logged to the
    /// monitor; only I/O and parse failures are errors.
    pub fn load(&mut self, path: &Path) -> Result<LoadedPayload> {
        let raw = load_payload(path)
            .with_context(|| format!("Could not load listings from {}", path.display()))?;
        let result = validate_and_sanitize_collection(&raw);

        if !result.errors.is_empty() {
            self.monitor.record(
                Component::Validation,
                ErrorKind::ValidationFailed,
                result.errors.clone(),
            );
        }

        tracing::info!(
            path = %path.display(),
            listings = result.data.listings().len(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "payload loaded"
        );

        Ok(LoadedPayload { raw, result })
    }

    /// Visitor position from `--near`, else from settings
    pub fn user_location(&self, near: Option<Coordinates>) -> Result<Option<Coordinates>> {
        match near {
            Some(coords) => Ok(Some(coords)),
            None => self.settings.default_coordinates(),
        }
    }

    pub fn detail_base_path(&self) -> &str {
        &self.settings.detail_base_path
    }
}
