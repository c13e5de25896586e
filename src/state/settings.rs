use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use zoodir_core::{CdnConfig, Coordinates};

/// Default config file name, looked up in the working directory (`zoodir.toml`)
const CONFIG_NAME: &str = "zoodir";
const ENV_PREFIX: &str = "ZOODIR";

/// Runtime settings, layered as defaults < config file < `ZOODIR_*` env vars
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Public origin used for shareable links
    pub site_url: String,
    /// Path prefix of listing detail pages
    pub detail_base_path: String,
    pub cdn_project_id: String,
    pub cdn_dataset: String,
    pub maps_api_key: Option<String>,
    /// Visitor position as `lat,lng`, used when `--near` is not given
    pub default_location: Option<String>,
    pub log_filter: String,
    pub monitoring_enabled: bool,
}

impl Settings {
    pub fn new(config_file: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let mut builder = Config::builder()
            .set_default("site_url", "http://localhost:3000")?
            .set_default("detail_base_path", "/zoo")?
            .set_default("cdn_project_id", "")?
            .set_default("cdn_dataset", "production")?
            .set_default("log_filter", "zoodir=info,zoodir_core=info")?
            .set_default("monitoring_enabled", true)?;

        builder = match config_file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(CONFIG_NAME).required(false)),
        };

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        Ok(settings)
    }

    pub fn cdn(&self) -> CdnConfig {
        CdnConfig {
            project_id: self.cdn_project_id.clone(),
            dataset: self.cdn_dataset.clone(),
        }
    }

    pub fn maps_configured(&self) -> bool {
        self.maps_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    pub fn default_coordinates(&self) -> Result<Option<Coordinates>> {
        self.default_location
            .as_deref()
            .filter(|location| !location.trim().is_empty())
            .map(|location| {
                location
                    .parse::<Coordinates>()
                    .context("Invalid default_location setting")
            })
            .transpose()
    }
}
