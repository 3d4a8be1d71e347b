//! Loads [`GeoQuestConfig`] from defaults, an optional `geoquest.toml` and
//! `GEOQUEST_*` environment variables, later sources winning.
//!
//! Nested keys use a double underscore: `GEOQUEST_QUERY__MAX_LIMIT=200`
//! sets `query.max_limit`. A `.env` file in the working directory is read
//! into the environment first.

use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use store::GeoQuestConfig;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("Failed to load settings: {0}")]
pub struct SettingsError(#[from] ConfigError);

/// Settings from `geoquest.toml` in the working directory plus the environment.
pub fn load() -> Result<GeoQuestConfig, SettingsError> {
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "loaded .env");
    }
    load_from(Path::new(GeoQuestConfig::filename()))
}

/// Settings from the given file (which may be missing) plus the environment.
pub fn load_from(path: &Path) -> Result<GeoQuestConfig, SettingsError> {
    let config = Config::builder()
        .add_source(
            File::from(path)
                .format(FileFormat::Toml)
                .required(false),
        )
        .add_source(
            Environment::with_prefix("GEOQUEST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}
