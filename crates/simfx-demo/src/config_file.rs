#![forbid(unsafe_code)]

//! Loading the showcase config from JSON.

use std::fs;
use std::path::Path;

use simfx_core::config::ShowcaseConfig;

use crate::error::DemoError;

/// Parse and validate a config document.
pub fn from_json(path: &Path, text: &str) -> Result<ShowcaseConfig, DemoError> {
    let config: ShowcaseConfig =
        serde_json::from_str(text).map_err(|source| DemoError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

/// Read `path`, or fall back to the stock page when no path is given.
pub fn load(path: Option<&Path>) -> Result<ShowcaseConfig, DemoError> {
    let Some(path) = path else {
        return Ok(ShowcaseConfig::default());
    };
    let text = fs::read_to_string(path).map_err(|source| DemoError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let config = from_json(path, &text)?;
    tracing::info!(path = %path.display(), "loaded showcase config");
    Ok(config)
}
