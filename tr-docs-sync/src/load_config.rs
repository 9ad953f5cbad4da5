//! `load_config` module: reads the dotenv settings file and merges it with the
//! process environment into the core [`Settings`].
//!
//! # Responsibilities
//! - Parse a dotenv-style key/value file (`TR_*`, `NC_*`, `PYTR_COMMAND`)
//! - Let variables already present in the environment win over the file
//! - Surface every validation problem at once, with the offending key names
//!
//! # Errors
//! All errors use `anyhow::Error` for context-rich diagnostics and are surfaced
//! at the CLI boundary.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::Path;
use tr_docs_sync_core::config::Settings;
use tracing::{error, info, warn};

/// Settings file read when `--env-file` is not given.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Loads settings from `path` (or `./.env` if it exists) plus the environment.
///
/// A missing default file is fine, since everything may come from the
/// environment; a missing file that was named explicitly is an error.
pub fn load_config(path: Option<&Path>) -> Result<Settings> {
    let file_values = match path {
        Some(path) => read_env_file(path)?,
        None => {
            let default = Path::new(DEFAULT_ENV_FILE);
            if default.is_file() {
                read_env_file(default)?
            } else {
                warn!(
                    config_path = ?default,
                    "No settings file found, reading settings from the environment only"
                );
                HashMap::new()
            }
        }
    };

    let lookup = |key: &str| {
        std::env::var(key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| file_values.get(key).cloned())
    };

    match Settings::from_lookup(lookup) {
        Ok(settings) => {
            info!("Settings validated successfully");
            Ok(settings)
        }
        Err(e) => {
            error!(error = %e, "Invalid settings");
            Err(anyhow!("Invalid settings: {e}"))
        }
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    info!(config_path = ?path, "Loading settings from file");

    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read settings file");
            return Err(anyhow!("Failed to read settings file {:?}: {}", path, e));
        }
    };

    let mut values = HashMap::new();
    for entry in entries {
        match entry {
            Ok((key, value)) => {
                values.insert(key, value);
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path, "Failed to parse settings file");
                return Err(anyhow!("Failed to parse settings file {:?}: {}", path, e));
            }
        }
    }

    info!(config_path = ?path, keys = values.len(), "Settings file read successfully");
    Ok(values)
}
