// src/config/loader.rs

use std::path::Path;

use crate::config::model::{RawSettings, Settings};
use crate::errors::Result;
use crate::fs::FileSystem;

/// Load a settings file and return the raw `RawSettings`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawSettings> {
    let contents = fs.read_to_string(path.as_ref())?;
    let settings: RawSettings = toml::from_str(&contents)?;
    Ok(settings)
}

/// Load a settings file from path and validate it.
pub fn load_and_validate(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<Settings> {
    let raw = load_from_path(fs, path)?;
    Settings::try_from(raw)
}

/// Settings for a run: the given file if any, otherwise the built-in
/// defaults (which read everything from the environment at render time).
pub fn load_settings(fs: &dyn FileSystem, path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => load_and_validate(fs, path),
        None => Ok(Settings::default()),
    }
}
