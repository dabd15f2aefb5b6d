// src/config/mod.rs

//! Configuration loading and validation for funcdag.
//!
//! Responsibilities:
//! - Parse the subject's file descriptor JSON (`descriptor.rs`).
//! - Define the TOML-backed pipeline settings (`model.rs`).
//! - Load a settings file from disk (`loader.rs`).
//! - Validate basic invariants of the settings (`validate.rs`).

pub mod descriptor;
pub mod loader;
pub mod model;
pub mod validate;

pub use descriptor::FileDescriptor;
pub use loader::{load_and_validate, load_from_path, load_settings};
pub use model::{PathsSection, QueueSection, RawSettings, Settings};
pub use validate::validate_settings;
