// src/config/validate.rs

use crate::config::model::{RawSettings, Settings};
use crate::errors::{PipelineError, Result};

impl TryFrom<RawSettings> for Settings {
    type Error = crate::errors::PipelineError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        validate_settings(&raw)?;
        Ok(Settings::new_unchecked(raw.queue, raw.paths))
    }
}

pub fn validate_settings(cfg: &RawSettings) -> Result<()> {
    validate_queue_section(cfg)?;
    validate_paths_section(cfg)?;
    Ok(())
}

fn validate_queue_section(cfg: &RawSettings) -> Result<()> {
    let fields = [
        ("submit_program", &cfg.queue.submit_program),
        ("standard", &cfg.queue.standard),
        ("high_memory", &cfg.queue.high_memory),
        ("max_memory", &cfg.queue.max_memory),
    ];
    for (field, value) in fields {
        ensure_not_blank("queue", field, value)?;
    }

    if cfg.queue.high_memory_request_mb == 0 {
        return Err(PipelineError::ConfigError(
            "[queue].high_memory_request_mb must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_paths_section(cfg: &RawSettings) -> Result<()> {
    ensure_not_blank("paths", "bin_dir", &cfg.paths.bin_dir)
}

fn ensure_not_blank(section: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PipelineError::ConfigError(format!(
            "[{section}].{field} must not be empty"
        )));
    }
    Ok(())
}
