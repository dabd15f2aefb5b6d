// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0} is not a valid directory")]
    SubjectNotFound(String),

    #[error("File descriptor error: {0}")]
    DescriptorError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Command rendering error: {0}")]
    RenderError(String),

    #[error("Queue submission error: {0}")]
    QueueError(String),

    #[error("Invalid job plan: {0}")]
    PlanError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Short name of the error class, for log records.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::ConfigError(_) => "config",
            PipelineError::SubjectNotFound(_) => "subject-not-found",
            PipelineError::DescriptorError(_) => "descriptor",
            PipelineError::IoError(_) => "io",
            PipelineError::JsonError(_) => "json",
            PipelineError::TomlError(_) => "toml",
            PipelineError::RenderError(_) => "render",
            PipelineError::QueueError(_) => "queue",
            PipelineError::PlanError(_) => "plan",
            PipelineError::Other(_) => "other",
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
