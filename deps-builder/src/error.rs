//! Error type for dependency acquisition and builds

use std::path::PathBuf;

/// Every failure the dependency builder can report.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{tool} not found! {hint}")]
    MissingTool { tool: String, hint: String },

    #[error("Download of {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to extract {archive}: {message}")]
    Extract { archive: PathBuf, message: String },

    #[error("Failed to launch {program} in {cwd}: {source}")]
    Spawn {
        program: String,
        cwd: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed in {cwd} (exit code: {})", .code.map_or("none".to_string(), |c| c.to_string()))]
    ToolFailed {
        program: String,
        cwd: PathBuf,
        code: Option<i32>,
    },

    #[error("Patch error: {0}")]
    Patch(#[from] fm_core::PatchError),

    #[error("Stamp error for {path}: {message}")]
    Stamp { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Pre-flight failures happen before any side effect.
    pub fn is_preflight(&self) -> bool {
        matches!(self, BuildError::MissingTool { .. })
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
