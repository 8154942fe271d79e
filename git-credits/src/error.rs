//! Error type for the contributor scorer

/// Failures while replaying history or writing the report.
#[derive(Debug, thiserror::Error)]
pub enum CreditsError {
    #[error("Found too few commits in total ({found}, need {required}), do you have a shallow clone? Aborting.")]
    ShallowHistory { found: usize, required: usize },

    #[error("`git {args}` failed: {message}")]
    Git { args: String, message: String },

    #[error("Failed to launch git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Unexpected git output: {0:?}")]
    Malformed(String),

    #[error("Invalid scorer config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CreditsError>;
