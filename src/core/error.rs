//! Error types for tree synthesis and dataset export

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Malformed parameter record: {0}")]
    MalformedRecord(String),

    #[error("No acceptable tree after {attempts} attempts")]
    RetryBudgetExhausted { attempts: u32 },

    #[error("Degenerate sample: {0}")]
    DegenerateSample(String),
}
