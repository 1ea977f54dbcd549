use super::config::ConfigError;
use crate::core::models::alignment::AlignmentError;
use crate::core::weights::WeightError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to allocate {bytes} bytes for the pairwise gradient buffers")]
    Allocation { bytes: usize },

    #[error("Expected a parameter vector of padded length {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Invalid alignment: {source}")]
    Alignment {
        #[from]
        source: AlignmentError,
    },

    #[error("Sequence weighting failed: {source}")]
    Weights {
        #[from]
        source: WeightError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}
