use super::models::alignment::Alignment;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Identity threshold used by the similarity reweighting when none is configured.
pub const DEFAULT_IDENTITY_THRESHOLD: f64 = 0.8;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum WeightError {
    #[error("Expected {expected} sequence weights, got {found}")]
    CountMismatch { expected: usize, found: usize },
    #[error("Sequence weight {value} at row {row} is negative or not finite")]
    InvalidWeight { row: usize, value: f64 },
    #[error("Identity threshold must lie in [0, 1], got {0}")]
    InvalidThreshold(f64),
}

/// How rows of the alignment are weighted before the first evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Reweighting {
    /// Every row is trusted equally and receives weight 1.
    None,
    /// Rows are down-weighted by the number of rows sharing more than
    /// `threshold` of their columns with them.
    Similarity { threshold: f64 },
}

impl Default for Reweighting {
    fn default() -> Self {
        Self::Similarity {
            threshold: DEFAULT_IDENTITY_THRESHOLD,
        }
    }
}

impl Reweighting {
    pub fn validate(&self) -> Result<(), WeightError> {
        match *self {
            Self::None => Ok(()),
            Self::Similarity { threshold } if (0.0..=1.0).contains(&threshold) => Ok(()),
            Self::Similarity { threshold } => Err(WeightError::InvalidThreshold(threshold)),
        }
    }
}

/// Source of per-row sequence weights.
pub trait WeightProvider {
    fn uniform_weights(&self, count: usize) -> Vec<f64> {
        vec![1.0; count]
    }

    fn similarity_weights(&self, alignment: &Alignment, threshold: f64) -> Vec<f64>;

    /// Dispatches on the configured mode and checks the produced weights.
    fn weights_for(
        &self,
        alignment: &Alignment,
        reweighting: Reweighting,
    ) -> Result<Vec<f64>, WeightError> {
        reweighting.validate()?;
        let weights = match reweighting {
            Reweighting::None => self.uniform_weights(alignment.nrow()),
            Reweighting::Similarity { threshold } => self.similarity_weights(alignment, threshold),
        };
        validate_weights(&weights, alignment.nrow())?;
        Ok(weights)
    }
}

/// Checks that there is one finite, non-negative weight per row.
pub fn validate_weights(weights: &[f64], nrow: usize) -> Result<(), WeightError> {
    if weights.len() != nrow {
        return Err(WeightError::CountMismatch {
            expected: nrow,
            found: weights.len(),
        });
    }
    match weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        Some((row, &value)) => Err(WeightError::InvalidWeight { row, value }),
        None => Ok(()),
    }
}

/// Effective number of sequences: the total weight of the alignment.
pub fn effective_count(weights: &[f64]) -> f64 {
    weights.iter().sum()
}

/// Inverse neighbour-count weighting by pairwise sequence identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityReweighting;

impl IdentityReweighting {
    fn neighbour_count(alignment: &Alignment, i: usize, min_identical: f64) -> usize {
        let row = alignment.row(i);
        alignment
            .rows()
            .filter(|other| {
                let identical = row.iter().zip(other.iter()).filter(|(a, b)| a == b).count();
                identical as f64 > min_identical
            })
            .count()
    }
}

impl WeightProvider for IdentityReweighting {
    #[instrument(skip_all, name = "similarity_weights", fields(threshold = threshold))]
    fn similarity_weights(&self, alignment: &Alignment, threshold: f64) -> Vec<f64> {
        let nrow = alignment.nrow();
        if alignment.ncol() == 0 {
            return self.uniform_weights(nrow);
        }
        let min_identical = threshold * alignment.ncol() as f64;

        #[cfg(not(feature = "parallel"))]
        let iterator = 0..nrow;

        #[cfg(feature = "parallel")]
        let iterator = (0..nrow).into_par_iter();

        let weights: Vec<f64> = iterator
            .map(|i| match Self::neighbour_count(alignment, i, min_identical) {
                0 => 1.0,
                n => 1.0 / n as f64,
            })
            .collect();

        debug!(
            neff = effective_count(&weights),
            nrow, "Computed similarity weights."
        );
        weights
    }
}
