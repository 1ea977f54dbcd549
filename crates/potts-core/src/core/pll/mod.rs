//! Building blocks of the pseudo-likelihood objective.
//!
//! - [`fields`] computes the conditional distribution of every column of one row.
//! - [`symmetrize`] folds the raw pairwise gradient into its symmetric, self-edge-free form.
//! - [`regularization`] adds the L2 penalty and its gradient.

pub mod fields;
pub mod regularization;
pub mod symmetrize;
