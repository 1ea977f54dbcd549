//! # Potts Pseudo-Likelihood Core Library
//!
//! Objective and gradient of the regularized pseudo-likelihood of a Potts model
//! (a pairwise Markov random field) fitted to a multiple sequence alignment. The
//! evaluator is meant to be driven by an external gradient-based minimizer, whose
//! converged couplings are then used for residue-contact prediction.
//!
//! ## Architectural Philosophy
//!
//! The library follows a two-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Alignment`), the flat
//!   parameter `Layout`, sequence weighting, and the pure building blocks of the
//!   objective (per-row conditional fields, symmetrization, L2 regularization).
//!
//! - **[`engine`]: The Logic Core.** The stateful evaluator. It owns the sequence
//!   weights and the pairwise accumulation buffer for one optimization run and
//!   orchestrates the per-row accumulation, in parallel when the `parallel`
//!   feature is enabled.
//!
//! ## Example
//!
//! ```ignore
//! use potts_pll::core::models::alignment::Alignment;
//! use potts_pll::engine::config::EvaluatorConfig;
//! use potts_pll::engine::evaluator::PseudoLikelihood;
//!
//! let alignment = Alignment::from_rows(21, &rows)?;
//! let mut evaluator = PseudoLikelihood::init(&alignment, &EvaluatorConfig::default())?;
//! let x = evaluator.layout().zeros();
//! let mut g = evaluator.layout().zeros();
//! let loss = evaluator.evaluate(&x, &mut g)?;
//! evaluator.destroy();
//! ```

pub mod core;
pub mod engine;
