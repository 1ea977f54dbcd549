//! # Core Module
//!
//! Stateless building blocks of the pseudo-likelihood evaluator.
//!
//! - **Alignment** ([`models`]) - The encoded, read-only multiple sequence alignment
//! - **Parameter layout** ([`layout`]) - Addressing of the padded parameter and gradient vectors
//! - **Sequence weighting** ([`weights`]) - Uniform and similarity-based row weights
//! - **Objective pieces** ([`pll`]) - Conditional fields, symmetrization and regularization
//!
//! Nothing in this module keeps state between evaluations; the [`crate::engine`]
//! layer owns the buffers and drives these functions.

pub mod layout;
pub mod models;
pub mod pll;
pub mod weights;
