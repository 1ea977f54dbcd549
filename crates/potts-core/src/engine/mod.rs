//! # Engine Module
//!
//! The stateful side of the library: one [`evaluator::PseudoLikelihood`] per
//! optimization run.
//!
//! ## Lifecycle
//!
//! 1. `init` validates the configuration, allocates the pairwise accumulator and
//!    one partial per extra row worker, and computes the sequence weights.
//! 2. `evaluate` is called once per optimizer iteration. It accumulates the loss
//!    and raw gradients over all rows ([`tasks::accumulate`]), symmetrizes the
//!    pairwise gradient and adds the L2 penalty.
//! 3. `destroy` releases the scratch buffers.
//!
//! - **Configuration** ([`config`]) - Regularization strengths and reweighting mode
//! - **Scratch storage** ([`buffer`]) - Accumulator and per-worker partials, allocated once
//! - **Error Handling** ([`error`]) - Engine-level error type

pub mod buffer;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod tasks;
