//! Computational passes run by the evaluator on every call.
//!
//! [`accumulate`] walks the alignment rows and produces the loss together with the
//! raw single-site and pairwise gradients.

pub mod accumulate;
