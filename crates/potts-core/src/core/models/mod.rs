//! Data models consumed by the evaluator.
//!
//! - [`alignment`] - Rectangular table of encoded sequences over a fixed alphabet

pub mod alignment;
