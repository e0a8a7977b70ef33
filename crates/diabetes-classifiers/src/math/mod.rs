//! Small ndarray-like matrix type used throughout the crate.
//!
//! `Array2` is a row-major container with just the operations the
//! pipeline needs (row access, row selection, column extraction).
pub mod matrix;

pub use matrix::{Array2, ShapeError};
