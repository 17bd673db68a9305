//! Small dense containers for the sample matrix and per-sample vectors.
//!
//! `Array2` is row-major with one row per recording; `Array1` carries labels,
//! scores and feature weights. `ndarray` is only used at the linfa boundary.
pub mod matrix;
pub mod vector;

pub use matrix::{Array2, ShapeError};
pub use vector::Array1;
