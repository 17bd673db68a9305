use std::error::Error;
use std::fmt;
use std::ops::Index;

use crate::math::vector::Array1;

/// Dense row-major matrix. Rows are samples, columns are features.
#[derive(Clone, Debug, PartialEq)]
pub struct Array2<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T> Array2<T> {
    pub fn from_shape_vec(shape: (usize, usize), data: Vec<T>) -> Result<Self, ShapeError> {
        let (rows, cols) = shape;
        if data.len() != rows * cols {
            return Err(ShapeError::Length {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Build a matrix from per-sample rows. Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, ShapeError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(ShapeError::RaggedRow {
                    row: idx,
                    expected: n_cols,
                    found: row.len(),
                });
            }
            data.extend(row);
        }
        Ok(Self {
            data,
            rows: n_rows,
            cols: n_cols,
        })
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn row_slice(&self, row: usize) -> &[T] {
        let start = self.offset(row, 0);
        &self.data[start..start + self.cols]
    }

    /// Iterate over rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.rows).map(move |r| self.row_slice(r))
    }

    pub fn column(&self, col: usize) -> Array1<T>
    where
        T: Clone,
    {
        assert!(col < self.cols, "column index out of bounds");
        (0..self.rows).map(|row| self[(row, col)].clone()).collect()
    }

    pub fn select_rows(&self, indices: &[usize]) -> Array2<T>
    where
        T: Clone,
    {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &row in indices {
            data.extend_from_slice(self.row_slice(row));
        }
        Array2 {
            data,
            rows: indices.len(),
            cols: self.cols,
        }
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.data.clone()
    }
}

impl Array2<f64> {
    /// `row · weights + bias` for one sample.
    #[inline]
    pub fn row_dot(&self, row: usize, weights: &[f64], bias: f64) -> f64 {
        debug_assert_eq!(weights.len(), self.cols);
        self.row_slice(row)
            .iter()
            .zip(weights)
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + bias
    }

    pub fn all_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

impl<T> Index<(usize, usize)> for Array2<T> {
    type Output = T;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let offset = self.offset(index.0, index.1);
        &self.data[offset]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeError {
    Length { rows: usize, cols: usize, len: usize },
    RaggedRow { row: usize, expected: usize, found: usize },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::Length { rows, cols, len } => write!(
                f,
                "invalid shape ({}, {}) for buffer of length {}",
                rows, cols, len
            ),
            ShapeError::RaggedRow { row, expected, found } => write!(
                f,
                "row {} has {} values, expected {}",
                row, found, expected
            ),
        }
    }
}

impl Error for ShapeError {}
