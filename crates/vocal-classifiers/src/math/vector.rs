use std::iter::FromIterator;
use std::ops::Index;
use std::slice::Iter;

use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Owned 1-D array used for labels, scores and per-feature weights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Array1<T> {
    data: Vec<T>,
}

impl<T> Array1<T> {
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.data.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn select(&self, indices: &[usize]) -> Array1<T>
    where
        T: Clone,
    {
        indices.iter().map(|&idx| self.data[idx].clone()).collect()
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.data.clone()
    }
}

impl Array1<bool> {
    /// Number of `true` entries (positive-class samples for a label vector).
    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

impl<T: Float> Array1<T> {
    /// Arithmetic mean, `None` for an empty array.
    pub fn mean(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let sum = self.data.iter().fold(T::zero(), |acc, &v| acc + v);
        Some(sum / T::from(self.len())?)
    }
}

impl<T> From<Vec<T>> for Array1<T> {
    fn from(value: Vec<T>) -> Self {
        Array1::from_vec(value)
    }
}

impl<T> From<Array1<T>> for Vec<T> {
    fn from(value: Array1<T>) -> Self {
        value.data
    }
}

impl<T> FromIterator<T> for Array1<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Array1::from_vec(iter.into_iter().collect())
    }
}

impl<T> Index<usize> for Array1<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}
