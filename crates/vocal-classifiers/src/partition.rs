//! Deterministic K-fold partitioning.
//!
//! The sample indices are shuffled once with a seeded ChaCha stream and cut
//! into K contiguous chunks of the shuffled order. The first `N mod K` folds
//! hold one extra sample. The same `(N, K, seed)` always gives the same folds,
//! so one assignment can be shared by search and scoring within a run.
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::error::SelectionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoldAssignment {
    n_samples: usize,
    seed: u64,
    folds: Vec<Vec<usize>>,
    /// Fold index of every sample.
    membership: Vec<usize>,
}

/// Train/validation indices for one fold; both sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    pub fold: usize,
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

impl FoldAssignment {
    pub fn new(n_samples: usize, k: usize, seed: u64) -> Result<Self, SelectionError> {
        if k < 2 {
            return Err(SelectionError::configuration(format!(
                "at least 2 folds are required, got {}",
                k
            )));
        }
        if k > n_samples {
            return Err(SelectionError::configuration(format!(
                "cannot split {} samples into {} folds",
                n_samples, k
            )));
        }

        let mut order: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let base = n_samples / k;
        let extra = n_samples % k;
        let mut folds = Vec::with_capacity(k);
        let mut membership = vec![0; n_samples];
        let mut start = 0;
        for fold in 0..k {
            let size = base + usize::from(fold < extra);
            let mut members = order[start..start + size].to_vec();
            members.sort_unstable();
            for &i in &members {
                membership[i] = fold;
            }
            folds.push(members);
            start += size;
        }

        Ok(FoldAssignment {
            n_samples,
            seed,
            folds,
            membership,
        })
    }

    pub fn k(&self) -> usize {
        self.folds.len()
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Sample indices of fold `i`, sorted ascending.
    pub fn fold(&self, i: usize) -> &[usize] {
        &self.folds[i]
    }

    pub fn fold_sizes(&self) -> Vec<usize> {
        self.folds.iter().map(Vec::len).collect()
    }

    pub fn fold_of(&self, sample: usize) -> Option<usize> {
        self.membership.get(sample).copied()
    }

    pub fn split(&self, fold: usize) -> FoldSplit {
        let train = (0..self.n_samples)
            .filter(|&i| self.membership[i] != fold)
            .collect();
        FoldSplit {
            fold,
            train,
            validation: self.folds[fold].clone(),
        }
    }

    pub fn splits(&self) -> impl Iterator<Item = FoldSplit> + '_ {
        (0..self.k()).map(move |fold| self.split(fold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_cover_every_index_once() {
        for &(n, k) in &[(10, 2), (11, 3), (195, 5), (7, 7)] {
            let folds = FoldAssignment::new(n, k, 41).unwrap();
            assert_eq!(folds.k(), k);
            let mut seen = vec![0; n];
            for fold in 0..k {
                for &i in folds.fold(fold) {
                    seen[i] += 1;
                    assert_eq!(folds.fold_of(i), Some(fold));
                }
            }
            assert!(seen.iter().all(|&c| c == 1));
            let sizes = folds.fold_sizes();
            assert_eq!(sizes.iter().sum::<usize>(), n);
            assert!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap() <= 1);
        }
    }

    #[test]
    fn same_inputs_give_identical_folds() {
        let a = FoldAssignment::new(57, 5, 1234).unwrap();
        let b = FoldAssignment::new(57, 5, 1234).unwrap();
        for fold in 0..5 {
            assert_eq!(a.fold(fold), b.fold(fold));
        }
        assert_eq!(a.splits().collect::<Vec<_>>(), b.splits().collect::<Vec<_>>());

        let other = FoldAssignment::new(57, 5, 1235).unwrap();
        assert!((0..5).any(|fold| a.fold(fold) != other.fold(fold)));
    }

    #[test]
    fn first_folds_take_the_remainder() {
        let folds = FoldAssignment::new(12, 5, 0).unwrap();
        assert_eq!(folds.fold_sizes(), vec![3, 3, 2, 2, 2]);
    }

    #[test]
    fn split_is_complementary() {
        let folds = FoldAssignment::new(9, 3, 5).unwrap();
        for split in folds.splits() {
            assert_eq!(split.train.len() + split.validation.len(), 9);
            assert!(split.train.iter().all(|i| !split.validation.contains(i)));
            assert!(split.train.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn shuffled_rather_than_contiguous() {
        let folds = FoldAssignment::new(100, 4, 41).unwrap();
        let contiguous: Vec<usize> = (0..25).collect();
        assert_ne!(folds.fold(0), contiguous.as_slice());
    }

    #[test]
    fn invalid_fold_counts() {
        assert!(matches!(
            FoldAssignment::new(10, 1, 0),
            Err(SelectionError::Configuration(_))
        ));
        assert!(matches!(
            FoldAssignment::new(3, 4, 0),
            Err(SelectionError::Configuration(_))
        ));
    }
}
