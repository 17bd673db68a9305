#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use vocal_classifiers::math::{Array1, Array2};
use vocal_classifiers::Dataset;

pub const FEATURES: [&str; 4] = ["hnr", "jitter_local", "noise_a", "noise_b"];

/// `hnr` rises with the positive class, `jitter_local` falls with it, the rest is noise.
pub fn voice_dataset(n: usize, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let positive = i % 2 == 0;
        let s = if positive { 1.0 } else { -1.0 };
        rows.push(vec![
            s + rng.gen_range(-1.2..1.2),
            -0.8 * s + rng.gen_range(-1.2..1.2),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        ]);
        labels.push(positive);
    }
    Dataset::new(
        Array2::from_rows(rows).unwrap(),
        Array1::from_vec(labels),
        FEATURES.iter().map(|s| s.to_string()).collect(),
    )
    .unwrap()
}
