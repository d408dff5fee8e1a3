//! Two-level bootstrap resampling.
//!
//! The outer level redraws the rows the effect estimator is fitted on; the
//! inner level redraws the fitted rows when aggregating predictions into
//! measures. Every outer replicate owns its own generator, derived from the
//! base seed and the replicate index, so results do not depend on whether
//! replicates run sequentially or on a thread pool.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::types::IndexSubset;

/// Counter-based RNG seed generation using SplitMix64.
///
/// A stateless mix of a base seed and a counter. Consecutive counters give
/// well-separated seeds, unlike plain addition.
///
/// # Arguments
///
/// * `base_seed` - Base random seed
/// * `counter` - Replicate or stream index (0, 1, 2, ...)
#[inline]
pub fn counter_rng_seed(base_seed: u64, counter: u64) -> u64 {
    // SplitMix64: https://xoshiro.di.unimi.it/splitmix64.c
    let mut z = base_seed.wrapping_add(counter.wrapping_mul(0x9e3779b97f4a7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Generator for one outer replicate.
pub fn replicate_rng(base_seed: u64, rep: usize) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(base_seed, rep as u64))
}

/// Rows of the outer bootstrap sample for replicate `rep`.
///
/// Replicate 0 is the point estimate and returns `0..n` unchanged. Every
/// other replicate draws `n` rows uniformly with replacement.
pub fn outer_bootstrap_rows<R: Rng>(n: usize, rep: usize, rng: &mut R) -> Vec<usize> {
    if rep == 0 || n == 0 {
        return (0..n).collect();
    }
    (0..n).map(|_| rng.random_range(0..n)).collect()
}

/// Inner bootstrap draws for one outer replicate.
///
/// For inner id `b`, [`all`](Self::all) holds `m` positions into the outer
/// sample drawn with replacement, and [`id0`](Self::id0) /
/// [`id1`](Self::id1) hold the same positions split by attribute level.
///
/// Storage is two flat arenas of `nboot * m` positions each: `all` blocks in
/// draw order, and `split` blocks holding the `id0` run followed by the `id1`
/// run. `n0[b]` marks the boundary.
#[derive(Debug, Clone)]
pub struct BootstrapIndexSet {
    rows: usize,
    nboot: usize,
    all: Vec<usize>,
    split: Vec<usize>,
    n0: Vec<usize>,
}

impl BootstrapIndexSet {
    /// Draw `nboot` inner replicates over an outer sample.
    ///
    /// # Arguments
    ///
    /// * `treated` - Attribute of each outer-sample row, `false` at `x0`
    /// * `nboot` - Number of inner replicates
    /// * `identity_first` - Use `0..m` for inner id 0 instead of a random draw
    /// * `rng` - Random number generator
    pub fn draw<R: Rng>(treated: &[bool], nboot: usize, identity_first: bool, rng: &mut R) -> Self {
        let m = treated.len();
        let mut all = Vec::with_capacity(nboot * m);
        let mut split = Vec::with_capacity(nboot * m);
        let mut n0 = Vec::with_capacity(nboot);

        for b in 0..nboot {
            let start = all.len();
            if b == 0 && identity_first {
                all.extend(0..m);
            } else if m > 0 {
                all.extend((0..m).map(|_| rng.random_range(0..m)));
            }
            let block = &all[start..];

            split.extend(block.iter().copied().filter(|&i| !treated[i]));
            let count0 = split.len() - start;
            split.extend(block.iter().copied().filter(|&i| treated[i]));
            n0.push(count0);
        }

        Self {
            rows: m,
            nboot,
            all,
            split,
            n0,
        }
    }

    /// Rows in the outer sample (`m`).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of inner replicates.
    pub fn nboot(&self) -> usize {
        self.nboot
    }

    /// Every drawn position for inner id `b`.
    pub fn all(&self, b: usize) -> &[usize] {
        &self.all[b * self.rows..(b + 1) * self.rows]
    }

    /// Drawn positions at level `x0` for inner id `b`.
    pub fn id0(&self, b: usize) -> &[usize] {
        let start = b * self.rows;
        &self.split[start..start + self.n0[b]]
    }

    /// Drawn positions at level `x1` for inner id `b`.
    pub fn id1(&self, b: usize) -> &[usize] {
        let start = b * self.rows;
        &self.split[start + self.n0[b]..start + self.rows]
    }

    /// Positions for inner id `b` restricted to `subset`.
    pub fn subset(&self, b: usize, subset: IndexSubset) -> &[usize] {
        match subset {
            IndexSubset::All => self.all(b),
            IndexSubset::Id0 => self.id0(b),
            IndexSubset::Id1 => self.id1(b),
        }
    }
}
