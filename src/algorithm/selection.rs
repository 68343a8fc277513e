use ndarray::Array3;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::algorithm::bitset::DomainSet;
use crate::catalog::Catalog;
use crate::io::configuration::ENTROPY_TIE_TOLERANCE;
use crate::math::probability::{cumulative_index, weighted_entropy};
use crate::spatial::grid::{Coord, Grid};

/// Seeded random selector for reproducible stochastic choices
///
/// Every random decision of one run draws from the same generator, so a run
/// is fully determined by its seed.
#[derive(Clone, Debug)]
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    /// Create a deterministic random selector
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Weighted random selection over integer weights
    ///
    /// Returns an index into `weights` with probability proportional to its
    /// weight, or `None` when every weight is zero.
    pub fn weighted_choice(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u64 = weights.iter().map(|&w| u64::from(w)).sum();
        if total == 0 {
            return None;
        }
        let draw = self.rng.random_range(0..total);
        cumulative_index(weights, draw)
    }

    /// Uniform index in `0..len`, `None` when `len` is zero
    pub fn uniform_index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.rng.random_range(0..len))
    }
}

/// Weighted Shannon entropy of a domain
pub fn domain_entropy(domain: &DomainSet, catalog: &Catalog) -> f64 {
    weighted_entropy(domain.iter().map(|index| catalog.weight(index)))
}

/// Pick the undecided cell with the lowest entropy
///
/// Only cells with more than one candidate compete. Entropies within
/// `ENTROPY_TIE_TOLERANCE` of the minimum count as tied and one of them is
/// chosen uniformly. Returns `None` when no cell is left undecided.
pub fn select_lowest_entropy(
    grid: &Grid,
    entropy: &Array3<f64>,
    selector: &mut RandomSelector,
) -> Option<Coord> {
    let entropy_at = |coord: Coord| {
        entropy
            .get([coord.z, coord.y, coord.x])
            .copied()
            .unwrap_or(f64::INFINITY)
    };

    let minimum = grid
        .cells()
        .filter(|cell| cell.domain.count() > 1)
        .map(|cell| entropy_at(cell.coord))
        .fold(f64::INFINITY, f64::min);

    if minimum.is_infinite() {
        return None;
    }

    let tied: Vec<Coord> = grid
        .cells()
        .filter(|cell| cell.domain.count() > 1)
        .filter(|cell| entropy_at(cell.coord) - minimum <= ENTROPY_TIE_TOLERANCE)
        .map(|cell| cell.coord)
        .collect();

    let pick = selector.uniform_index(tied.len())?;
    tied.get(pick).copied()
}

/// Draw one prototype from a domain proportionally to catalog weight
pub fn choose_prototype(
    domain: &DomainSet,
    catalog: &Catalog,
    selector: &mut RandomSelector,
) -> Option<usize> {
    let candidates = domain.to_vec();
    let weights: Vec<u32> = candidates
        .iter()
        .map(|&index| catalog.weight(index))
        .collect();

    let pick = selector.weighted_choice(&weights)?;
    candidates.get(pick).copied()
}
