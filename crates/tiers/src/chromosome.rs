//! Tier chromosome: the candidate encoding and its genetic operators.
//!
//! A chromosome encodes three genes:
//!
//! - `num_containers`: how many tiers to open (1..=max_containers)
//! - `container_heights`: per-tier height hints used by the packer's fit
//!   check; the realized heights are re-derived after placement
//! - `rectangle_order`: a permutation of rectangle ids giving placement
//!   priority
//!
//! Every operator returns or leaves behind a chromosome whose order is a
//! permutation of `0..n` and whose hint list is at least `num_containers`
//! long with every hint positive.

use crate::container::Container;
use crate::packer::PackOutcome;
use rand::prelude::*;
use u_rack_core::Individual;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest height hint, as a fraction of the stack height budget.
const MIN_HINT_FRACTION: f64 = 0.01;

/// Relative range of a single height perturbation.
const PERTURB_RANGE: f64 = 0.3;

/// Problem bounds shared by all chromosomes of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodingLimits {
    /// Number of rectangles.
    pub rect_count: usize,
    /// Maximum number of tiers.
    pub max_containers: usize,
    /// Height budget of the stack.
    pub max_total_height: f64,
}

impl EncodingLimits {
    /// Smallest allowed height hint.
    pub fn min_hint(&self) -> f64 {
        self.max_total_height * MIN_HINT_FRACTION
    }

    /// Even share of the height budget for `num_containers` tiers.
    pub fn uniform_hint(&self, num_containers: usize) -> f64 {
        self.max_total_height / num_containers.max(1) as f64
    }
}

/// The kinds of mutation, picked uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MutationKind {
    /// Draw a new tier count.
    ResizeContainers,
    /// Scale one tier's hint by up to ±30%.
    PerturbHeight,
    /// Swap two positions of the placement order.
    SwapOrder,
    /// Spread the height budget evenly with ±20% jitter.
    RebalanceHeights,
    /// Shuffle a contiguous third-to-two-thirds of the placement order.
    ShuffleRun,
    /// Spread the height budget with strongly uneven random shares.
    RandomizeHeights,
}

impl MutationKind {
    /// Every mutation kind.
    pub const ALL: [MutationKind; 6] = [
        MutationKind::ResizeContainers,
        MutationKind::PerturbHeight,
        MutationKind::SwapOrder,
        MutationKind::RebalanceHeights,
        MutationKind::ShuffleRun,
        MutationKind::RandomizeHeights,
    ];

    /// Picks a kind uniformly at random.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Candidate solution for stacked tier packing.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TierChromosome {
    /// Number of tiers to open.
    pub num_containers: usize,
    /// Height hint per tier.
    pub container_heights: Vec<f64>,
    /// Placement priority as a permutation of rectangle ids.
    pub rectangle_order: Vec<usize>,
    /// Seed of the packer's height jitter for this encoding.
    pub jitter_seed: u64,
    fitness: Option<f64>,
    containers: Vec<Container>,
    rectangles_placed: usize,
    total_height_used: f64,
    assignments: Vec<Option<usize>>,
}

impl TierChromosome {
    /// Creates a chromosome with identity order and evenly split hints.
    pub fn new(limits: &EncodingLimits, num_containers: usize) -> Self {
        let num_containers = num_containers.clamp(1, limits.max_containers.max(1));
        Self {
            num_containers,
            container_heights: vec![limits.uniform_hint(num_containers); num_containers],
            rectangle_order: (0..limits.rect_count).collect(),
            jitter_seed: 0,
            fitness: None,
            containers: Vec::new(),
            rectangles_placed: 0,
            total_height_used: 0.0,
            assignments: Vec::new(),
        }
    }

    /// Creates a random chromosome: random tier count, shuffled order.
    pub fn random<R: Rng>(limits: &EncodingLimits, rng: &mut R) -> Self {
        let num_containers = rng.gen_range(1..=limits.max_containers.max(1));
        let mut chromosome = Self::new(limits, num_containers);
        chromosome.rectangle_order.shuffle(rng);
        chromosome.jitter_seed = rng.gen();
        chromosome
    }

    /// Height hints of the active tiers.
    pub fn active_heights(&self) -> &[f64] {
        &self.container_heights[..self.num_containers.min(self.container_heights.len())]
    }

    /// Realized tiers of the last evaluation.
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    /// Rectangles placed by the last evaluation.
    pub fn rectangles_placed(&self) -> usize {
        self.rectangles_placed
    }

    /// Sum of realized tier heights.
    pub fn total_height_used(&self) -> f64 {
        self.total_height_used
    }

    /// Tier index per rectangle id, `None` if unplaced.
    pub fn assignments(&self) -> &[Option<usize>] {
        &self.assignments
    }

    /// Returns true if `rectangle_order` is a permutation of `0..n`.
    pub fn has_valid_order(&self) -> bool {
        let n = self.rectangle_order.len();
        let mut seen = vec![false; n];
        self.rectangle_order.iter().all(|&id| {
            if id >= n || seen[id] {
                return false;
            }
            seen[id] = true;
            true
        })
    }

    pub(crate) fn set_evaluation(&mut self, outcome: PackOutcome, fitness: f64) {
        self.total_height_used = outcome.containers.iter().map(|c| c.height).sum();
        self.rectangles_placed = outcome.placed;
        self.containers = outcome.containers;
        self.assignments = outcome.assignments;
        self.fitness = Some(fitness);
    }

    /// Drops cached results and draws a new jitter seed.
    fn invalidate<R: Rng>(&mut self, rng: &mut R) {
        self.fitness = None;
        self.containers.clear();
        self.assignments.clear();
        self.rectangles_placed = 0;
        self.total_height_used = 0.0;
        self.jitter_seed = rng.gen();
    }

    /// Two-child crossover.
    ///
    /// Tier counts and each hint index are exchanged by independent coin
    /// flips; the order is recombined by order crossover (OX1).
    pub fn crossover<R: Rng>(
        &self,
        other: &Self,
        limits: &EncodingLimits,
        rng: &mut R,
    ) -> (Self, Self) {
        let (n1, n2) = if rng.gen() {
            (self.num_containers, other.num_containers)
        } else {
            (other.num_containers, self.num_containers)
        };

        let mut heights1 = Vec::with_capacity(n1);
        let mut heights2 = Vec::with_capacity(n2);
        for i in 0..n1.max(n2) {
            let (h1, h2) = if rng.gen() {
                (self.container_heights.get(i), other.container_heights.get(i))
            } else {
                (other.container_heights.get(i), self.container_heights.get(i))
            };
            if i < n1 {
                heights1.push(h1.copied().unwrap_or_else(|| limits.uniform_hint(n1)));
            }
            if i < n2 {
                heights2.push(h2.copied().unwrap_or_else(|| limits.uniform_hint(n2)));
            }
        }

        let (order1, order2) = order_crossover(&self.rectangle_order, &other.rectangle_order, rng);

        let mut child1 = self.clone();
        child1.num_containers = n1;
        child1.container_heights = heights1;
        child1.rectangle_order = order1;
        child1.invalidate(rng);

        let mut child2 = other.clone();
        child2.num_containers = n2;
        child2.container_heights = heights2;
        child2.rectangle_order = order2;
        child2.invalidate(rng);

        (child1, child2)
    }

    /// Applies one mutation of the given kind.
    pub fn mutate<R: Rng>(&mut self, kind: MutationKind, limits: &EncodingLimits, rng: &mut R) {
        let min_hint = limits.min_hint();

        match kind {
            MutationKind::ResizeContainers => {
                self.num_containers = rng.gen_range(1..=limits.max_containers.max(1));
                self.fit_heights(limits);
            }
            MutationKind::PerturbHeight => {
                self.fit_heights(limits);
                let idx = rng.gen_range(0..self.num_containers);
                let current = self.container_heights[idx];
                let delta = rng.gen_range(-PERTURB_RANGE..=PERTURB_RANGE) * current;
                self.container_heights[idx] = (current + delta).max(min_hint);

                let total: f64 = self.active_heights().iter().sum();
                if total > limits.max_total_height {
                    let factor = limits.max_total_height / total;
                    for h in &mut self.container_heights[..self.num_containers] {
                        *h *= factor;
                    }
                }
            }
            MutationKind::SwapOrder => {
                let n = self.rectangle_order.len();
                if n > 1 {
                    let i = rng.gen_range(0..n);
                    let mut j = rng.gen_range(0..n - 1);
                    if j >= i {
                        j += 1;
                    }
                    self.rectangle_order.swap(i, j);
                }
            }
            MutationKind::RebalanceHeights => {
                let avg = limits.uniform_hint(self.num_containers);
                self.distribute_heights(
                    limits,
                    |remaining, rng| (avg * rng.gen_range(0.8..=1.2)).min(remaining),
                    rng,
                );
            }
            MutationKind::ShuffleRun => {
                let n = self.rectangle_order.len();
                if n > 2 {
                    let size = rng.gen_range(n / 3..=n * 2 / 3);
                    let start = rng.gen_range(0..=n - size);
                    self.rectangle_order[start..start + size].shuffle(rng);
                }
            }
            MutationKind::RandomizeHeights => {
                self.distribute_heights(
                    limits,
                    |remaining, rng| {
                        let upper = remaining * 0.8;
                        if upper > min_hint {
                            rng.gen_range(min_hint..upper)
                        } else {
                            min_hint
                        }
                    },
                    rng,
                );
            }
        }

        self.invalidate(rng);
    }

    /// Truncates or extends the hint list to exactly `num_containers` entries.
    fn fit_heights(&mut self, limits: &EncodingLimits) {
        let fill = limits.uniform_hint(self.num_containers);
        self.container_heights.resize(self.num_containers, fill);
    }

    /// Rebuilds the hints by handing out the height budget tier by tier;
    /// the last tier takes whatever is left.
    fn distribute_heights<R: Rng, F>(&mut self, limits: &EncodingLimits, mut share: F, rng: &mut R)
    where
        F: FnMut(f64, &mut R) -> f64,
    {
        let min_hint = limits.min_hint();
        let mut remaining = limits.max_total_height;
        self.container_heights.clear();

        for i in 0..self.num_containers {
            let height = if i + 1 == self.num_containers {
                remaining
            } else {
                share(remaining, rng)
            };
            self.container_heights.push(height.max(min_hint));
            remaining -= height;
        }
    }
}

impl Individual for TierChromosome {
    fn fitness(&self) -> f64 {
        self.fitness.unwrap_or(f64::NEG_INFINITY)
    }

    fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }
}

/// Order crossover (OX1) producing both children.
///
/// Each child copies a random slice from one parent verbatim and fills the
/// remaining positions, starting after the slice and wrapping around, with
/// the other parent's genes in their relative order.
pub fn order_crossover<R: Rng>(a: &[usize], b: &[usize], rng: &mut R) -> (Vec<usize>, Vec<usize>) {
    let n = a.len();
    if n < 2 || b.len() != n {
        return (a.to_vec(), b.to_vec());
    }

    let (mut p1, mut p2) = (rng.gen_range(0..n), rng.gen_range(0..n));
    if p1 > p2 {
        std::mem::swap(&mut p1, &mut p2);
    }

    (ox_child(a, b, p1, p2), ox_child(b, a, p1, p2))
}

fn ox_child(donor: &[usize], filler: &[usize], p1: usize, p2: usize) -> Vec<usize> {
    let n = donor.len();
    let mut child = vec![usize::MAX; n];
    let mut used = vec![false; n];

    for i in p1..=p2 {
        child[i] = donor[i];
        used[donor[i]] = true;
    }

    let mut j = (p2 + 1) % n;
    for i in 0..n {
        let idx = (p2 + 1 + i) % n;
        if child[idx] == usize::MAX {
            while used[filler[j]] {
                j = (j + 1) % n;
            }
            child[idx] = filler[j];
            used[filler[j]] = true;
            j = (j + 1) % n;
        }
    }

    child
}
