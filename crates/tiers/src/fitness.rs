//! Fitness evaluation for packed tier layouts.
//!
//! Fitness is a weighted sum, higher is better:
//!
//! ```text
//! fitness = placement_rate * placement
//!         + full_placement_bonus          (only if every rectangle is placed)
//!         + avg_utilization * utilization
//!         + sum(min_height / height) * compactness   (two-sided tiers only)
//!         - num_containers / max_containers * container_count
//!         - total_height / max_total_height * total_height
//!         - clashing_tiers * clash
//! ```
//!
//! A layout that places nothing short-circuits to `zero_placement`.

use crate::container::Container;
use crate::rectangle::Rectangle;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Weights of the fitness terms.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FitnessWeights {
    /// Multiplier of the placement rate.
    pub placement: f64,
    /// Flat bonus when every rectangle is placed.
    pub full_placement_bonus: f64,
    /// Multiplier of the mean tier utilization.
    pub utilization: f64,
    /// Multiplier of each two-sided tier's `min_height / height`.
    pub compactness: f64,
    /// Multiplier of `num_containers / max_containers`.
    pub container_count: f64,
    /// Multiplier of `total_height / max_total_height`.
    pub total_height: f64,
    /// Penalty per tier with a clash.
    pub clash: f64,
    /// Fitness of a layout that places nothing.
    pub zero_placement: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            placement: 1000.0,
            full_placement_bonus: 500.0,
            utilization: 300.0,
            compactness: 200.0,
            container_count: 50.0,
            total_height: 30.0,
            clash: 10_000.0,
            zero_placement: -1000.0,
        }
    }
}

/// The individual terms of a fitness value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitnessBreakdown {
    /// Placed over total rectangles.
    pub placement_rate: f64,
    /// Mean utilization of non-empty tiers.
    pub avg_utilization: f64,
    /// Weighted compactness reward.
    pub compactness_bonus: f64,
    /// `num_containers / max_containers`.
    pub container_penalty: f64,
    /// `total_height / max_total_height`.
    pub height_penalty: f64,
    /// Number of tiers with a clash.
    pub clashing_tiers: usize,
    /// Resulting fitness.
    pub fitness: f64,
}

/// Scores a packed layout.
///
/// `containers` are the realized tiers, `num_containers` the tier count
/// encoded by the chromosome.
pub fn evaluate_layout(
    containers: &[Container],
    placed: usize,
    num_containers: usize,
    max_containers: usize,
    max_total_height: f64,
    rects: &[Rectangle],
    weights: &FitnessWeights,
) -> FitnessBreakdown {
    let total = rects.len();
    let placement_rate = if total > 0 {
        placed as f64 / total as f64
    } else {
        0.0
    };

    if placed == 0 {
        return FitnessBreakdown {
            placement_rate,
            fitness: weights.zero_placement,
            ..Default::default()
        };
    }

    let (util_sum, occupied) = containers
        .iter()
        .filter(|c| !c.is_empty())
        .fold((0.0, 0usize), |(sum, n), c| (sum + c.utilization(rects), n + 1));
    let avg_utilization = if occupied > 0 {
        util_sum / occupied as f64
    } else {
        0.0
    };

    let container_penalty = num_containers as f64 / max_containers.max(1) as f64;
    let total_height: f64 = containers.iter().map(|c| c.height).sum();
    let height_penalty = if max_total_height > 0.0 {
        total_height / max_total_height
    } else {
        1.0
    };

    let full_bonus = if placed == total {
        weights.full_placement_bonus
    } else {
        0.0
    };

    let mut clashing_tiers = 0;
    for container in containers {
        if container.has_clash(rects) {
            log::error!(
                "Clash detected in tier {} (height {:.4}, minimum {:.4})",
                container.index,
                container.height,
                container.minimum_height(rects)
            );
            clashing_tiers += 1;
        }
    }

    let compactness_bonus: f64 = containers
        .iter()
        .filter(|c| c.has_both_sides() && c.height > 0.0)
        .map(|c| c.minimum_height(rects) / c.height * weights.compactness)
        .sum();

    let fitness = placement_rate * weights.placement
        + full_bonus
        + avg_utilization * weights.utilization
        + compactness_bonus
        - container_penalty * weights.container_count
        - height_penalty * weights.total_height
        - clashing_tiers as f64 * weights.clash;

    FitnessBreakdown {
        placement_rate,
        avg_utilization,
        compactness_bonus,
        container_penalty,
        height_penalty,
        clashing_tiers,
        fitness,
    }
}
