//! Optimization results, tier reports and progress records.

use crate::chromosome::TierChromosome;
use crate::container::{Container, Mount};
use crate::fitness::FitnessBreakdown;
use crate::rectangle::Rectangle;
use u_rack_core::{Error, GaProgress, Individual, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-tier analysis of a realized layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContainerReport {
    /// Tier index.
    pub index: usize,
    /// Realized height.
    pub height: f64,
    /// Minimum clash-free height.
    pub minimum_height: f64,
    /// Height above the minimum, in percent of the minimum.
    pub jitter_overhead_pct: f64,
    /// Used area over tier area.
    pub utilization: f64,
    /// Bottom-mounted items.
    pub bottom_count: usize,
    /// Top-mounted items.
    pub top_count: usize,
    /// Mean bottom/top overlap ratio (see [`Container::alignment_score`]).
    pub alignment_score: f64,
    /// Whether a bottom/top pair intersects.
    pub has_clash: bool,
}

impl ContainerReport {
    /// Analyzes one tier.
    pub fn from_container(container: &Container, rects: &[Rectangle]) -> Self {
        let minimum_height = container.minimum_height(rects);
        let jitter_overhead_pct = if minimum_height > 0.0 {
            (container.height - minimum_height) / minimum_height * 100.0
        } else {
            0.0
        };

        Self {
            index: container.index,
            height: container.height,
            minimum_height,
            jitter_overhead_pct,
            utilization: container.utilization(rects),
            bottom_count: container.bottom_items.len(),
            top_count: container.top_items.len(),
            alignment_score: container.alignment_score(rects),
            has_clash: container.has_clash(rects),
        }
    }

    /// Returns true if the tier holds no items.
    pub fn is_empty(&self) -> bool {
        self.bottom_count == 0 && self.top_count == 0
    }
}

/// A placed rectangle in rack coordinates.
///
/// Tiers are stacked upwards in index order starting at `y = 0`. `y` is the
/// lower edge of the rectangle: a bottom-mounted item sits on its tier's
/// lower edge, a top-mounted item hangs so its upper edge meets the tier's
/// upper edge.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacedItem {
    /// Rectangle id.
    pub rect_id: usize,
    /// Tier index.
    pub container: usize,
    /// Mounting edge.
    pub mount: Mount,
    /// Left edge.
    pub x: f64,
    /// Lower edge.
    pub y: f64,
    /// Rectangle width.
    pub width: f64,
    /// Rectangle height.
    pub height: f64,
}

/// Progress record emitted after each generation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StackProgress {
    /// Generation that just completed.
    pub generation: u32,
    /// Generations configured.
    pub max_generations: u32,
    /// Best fitness so far.
    pub best_fitness: f64,
    /// Average fitness of the generation.
    pub avg_fitness: f64,
    /// Rectangles placed by the best layout.
    pub rectangles_placed: usize,
    /// Number of rectangles.
    pub total_rectangles: usize,
    /// Tiers of the best layout.
    pub num_containers: usize,
    /// Stack height of the best layout.
    pub total_height_used: f64,
    /// Generations since the last improvement.
    pub stagnation: u32,
}

impl StackProgress {
    pub(crate) fn from_ga(progress: &GaProgress, best: &TierChromosome, total_rectangles: usize) -> Self {
        Self {
            generation: progress.generation,
            max_generations: progress.max_generations,
            best_fitness: progress.best_fitness,
            avg_fitness: progress.avg_fitness,
            rectangles_placed: best.rectangles_placed(),
            total_rectangles,
            num_containers: best.num_containers,
            total_height_used: best.total_height_used(),
            stagnation: progress.stagnation,
        }
    }
}

/// Result of a stacked tier optimization.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StackResult {
    /// Best chromosome found, with its realized layout.
    pub best: TierChromosome,
    /// Input rectangles.
    pub rectangles: Vec<Rectangle>,
    /// Fitness terms of the best layout.
    pub breakdown: FitnessBreakdown,
    /// Best fitness per completed generation.
    pub fitness_history: Vec<f64>,
    /// Generations completed.
    pub generations: u32,
    /// Computation time in milliseconds.
    pub computation_time_ms: u64,
    /// Whether the run was cancelled.
    pub cancelled: bool,
}

impl StackResult {
    /// Fitness of the best layout.
    pub fn fitness(&self) -> f64 {
        self.best.fitness()
    }

    /// Encoded tier count of the best layout.
    pub fn num_containers(&self) -> usize {
        self.best.num_containers
    }

    /// Realized tiers.
    pub fn containers(&self) -> &[Container] {
        self.best.containers()
    }

    /// Realized tier heights.
    pub fn container_heights(&self) -> Vec<f64> {
        self.containers().iter().map(|c| c.height).collect()
    }

    /// Sum of realized tier heights.
    pub fn total_height_used(&self) -> f64 {
        self.best.total_height_used()
    }

    /// Number of placed rectangles.
    pub fn rectangles_placed(&self) -> usize {
        self.best.rectangles_placed()
    }

    /// Returns true if every rectangle was placed.
    pub fn all_placed(&self) -> bool {
        self.rectangles_placed() == self.rectangles.len()
    }

    /// Ids of rectangles left unplaced.
    pub fn unplaced(&self) -> Vec<usize> {
        self.best
            .assignments()
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Analysis of every realized tier.
    pub fn reports(&self) -> Vec<ContainerReport> {
        self.containers()
            .iter()
            .map(|c| ContainerReport::from_container(c, &self.rectangles))
            .collect()
    }

    /// Checks the layout invariants of the best solution.
    ///
    /// Fails with [`Error::Internal`] if items on one edge overlap or stick
    /// out, if a bottom/top pair clashes, or if the assignments disagree
    /// with the tiers.
    pub fn verify(&self) -> Result<()> {
        let assignments = self.best.assignments();
        let mut seen = 0;

        for container in self.containers() {
            if container.has_side_overlap(&self.rectangles) {
                return Err(Error::Internal(format!(
                    "overlapping items in tier {}",
                    container.index
                )));
            }
            if container.has_clash(&self.rectangles) {
                return Err(Error::Internal(format!(
                    "clash in tier {} at height {}",
                    container.index, container.height
                )));
            }
            for (_, item) in container.mounted() {
                if assignments.get(item.rect_id).copied().flatten() != Some(container.index) {
                    return Err(Error::Internal(format!(
                        "rectangle {} is mounted in tier {} but not assigned to it",
                        item.rect_id, container.index
                    )));
                }
                seen += 1;
            }
        }

        if seen != self.rectangles_placed() {
            return Err(Error::Internal(format!(
                "{} mounted items but {} counted as placed",
                seen,
                self.rectangles_placed()
            )));
        }
        Ok(())
    }

    /// Every placement in rack coordinates, tier by tier.
    pub fn placed_items(&self) -> Vec<PlacedItem> {
        let mut items = Vec::with_capacity(self.rectangles_placed());
        let mut offset = 0.0;

        for container in self.containers() {
            for (mount, item) in container.mounted() {
                let rect = &self.rectangles[item.rect_id];
                let y = match mount {
                    Mount::Bottom => offset,
                    Mount::Top => offset + container.height - rect.height,
                };
                items.push(PlacedItem {
                    rect_id: item.rect_id,
                    container: container.index,
                    mount,
                    x: item.x,
                    y,
                    width: rect.width,
                    height: rect.height,
                });
            }
            offset += container.height;
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_of_tight_tier() {
        let rects = vec![Rectangle::new(0, 3.0, 2.0), Rectangle::new(1, 3.0, 1.0)];
        let mut c = Container::new(0, 6.0, 3.3);
        c.mount(Mount::Bottom, 0, 0.0);
        c.mount(Mount::Top, 1, 0.0);

        let report = ContainerReport::from_container(&c, &rects);
        assert_eq!(report.minimum_height, 3.0);
        assert!((report.jitter_overhead_pct - 10.0).abs() < 1e-9);
        assert_eq!(report.bottom_count, 1);
        assert_eq!(report.top_count, 1);
        assert!((report.alignment_score - 1.0).abs() < 1e-12);
        assert!(!report.has_clash);
        assert!(!report.is_empty());
    }

    #[test]
    fn test_report_of_empty_tier() {
        let rects = vec![Rectangle::new(0, 1.0, 1.0)];
        let c = Container::new(2, 6.0, 4.0);

        let report = ContainerReport::from_container(&c, &rects);
        assert!(report.is_empty());
        assert_eq!(report.minimum_height, 0.0);
        assert_eq!(report.jitter_overhead_pct, 0.0);
    }

    #[test]
    fn test_placed_items_stack_tiers() {
        use crate::chromosome::EncodingLimits;
        use crate::packer::PackOutcome;

        let rects = vec![
            Rectangle::new(0, 3.0, 2.0),
            Rectangle::new(1, 3.0, 1.0),
            Rectangle::new(2, 2.0, 4.0),
        ];
        let mut first = Container::new(0, 6.0, 3.0);
        first.mount(Mount::Bottom, 0, 0.0);
        first.mount(Mount::Top, 1, 0.0);
        let mut second = Container::new(1, 6.0, 4.0);
        second.mount(Mount::Bottom, 2, 1.0);

        let limits = EncodingLimits {
            rect_count: 3,
            max_containers: 2,
            max_total_height: 10.0,
        };
        let mut best = TierChromosome::new(&limits, 2);
        best.set_evaluation(
            PackOutcome {
                containers: vec![first, second],
                placed: 3,
                assignments: vec![Some(0), Some(0), Some(1)],
            },
            100.0,
        );

        let result = StackResult {
            best,
            rectangles: rects,
            breakdown: FitnessBreakdown::default(),
            fitness_history: vec![100.0],
            generations: 1,
            computation_time_ms: 0,
            cancelled: false,
        };

        assert!(result.all_placed());
        assert!(result.unplaced().is_empty());
        assert!(result.verify().is_ok());
        assert!((result.total_height_used() - 7.0).abs() < 1e-12);

        let items = result.placed_items();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].mount, Mount::Bottom);
        assert_eq!(items[0].y, 0.0);
        assert_eq!(items[1].mount, Mount::Top);
        assert!((items[1].y - 2.0).abs() < 1e-12);
        assert_eq!(items[2].container, 1);
        assert!((items[2].y - 3.0).abs() < 1e-12);
        assert_eq!(items[2].x, 1.0);

        let mut broken = result.clone();
        let containers = broken.containers().to_vec();
        broken.best.set_evaluation(
            PackOutcome {
                containers,
                placed: 3,
                assignments: vec![Some(0), Some(1), Some(1)],
            },
            100.0,
        );
        assert!(matches!(broken.verify(), Err(Error::Internal(_))));
    }
}
