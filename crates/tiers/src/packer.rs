//! Deterministic tier packing.
//!
//! Decodes a [`TierChromosome`] into realized tiers. Rectangles are taken in
//! chromosome order and mounted on the first tier and edge that admit them:
//!
//! 1. **Fit check**: the edge's tallest item, including the new one, must
//!    fit below the opposite edge's tallest item under the tier's hinted
//!    height.
//! 2. **Alignment**: the rectangle is first tried flush-left and then
//!    flush-right with each item on the opposite edge. Shared footprints
//!    let bottom and top items stack into the same vertical band.
//! 3. **Scanline**: otherwise it goes into the first gap along its own edge
//!    that is wide enough.
//!
//! Rectangles that fit nowhere stay unplaced. After placement every
//! occupied tier's hint is replaced by its [minimum clash-free
//! height](Container::minimum_height) plus a small seeded jitter, which only
//! ever raises the height. Empty tiers keep their hint.

use crate::chromosome::TierChromosome;
use crate::container::{Container, Mount};
use crate::rectangle::Rectangle;
use rand::prelude::*;
use std::cmp::Ordering;

/// Result of packing one chromosome.
#[derive(Debug, Clone, PartialEq)]
pub struct PackOutcome {
    /// Realized tiers, one per encoded tier.
    pub containers: Vec<Container>,
    /// Number of placed rectangles.
    pub placed: usize,
    /// Tier index per rectangle id, `None` if unplaced.
    pub assignments: Vec<Option<usize>>,
}

/// Packs rectangles into tiers of a fixed width.
#[derive(Debug, Clone)]
pub struct TierPacker {
    rects: Vec<Rectangle>,
    container_width: f64,
    max_total_height: f64,
    height_jitter: f64,
}

impl TierPacker {
    /// Creates a packer.
    ///
    /// `height_jitter` is the upper bound of the relative height added above
    /// each tier's minimum (0 for exact minimum heights).
    pub fn new(
        rects: Vec<Rectangle>,
        container_width: f64,
        max_total_height: f64,
        height_jitter: f64,
    ) -> Self {
        Self {
            rects,
            container_width,
            max_total_height,
            height_jitter: height_jitter.max(0.0),
        }
    }

    /// Returns the rectangle set.
    pub fn rectangles(&self) -> &[Rectangle] {
        &self.rects
    }

    /// Returns the tier width.
    pub fn container_width(&self) -> f64 {
        self.container_width
    }

    /// Packs the chromosome's rectangles into its tiers.
    ///
    /// The result depends only on the chromosome (including its jitter
    /// seed) and the packer's inputs.
    pub fn pack(&self, chromosome: &TierChromosome) -> PackOutcome {
        let num = chromosome.num_containers.max(1);
        let fallback_hint = self.max_total_height / num as f64;

        let mut containers: Vec<Container> = (0..num)
            .map(|i| {
                let hint = chromosome
                    .container_heights
                    .get(i)
                    .copied()
                    .filter(|h| *h > 0.0)
                    .unwrap_or(fallback_hint);
                Container::new(i, self.container_width, hint)
            })
            .collect();

        let mut assignments = vec![None; self.rects.len()];
        let mut placed = 0;

        for &rect_id in &chromosome.rectangle_order {
            let Some(rect) = self.rects.get(rect_id) else {
                continue;
            };

            for container in containers.iter_mut() {
                if rect.width > container.width {
                    continue;
                }

                if let Some((mount, x)) = self.find_slot(container, rect) {
                    container.mount(mount, rect.id, x);
                    assignments[rect.id] = Some(container.index);
                    placed += 1;
                    break;
                }
            }
        }

        let mut rng = StdRng::seed_from_u64(chromosome.jitter_seed);
        for container in containers.iter_mut().filter(|c| !c.is_empty()) {
            let min_height = container.minimum_height(&self.rects);
            let jitter = if self.height_jitter > 0.0 {
                rng.gen_range(0.0..self.height_jitter) * min_height
            } else {
                0.0
            };
            container.height = min_height + jitter;
        }

        PackOutcome {
            containers,
            placed,
            assignments,
        }
    }

    /// Finds the first edge and x-position that admit `rect`, bottom first.
    fn find_slot(&self, container: &Container, rect: &Rectangle) -> Option<(Mount, f64)> {
        [Mount::Bottom, Mount::Top].into_iter().find_map(|mount| {
            if self.can_mount(container, mount, rect) {
                self.find_position(container, mount, rect)
                    .map(|x| (mount, x))
            } else {
                None
            }
        })
    }

    /// Height fit check against the tier's current height.
    fn can_mount(&self, container: &Container, mount: Mount, rect: &Rectangle) -> bool {
        if rect.height > container.height {
            return false;
        }

        let own = container.side_height(mount, &self.rects).max(rect.height);
        let opposite = container.side_height(mount.opposite(), &self.rects);
        own <= container.height - opposite
    }

    /// Chooses an x-position on `mount`: aligned with an opposite item if
    /// possible, otherwise the first free gap.
    fn find_position(&self, container: &Container, mount: Mount, rect: &Rectangle) -> Option<f64> {
        let fits = |x: f64| {
            x >= 0.0
                && x + rect.width <= container.width
                && !container.overlaps_side(mount, x, rect.width, &self.rects)
        };

        for item in container.items(mount.opposite()) {
            let other_width = self.rects[item.rect_id].width;
            let flush_start = item.x;
            let flush_end = item.x + other_width - rect.width;

            if fits(flush_start) {
                return Some(flush_start);
            }
            if fits(flush_end) {
                return Some(flush_end);
            }
        }

        self.scanline_position(container, mount, rect)
    }

    /// First gap along `mount`, scanning occupied spans left to right.
    fn scanline_position(&self, container: &Container, mount: Mount, rect: &Rectangle) -> Option<f64> {
        let mut occupied: Vec<(f64, f64)> = container
            .items(mount)
            .iter()
            .map(|item| (item.x, item.x + self.rects[item.rect_id].width))
            .collect();
        occupied.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let mut cursor = 0.0_f64;
        for (start, end) in occupied {
            if cursor + rect.width <= start {
                return Some(cursor);
            }
            cursor = cursor.max(end);
        }

        if cursor + rect.width <= container.width {
            Some(cursor)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chromosome::EncodingLimits;
    use crate::rectangle::rectangles_from_dims;

    fn packer(dims: &[(f64, f64)], width: f64, max_height: f64, jitter: f64) -> TierPacker {
        TierPacker::new(rectangles_from_dims(dims).unwrap(), width, max_height, jitter)
    }

    fn chromosome(rect_count: usize, max_height: f64, heights: &[f64]) -> TierChromosome {
        let limits = EncodingLimits {
            rect_count,
            max_containers: heights.len().max(1),
            max_total_height: max_height,
        };
        let mut c = TierChromosome::new(&limits, heights.len());
        c.container_heights = heights.to_vec();
        c
    }

    #[test]
    fn test_single_rectangle() {
        let p = packer(&[(2.0, 2.0)], 5.0, 10.0, 0.02);
        let outcome = p.pack(&chromosome(1, 10.0, &[10.0]));

        assert_eq!(outcome.placed, 1);
        assert_eq!(outcome.assignments, vec![Some(0)]);
        let c = &outcome.containers[0];
        assert_eq!(c.bottom_items.len(), 1);
        assert!(c.height >= 2.0 && c.height <= 2.0 * 1.02);
    }

    #[test]
    fn test_second_item_goes_on_top_aligned() {
        let p = packer(&[(3.0, 2.0), (3.0, 2.0)], 3.0, 10.0, 0.0);
        let outcome = p.pack(&chromosome(2, 10.0, &[10.0]));

        assert_eq!(outcome.placed, 2);
        let c = &outcome.containers[0];
        assert_eq!(c.bottom_items, vec![crate::container::MountedItem { rect_id: 0, x: 0.0 }]);
        assert_eq!(c.top_items, vec![crate::container::MountedItem { rect_id: 1, x: 0.0 }]);
        assert_eq!(c.height, 4.0);
        assert!(!c.has_clash(p.rectangles()));
    }

    #[test]
    fn test_low_hint_pushes_to_next_tier() {
        let p = packer(&[(3.0, 2.0), (3.0, 2.0)], 3.0, 10.0, 0.0);
        let outcome = p.pack(&chromosome(2, 10.0, &[3.0, 3.0]));

        assert_eq!(outcome.placed, 2);
        assert_eq!(outcome.assignments, vec![Some(0), Some(1)]);
        assert_eq!(outcome.containers[0].height, 2.0);
        assert_eq!(outcome.containers[1].height, 2.0);
    }

    #[test]
    fn test_too_wide_is_unplaced() {
        let p = packer(&[(6.0, 1.0), (2.0, 1.0)], 5.0, 10.0, 0.0);
        let outcome = p.pack(&chromosome(2, 10.0, &[5.0, 5.0]));

        assert_eq!(outcome.placed, 1);
        assert_eq!(outcome.assignments, vec![None, Some(0)]);
    }

    #[test]
    fn test_too_tall_for_hint_is_unplaced() {
        let p = packer(&[(1.0, 8.0)], 5.0, 10.0, 0.0);
        let outcome = p.pack(&chromosome(1, 10.0, &[5.0, 5.0]));

        assert_eq!(outcome.placed, 0);
        // Empty tiers keep their hint.
        assert_eq!(outcome.containers[0].height, 5.0);
    }

    #[test]
    fn test_scanline_fills_gaps_left_to_right() {
        let p = packer(&[(2.0, 1.0), (3.0, 1.0), (2.0, 1.0)], 7.0, 10.0, 0.0);
        let outcome = p.pack(&chromosome(3, 10.0, &[10.0]));

        let c = &outcome.containers[0];
        let xs: Vec<f64> = c.bottom_items.iter().map(|i| i.x).collect();
        assert_eq!(xs, vec![0.0, 2.0, 5.0]);
        assert!(c.top_items.is_empty());
        assert_eq!(c.height, 1.0);
    }

    #[test]
    fn test_alignment_flush_end() {
        // Bottom fills the tier, so the third item moves to the top and
        // aligns with the first bottom item's start.
        let p = packer(&[(4.0, 1.0), (3.0, 1.0), (2.0, 1.0), (4.0, 1.0)], 7.0, 10.0, 0.0);
        let outcome = p.pack(&chromosome(4, 10.0, &[10.0]));
        let c = &outcome.containers[0];

        assert_eq!(c.top_items[0].x, 0.0);
        // Fourth item cannot start at 0 or 4 without overlapping, but can end
        // flush with the second bottom item (4 + 3 - 4 = 3).
        assert_eq!(c.top_items[1].x, 3.0);
        assert!(!c.has_side_overlap(p.rectangles()));
        assert!(!c.has_clash(p.rectangles()));
        assert_eq!(c.height, 2.0);
    }

    #[test]
    fn test_packing_is_deterministic() {
        let dims = [(4.0, 3.0), (3.0, 2.0), (2.0, 5.0), (3.0, 3.0), (4.0, 2.0), (2.0, 2.0)];
        let p = packer(&dims, 7.0, 20.0, 0.02);
        let limits = EncodingLimits {
            rect_count: dims.len(),
            max_containers: 3,
            max_total_height: 20.0,
        };
        let mut rng = StdRng::seed_from_u64(17);

        for _ in 0..20 {
            let c = TierChromosome::random(&limits, &mut rng);
            assert_eq!(p.pack(&c), p.pack(&c));
        }
    }

    #[test]
    fn test_jitter_only_raises_height() {
        let dims = [(4.0, 3.0), (3.0, 2.0), (2.0, 5.0), (3.0, 3.0)];
        let p = packer(&dims, 7.0, 20.0, 0.02);
        let limits = EncodingLimits {
            rect_count: dims.len(),
            max_containers: 2,
            max_total_height: 20.0,
        };
        let mut rng = StdRng::seed_from_u64(23);

        for _ in 0..50 {
            let outcome = p.pack(&TierChromosome::random(&limits, &mut rng));
            for c in outcome.containers.iter().filter(|c| !c.is_empty()) {
                let min = c.minimum_height(p.rectangles());
                assert!(c.height >= min);
                assert!(c.height <= min * 1.02 + 1e-12);
                assert!(!c.has_clash(p.rectangles()));
                assert!(!c.has_side_overlap(p.rectangles()));
            }
        }
    }
}
