//! Rack tiers with bottom- and top-mounted items.
//!
//! A [`Container`] is one tier of the rack: a fixed width, a height derived
//! by the packer, and two ordered item lists. Bottom items hang from the
//! tier's lower edge upwards, top items from its upper edge downwards, so a
//! bottom item and a top item only collide when their horizontal spans
//! overlap *and* their heights add up to more than the tier height.

use crate::rectangle::{spans_overlap, Rectangle};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance for height comparisons in clash detection.
pub const HEIGHT_EPSILON: f64 = 1e-9;

/// Mounting edge of a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mount {
    /// Attached to the lower edge.
    Bottom,
    /// Attached to the upper edge.
    Top,
}

impl Mount {
    /// Returns the other edge.
    pub fn opposite(self) -> Self {
        match self {
            Mount::Bottom => Mount::Top,
            Mount::Top => Mount::Bottom,
        }
    }
}

/// A rectangle mounted at a horizontal offset.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MountedItem {
    /// Rectangle id.
    pub rect_id: usize,
    /// Left edge, measured from the tier's left edge.
    pub x: f64,
}

/// One rack tier.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Container {
    /// Position of the tier in the stack (0 = first).
    pub index: usize,
    /// Fixed tier width.
    pub width: f64,
    /// Tier height.
    pub height: f64,
    /// Items mounted on the lower edge, in placement order.
    pub bottom_items: Vec<MountedItem>,
    /// Items mounted on the upper edge, in placement order.
    pub top_items: Vec<MountedItem>,
}

impl Container {
    /// Creates an empty tier.
    pub fn new(index: usize, width: f64, height: f64) -> Self {
        Self {
            index,
            width,
            height,
            bottom_items: Vec::new(),
            top_items: Vec::new(),
        }
    }

    /// Returns the items on one edge.
    pub fn items(&self, mount: Mount) -> &[MountedItem] {
        match mount {
            Mount::Bottom => &self.bottom_items,
            Mount::Top => &self.top_items,
        }
    }

    pub(crate) fn mount(&mut self, mount: Mount, rect_id: usize, x: f64) {
        let item = MountedItem { rect_id, x };
        match mount {
            Mount::Bottom => self.bottom_items.push(item),
            Mount::Top => self.top_items.push(item),
        }
    }

    /// Returns true if nothing is mounted.
    pub fn is_empty(&self) -> bool {
        self.bottom_items.is_empty() && self.top_items.is_empty()
    }

    /// Returns true if both edges carry items.
    pub fn has_both_sides(&self) -> bool {
        !self.bottom_items.is_empty() && !self.top_items.is_empty()
    }

    /// Total number of mounted items.
    pub fn item_count(&self) -> usize {
        self.bottom_items.len() + self.top_items.len()
    }

    /// Iterates over all mounted items with their edge.
    pub fn mounted(&self) -> impl Iterator<Item = (Mount, &MountedItem)> {
        self.bottom_items
            .iter()
            .map(|item| (Mount::Bottom, item))
            .chain(self.top_items.iter().map(|item| (Mount::Top, item)))
    }

    /// Height of the tallest item on one edge (0 if the edge is empty).
    pub fn side_height(&self, mount: Mount, rects: &[Rectangle]) -> f64 {
        self.items(mount)
            .iter()
            .map(|item| rects[item.rect_id].height)
            .fold(0.0, f64::max)
    }

    /// Total area of mounted rectangles.
    pub fn used_area(&self, rects: &[Rectangle]) -> f64 {
        self.mounted()
            .map(|(_, item)| rects[item.rect_id].area())
            .sum()
    }

    /// Used area over tier area. May exceed 1.0 for tightly compressed tiers.
    pub fn utilization(&self, rects: &[Rectangle]) -> f64 {
        let area = self.width * self.height;
        if area <= 0.0 {
            return 0.0;
        }
        self.used_area(rects) / area
    }

    /// Returns true if a rectangle of `width` at `x` would overlap an item on `mount`.
    pub fn overlaps_side(&self, mount: Mount, x: f64, width: f64, rects: &[Rectangle]) -> bool {
        self.items(mount)
            .iter()
            .any(|item| spans_overlap(x, width, item.x, rects[item.rect_id].width))
    }

    /// Smallest height at which no bottom/top pair clashes.
    ///
    /// One-sided tiers need their tallest item. Two-sided tiers need the
    /// largest `bottom + top` over horizontally overlapping pairs, or just
    /// the taller side when no pair overlaps. The result never drops below
    /// the tallest single item. Empty tiers need 0.
    pub fn minimum_height(&self, rects: &[Rectangle]) -> f64 {
        let bottom = self.side_height(Mount::Bottom, rects);
        let top = self.side_height(Mount::Top, rects);

        if !self.has_both_sides() {
            return bottom.max(top);
        }

        let mut required = 0.0_f64;
        for b in &self.bottom_items {
            let b_rect = &rects[b.rect_id];
            for t in &self.top_items {
                let t_rect = &rects[t.rect_id];
                if spans_overlap(b.x, b_rect.width, t.x, t_rect.width) {
                    required = required.max(b_rect.height + t_rect.height);
                }
            }
        }

        if required == 0.0 {
            required = bottom.max(top);
        }

        required.max(bottom).max(top)
    }

    /// Returns true if any bottom item physically intersects any top item
    /// at the current height.
    pub fn has_clash(&self, rects: &[Rectangle]) -> bool {
        if !self.has_both_sides() {
            return false;
        }

        self.bottom_items.iter().any(|b| {
            let b_rect = &rects[b.rect_id];
            self.top_items.iter().any(|t| {
                let t_rect = &rects[t.rect_id];
                spans_overlap(b.x, b_rect.width, t.x, t_rect.width)
                    && b_rect.height + t_rect.height > self.height + HEIGHT_EPSILON
            })
        })
    }

    /// Returns true if two items on the same edge overlap horizontally, or an
    /// item sticks out of the tier.
    pub fn has_side_overlap(&self, rects: &[Rectangle]) -> bool {
        [Mount::Bottom, Mount::Top].into_iter().any(|mount| {
            let items = self.items(mount);
            items.iter().enumerate().any(|(i, a)| {
                let a_width = rects[a.rect_id].width;
                a.x < 0.0
                    || a.x + a_width > self.width + HEIGHT_EPSILON
                    || items[i + 1..]
                        .iter()
                        .any(|b| spans_overlap(a.x, a_width, b.x, rects[b.rect_id].width))
            })
        })
    }

    /// Mean horizontal overlap ratio over all bottom/top pairs.
    ///
    /// Each pair contributes `overlap / narrower width`, so 1.0 means every
    /// top item sits exactly over or under a bottom item.
    pub fn alignment_score(&self, rects: &[Rectangle]) -> f64 {
        if !self.has_both_sides() {
            return 0.0;
        }

        let mut score = 0.0;
        let mut pairs = 0usize;
        for b in &self.bottom_items {
            let b_rect = &rects[b.rect_id];
            for t in &self.top_items {
                let t_rect = &rects[t.rect_id];
                let overlap = ((b.x + b_rect.width).min(t.x + t_rect.width) - b.x.max(t.x)).max(0.0);
                let narrower = b_rect.width.min(t_rect.width);
                if narrower > 0.0 {
                    score += overlap / narrower;
                }
                pairs += 1;
            }
        }

        score / pairs as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rects(dims: &[(f64, f64)]) -> Vec<Rectangle> {
        dims.iter()
            .enumerate()
            .map(|(i, &(w, h))| Rectangle::new(i, w, h))
            .collect()
    }

    #[test]
    fn test_one_sided_minimum_height() {
        let rs = rects(&[(2.0, 3.0), (2.0, 5.0)]);
        let mut c = Container::new(0, 10.0, 20.0);
        c.mount(Mount::Bottom, 0, 0.0);
        c.mount(Mount::Bottom, 1, 2.0);

        assert_eq!(c.minimum_height(&rs), 5.0);
        assert!(!c.has_clash(&rs));
    }

    #[test]
    fn test_overlapping_pair_needs_sum() {
        let rs = rects(&[(3.0, 2.0), (3.0, 4.0), (2.0, 1.0)]);
        let mut c = Container::new(0, 10.0, 20.0);
        c.mount(Mount::Bottom, 0, 0.0);
        c.mount(Mount::Top, 1, 1.0);
        c.mount(Mount::Top, 2, 6.0);

        assert_eq!(c.minimum_height(&rs), 6.0);

        c.height = 6.0;
        assert!(!c.has_clash(&rs));
        c.height = 5.5;
        assert!(c.has_clash(&rs));
    }

    #[test]
    fn test_disjoint_sides_compress_fully() {
        let rs = rects(&[(3.0, 2.0), (3.0, 4.0)]);
        let mut c = Container::new(0, 10.0, 20.0);
        c.mount(Mount::Bottom, 0, 0.0);
        c.mount(Mount::Top, 1, 3.0);

        assert_eq!(c.minimum_height(&rs), 4.0);
        c.height = 4.0;
        assert!(!c.has_clash(&rs));
    }

    #[test]
    fn test_empty_container() {
        let rs = rects(&[(1.0, 1.0)]);
        let c = Container::new(0, 10.0, 3.0);
        assert!(c.is_empty());
        assert_eq!(c.minimum_height(&rs), 0.0);
        assert_eq!(c.used_area(&rs), 0.0);
        assert_eq!(c.alignment_score(&rs), 0.0);
    }

    #[test]
    fn test_utilization() {
        let rs = rects(&[(5.0, 2.0)]);
        let mut c = Container::new(0, 10.0, 2.0);
        c.mount(Mount::Top, 0, 0.0);
        assert!((c.utilization(&rs) - 0.5).abs() < 1e-12);

        c.height = 0.0;
        assert_eq!(c.utilization(&rs), 0.0);
    }

    #[test]
    fn test_side_overlap_detection() {
        let rs = rects(&[(3.0, 1.0), (3.0, 1.0)]);
        let mut c = Container::new(0, 6.0, 2.0);
        c.mount(Mount::Bottom, 0, 0.0);
        c.mount(Mount::Bottom, 1, 3.0);
        assert!(!c.has_side_overlap(&rs));
        assert!(c.overlaps_side(Mount::Bottom, 2.0, 1.0, &rs));
        assert!(!c.overlaps_side(Mount::Top, 2.0, 1.0, &rs));

        c.bottom_items[1].x = 2.5;
        assert!(c.has_side_overlap(&rs));
    }

    #[test]
    fn test_alignment_score() {
        let rs = rects(&[(4.0, 1.0), (2.0, 1.0)]);
        let mut c = Container::new(0, 10.0, 2.0);
        c.mount(Mount::Bottom, 0, 0.0);
        c.mount(Mount::Top, 1, 2.0);
        assert!((c.alignment_score(&rs) - 1.0).abs() < 1e-12);

        c.top_items[0].x = 3.0;
        assert!((c.alignment_score(&rs) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_mount_opposite() {
        assert_eq!(Mount::Bottom.opposite(), Mount::Top);
        assert_eq!(Mount::Top.opposite(), Mount::Bottom);
    }
}
