//! Frame-to-frame display list reconciliation.

use serde::Serialize;

use super::display_list::DisplayList;
use crate::layout::Rect;

/// The screen area that must be repainted after a change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DamageRegion {
    /// Damaged rectangles; may overlap.
    pub rects: Vec<Rect>,
}

impl DamageRegion {
    /// Add a rectangle; empty rectangles are ignored.
    pub fn add(&mut self, rect: Rect) {
        if !rect.is_empty() {
            self.rects.push(rect);
        }
    }

    /// Whether nothing needs repainting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Smallest rectangle covering all damage.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        self.rects
            .iter()
            .fold(Rect::default(), |acc, rect| acc.union(rect))
    }

    /// Whether any damaged rectangle overlaps `rect`.
    #[must_use]
    pub fn intersects(&self, rect: &Rect) -> bool {
        self.rects.iter().any(|damaged| damaged.intersects(rect))
    }
}

/// Compare two display lists position by position.
///
/// Items at the same index with identical bounds and content are
/// unchanged. Everything else — changed pairs, plus the tail of whichever
/// list is longer (added or removed items) — contributes its bounds to the
/// damage region.
#[must_use]
pub fn diff(previous: &DisplayList, next: &DisplayList) -> DamageRegion {
    let mut damage = DamageRegion::default();
    let shared = previous.items.len().min(next.items.len());

    for (old, new) in previous.items.iter().zip(&next.items).take(shared) {
        if old != new {
            damage.add(old.bounds);
            damage.add(new.bounds);
        }
    }
    for removed in &previous.items[shared..] {
        damage.add(removed.bounds);
    }
    for added in &next.items[shared..] {
        damage.add(added.bounds);
    }
    damage
}
