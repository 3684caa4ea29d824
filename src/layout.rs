//! Layout model: the ordered strip of items and their lazily learned sizes
//!
//! Item heights are only known after an item has been decoded once. Until
//! then an item occupies `fallback_height` source pixels so that layout stays
//! deterministic. All vertical positions are in display (scaled) pixels:
//! every item contributes `floor(height / scale)`.

use std::num::NonZeroU32;

use log::debug;

use crate::viewport::{Extents, Viewport};

/// Default layout height for items that have not been decoded yet.
pub const DEFAULT_FALLBACK_HEIGHT: u32 = 200;

/// What is known about an item's height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeightState {
    #[default]
    Unknown,
    /// Reserved after a failed decode.
    Placeholder(u32),
    /// Height declared by the decoder.
    Decoded(NonZeroU32),
}

#[derive(Clone, Debug)]
pub struct Item {
    locator: String,
    height: HeightState,
}

impl Item {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            height: HeightState::Unknown,
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn height_state(&self) -> HeightState {
        self.height
    }

    /// Height in source pixels, `None` while unknown.
    pub fn resolved_height(&self) -> Option<u32> {
        match self.height {
            HeightState::Unknown => None,
            HeightState::Placeholder(height) => Some(height),
            HeightState::Decoded(height) => Some(height.get()),
        }
    }
}

/// An item intersecting the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub index: usize,
    /// Distance from the top of the viewport to the top of the item.
    pub top: i64,
}

/// Incremental walk over the items touching the viewport.
///
/// Each item's span is read when the walk moves past it, so a height learned
/// while an item is being drawn already moves every item after it.
#[derive(Clone, Debug, Default)]
pub struct VisibleWalk {
    next: usize,
    start: i64,
    current: Option<usize>,
}

impl VisibleWalk {
    pub fn next(&mut self, document: &Document, viewport: &Viewport) -> Option<Placement> {
        let scale = viewport.scale_factor();
        let offset = i64::from(viewport.offset_y);
        let height = i64::from(viewport.height);

        if let Some(index) = self.current.take() {
            self.start += i64::from(document.scaled_height(index, scale));
        }
        while self.next < document.len() {
            // Starts only grow, so nothing further down can be visible.
            if self.start - height >= offset {
                self.next = document.len();
                break;
            }
            let index = self.next;
            self.next += 1;
            let span = i64::from(document.scaled_height(index, scale));
            if intersects(self.start, span, offset, height) {
                self.current = Some(index);
                return Some(Placement {
                    index,
                    top: self.start - offset,
                });
            }
            self.start += span;
        }
        None
    }
}

/// Whether an item spanning `[start, start + span]` touches the visible
/// window `[offset, offset + height)`.
fn intersects(start: i64, span: i64, offset: i64, height: i64) -> bool {
    start + span >= offset && start - height < offset
}

#[derive(Clone, Debug)]
pub struct Document {
    items: Vec<Item>,
    max_width_seen: u32,
    fallback_height: u32,
}

impl Document {
    pub fn new<I, S>(locators: I, fallback_height: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: locators.into_iter().map(Item::new).collect(),
            max_width_seen: 0,
            fallback_height,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn locator(&self, index: usize) -> &str {
        self.items[index].locator()
    }

    /// Widest source image decoded so far. Never shrinks.
    pub fn max_width_seen(&self) -> u32 {
        self.max_width_seen
    }

    /// Layout height of an item in source pixels.
    pub fn height(&self, index: usize) -> u32 {
        self.items[index]
            .resolved_height()
            .unwrap_or(self.fallback_height)
    }

    pub fn scaled_height(&self, index: usize, scale: f32) -> u32 {
        scale_down(self.height(index), scale)
    }

    /// Display offset of the top of item `index` from the top of the strip.
    pub fn cumulative_offset(&self, index: usize, scale: f32) -> u64 {
        (0..index.min(self.items.len()))
            .map(|i| u64::from(self.scaled_height(i, scale)))
            .sum()
    }

    pub fn total_height(&self, scale: f32) -> u64 {
        self.cumulative_offset(self.items.len(), scale)
    }

    pub fn extents(&self, scale: f32) -> Extents {
        Extents {
            total_height: self.total_height(scale),
            max_width_seen: self.max_width_seen,
        }
    }

    /// Items touching the viewport, in document order, with the heights
    /// known right now. The compositor drives the same [`VisibleWalk`] while
    /// it learns heights.
    pub fn visible_items(&self, viewport: &Viewport) -> Vec<Placement> {
        let mut walk = VisibleWalk::default();
        let mut visible = Vec::new();
        while let Some(placement) = walk.next(self, viewport) {
            visible.push(placement);
        }
        visible
    }

    /// Indices of items whose height has never been learned.
    pub fn unresolved(&self) -> Vec<usize> {
        (0..self.items.len())
            .filter(|&i| self.items[i].height == HeightState::Unknown)
            .collect()
    }

    /// Record the dimensions declared by a decoder for item `index`.
    ///
    /// A zero height is not a usable layout height and leaves the item as it
    /// was; the width is folded into `max_width_seen` regardless.
    pub fn record_resolved(&mut self, index: usize, height: u32, width: u32) {
        if let Some(height) = NonZeroU32::new(height) {
            self.items[index].height = HeightState::Decoded(height);
        } else {
            debug!("{} declared zero height", self.items[index].locator);
        }
        self.max_width_seen = self.max_width_seen.max(width);
    }

    /// Give an undecodable item a placeholder height if it has none yet.
    pub fn reserve_placeholder(&mut self, index: usize) {
        let item = &mut self.items[index];
        if item.height == HeightState::Unknown {
            item.height = HeightState::Placeholder(self.fallback_height);
        }
    }
}

pub(crate) fn scale_down(value: u32, scale: f32) -> u32 {
    (value as f32 / scale) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(heights: &[u32]) -> Document {
        let mut document = Document::new(
            (0..heights.len()).map(|i| format!("item-{i}")),
            DEFAULT_FALLBACK_HEIGHT,
        );
        for (i, &h) in heights.iter().enumerate() {
            document.record_resolved(i, h, 100);
        }
        document
    }

    #[test]
    fn unknown_items_use_fallback_height() {
        let document = Document::new(["a", "b"], 250);
        assert_eq!(document.height(0), 250);
        assert_eq!(document.total_height(1.0), 500);
        assert_eq!(document.item(0).unwrap().resolved_height(), None);
    }

    #[test]
    fn cumulative_offsets_sum_scaled_heights() {
        let document = resolved(&[300, 101, 50]);
        assert_eq!(document.cumulative_offset(0, 1.0), 0);
        assert_eq!(document.cumulative_offset(2, 1.0), 401);
        assert_eq!(document.total_height(1.0), 451);
        // 150 + 50 + 25, each item floored on its own
        assert_eq!(document.total_height(2.0), 225);
    }

    #[test]
    fn max_width_never_shrinks() {
        let mut document = Document::new(["a", "b"], 200);
        document.record_resolved(0, 10, 640);
        document.record_resolved(1, 10, 320);
        document.record_resolved(0, 10, 100);
        assert_eq!(document.max_width_seen(), 640);
    }

    #[test]
    fn zero_height_keeps_item_unknown() {
        let mut document = Document::new(["a"], 200);
        document.record_resolved(0, 0, 90);
        assert_eq!(document.item(0).unwrap().height_state(), HeightState::Unknown);
        assert_eq!(document.max_width_seen(), 90);
    }

    #[test]
    fn placeholder_only_replaces_unknown() {
        let mut document = Document::new(["a", "b"], 200);
        document.record_resolved(1, 40, 10);
        document.reserve_placeholder(0);
        document.reserve_placeholder(1);
        assert_eq!(document.item(0).unwrap().height_state(), HeightState::Placeholder(200));
        assert_eq!(document.height(1), 40);

        // a later successful decode replaces the placeholder
        document.record_resolved(0, 80, 10);
        assert_eq!(document.height(0), 80);
    }

    #[test]
    fn visible_items_track_the_viewport() {
        let document = resolved(&[100, 100, 100, 100]);
        let mut viewport = Viewport::new(50, 150);
        viewport.offset_y = 120;

        let visible = document.visible_items(&viewport);
        assert_eq!(
            visible,
            vec![
                Placement { index: 1, top: -20 },
                Placement { index: 2, top: 80 },
            ]
        );
    }

    #[test]
    fn walk_picks_up_heights_learned_mid_walk() {
        let mut document = Document::new(["a", "b", "c"], 100);
        let viewport = Viewport::new(50, 120);
        let mut walk = VisibleWalk::default();

        assert_eq!(walk.next(&document, &viewport), Some(Placement { index: 0, top: 0 }));
        document.record_resolved(0, 30, 50);
        assert_eq!(walk.next(&document, &viewport), Some(Placement { index: 1, top: 30 }));
        document.record_resolved(1, 30, 50);
        assert_eq!(walk.next(&document, &viewport), Some(Placement { index: 2, top: 60 }));
        assert_eq!(walk.next(&document, &viewport), None);
        assert_eq!(walk.next(&document, &viewport), None);
    }

    #[test]
    fn unresolved_lists_unknown_items_only() {
        let mut document = Document::new(["a", "b", "c"], 100);
        document.record_resolved(0, 30, 50);
        document.reserve_placeholder(2);
        assert_eq!(document.unresolved(), vec![1]);
    }

    #[test]
    fn visible_items_include_item_ending_at_offset() {
        let document = resolved(&[100, 100]);
        let mut viewport = Viewport::new(50, 50);
        viewport.offset_y = 100;
        let indices: Vec<usize> = document
            .visible_items(&viewport)
            .iter()
            .map(|p| p.index)
            .collect();
        assert_eq!(indices, vec![0, 1]);
    }
}
