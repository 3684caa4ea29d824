//! Viewport state and the input-driven transitions applied to it

use log::debug;

use crate::layout::scale_down;

/// Smallest allowed scale factor: images are never magnified past their
/// native resolution.
pub const MIN_SCALE: f32 = 1.0;

/// Content size established by a render pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Extents {
    /// Sum of all item heights in display pixels.
    pub total_height: u64,
    /// Widest source image seen so far.
    pub max_width_seen: u32,
}

/// Discrete viewer commands produced from input events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    PageDown,
    PageUp,
    Down,
    Up,
    Right,
    Left,
    Home,
    End,
    ZoomIn,
    ZoomOut,
    FitWidth,
    /// New display size, in whatever unit the display backend reports.
    Resize { width: u32, height: u32 },
    Redraw,
}

/// Step sizes for scrolling and zooming.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollSteps {
    /// Fraction of the viewport height moved by page up/down.
    pub page: f32,
    /// Fraction of the viewport dimension moved by an arrow key.
    pub arrow: f32,
    /// Scale multiplier for zoom in (`< 1`); zoom out divides by it.
    pub zoom: f32,
}

impl Default for ScrollSteps {
    fn default() -> Self {
        Self {
            page: 0.7,
            arrow: 0.1,
            zoom: 0.7,
        }
    }
}

/// Clamp a scale factor to the valid range, handling NaN/Inf.
pub fn clamp_scale(scale: f32) -> f32 {
    if !scale.is_finite() {
        MIN_SCALE
    } else {
        scale.max(MIN_SCALE)
    }
}

/// Visible region of the strip.
///
/// Offsets are display pixels from the top-left corner of the strip.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    pub offset_y: u32,
    pub offset_x: u32,
    pub width: u32,
    pub height: u32,
    scale_factor: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            offset_y: 0,
            offset_x: 0,
            width,
            height,
            scale_factor: MIN_SCALE,
        }
    }

    /// Source pixels per display pixel; always at least 1.
    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn set_scale_factor(&mut self, scale: f32) {
        self.scale_factor = clamp_scale(scale);
    }

    pub fn max_offset_y(&self, extents: Extents) -> u32 {
        let max = extents.total_height.saturating_sub(u64::from(self.height));
        u32::try_from(max).unwrap_or(u32::MAX)
    }

    pub fn max_offset_x(&self, extents: Extents) -> u32 {
        scale_down(extents.max_width_seen, self.scale_factor).saturating_sub(self.width)
    }

    /// Pull the offsets back inside the content. Returns true if either
    /// offset moved.
    pub fn clamp(&mut self, extents: Extents) -> bool {
        let mut changed = false;

        let max_y = self.max_offset_y(extents);
        if self.offset_y > max_y {
            debug!("clamping offset_y {} -> {max_y}", self.offset_y);
            self.offset_y = max_y;
            changed = true;
        }

        let max_x = self.max_offset_x(extents);
        if self.offset_x > max_x {
            debug!("clamping offset_x {} -> {max_x}", self.offset_x);
            self.offset_x = max_x;
            changed = true;
        }

        changed
    }

    fn step(extent: u32, fraction: f32) -> u32 {
        (extent as f32 * fraction) as u32
    }

    /// Apply a scroll or zoom command. Commands that need the display
    /// (resize, redraw, quit) leave the viewport untouched.
    pub fn apply(&mut self, action: Action, steps: &ScrollSteps, max_width_seen: u32) {
        match action {
            Action::PageDown => {
                self.offset_y = self
                    .offset_y
                    .saturating_add(Self::step(self.height, steps.page));
            }
            Action::PageUp => {
                self.offset_y = self
                    .offset_y
                    .saturating_sub(Self::step(self.height, steps.page));
            }
            Action::Down => {
                self.offset_y = self
                    .offset_y
                    .saturating_add(Self::step(self.height, steps.arrow));
            }
            Action::Up => {
                self.offset_y = self
                    .offset_y
                    .saturating_sub(Self::step(self.height, steps.arrow));
            }
            Action::Right => {
                self.offset_x = self
                    .offset_x
                    .saturating_add(Self::step(self.width, steps.arrow));
            }
            Action::Left => {
                self.offset_x = self
                    .offset_x
                    .saturating_sub(Self::step(self.width, steps.arrow));
            }
            Action::Home => self.offset_y = 0,
            // The controller resolves this against the real total height.
            Action::End => self.offset_y = u32::MAX,
            Action::ZoomIn => self.set_scale_factor(self.scale_factor * steps.zoom),
            Action::ZoomOut => {
                // Zooming out saturates instead of overflowing to infinity.
                let scale = self.scale_factor / steps.zoom;
                self.set_scale_factor(if scale.is_finite() { scale } else { f32::MAX });
            }
            Action::FitWidth => {
                self.set_scale_factor(max_width_seen as f32 / self.width as f32);
            }
            Action::Quit | Action::Resize { .. } | Action::Redraw => {}
        }
    }
}
