//! Compositor: streams decoded items straight into the display surface
//!
//! A render pass recomposites the whole viewport. Items are walked in
//! document order with a running offset, so a height learned from an item's
//! header immediately moves every item below it within the same pass.

use log::{debug, error, warn};

use crate::decode::{Decoder, PixelSource, ReadBuffer};
use crate::error::DecodeError;
use crate::layout::{Document, Placement, VisibleWalk};
use crate::surface::{DisplaySurface, Rgb};
use crate::viewport::{Extents, Viewport};

/// Colors painted by the compositor itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgb,
    /// Fill for items that failed to decode.
    pub error: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb::BLACK,
            error: Rgb::RED,
        }
    }
}

/// How an item's pixel stream ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlitOutcome {
    Complete,
    /// The stream ended before the declared pixel count; what arrived stays
    /// on screen.
    Truncated { delivered: u64, expected: u64 },
}

pub struct Compositor {
    read_buf: ReadBuffer,
    palette: Palette,
}

impl Compositor {
    pub fn new(palette: Palette) -> Self {
        Self::with_read_buffer(palette, ReadBuffer::new())
    }

    pub fn with_read_buffer(palette: Palette, read_buf: ReadBuffer) -> Self {
        Self { read_buf, palette }
    }

    /// Recomposite the viewport and report the content size seen.
    pub fn render(
        &mut self,
        document: &mut Document,
        decoder: &mut dyn Decoder,
        viewport: &Viewport,
        surface: &mut DisplaySurface,
    ) -> Extents {
        surface.clear(self.palette.background);

        let mut walk = VisibleWalk::default();
        while let Some(Placement { index, top }) = walk.next(document, viewport) {
            if let Err(err) = self.render_item(document, decoder, index, top, viewport, surface) {
                error!("{}: {err}", document.locator(index));
                self.paint_failure(document, index, top, viewport, surface);
            }
        }

        document.extents(viewport.scale_factor())
    }

    /// Learn the heights of `indices` from their headers without drawing.
    /// Items that fail to open get their placeholder.
    pub fn measure(
        &mut self,
        document: &mut Document,
        decoder: &mut dyn Decoder,
        indices: &[usize],
    ) {
        for &index in indices {
            let header = decoder
                .open(document.locator(index))
                .and_then(|mut source| {
                    let header = source.read_header();
                    source.finish();
                    header
                });
            match header {
                Ok(header) => document.record_resolved(index, header.height, header.width),
                Err(err) => {
                    warn!("{}: {err}", document.locator(index));
                    document.reserve_placeholder(index);
                }
            }
        }
    }

    fn render_item(
        &mut self,
        document: &mut Document,
        decoder: &mut dyn Decoder,
        index: usize,
        top: i64,
        viewport: &Viewport,
        surface: &mut DisplaySurface,
    ) -> Result<(), DecodeError> {
        let mut source = decoder.open(document.locator(index))?;
        let result = self.blit(source.as_mut(), document, index, top, viewport, surface);
        source.finish();

        match result? {
            BlitOutcome::Complete => debug!("rendered {}", document.locator(index)),
            BlitOutcome::Truncated {
                delivered,
                expected,
            } => warn!(
                "image {} seems corrupted: {delivered} of {expected} pixels",
                document.locator(index)
            ),
        }
        Ok(())
    }

    fn blit(
        &mut self,
        source: &mut dyn PixelSource,
        document: &mut Document,
        index: usize,
        top: i64,
        viewport: &Viewport,
        surface: &mut DisplaySurface,
    ) -> Result<BlitOutcome, DecodeError> {
        let header = source.read_header()?;
        document.record_resolved(index, header.height, header.width);

        let scale = viewport.scale_factor();
        let offset_x = i64::from(viewport.offset_x);
        let view_width = i64::from(viewport.width);
        let view_height = i64::from(viewport.height);

        let expected = header.pixel_count();
        let (mut x, mut y) = (0u32, 0u32);
        let mut delivered = 0u64;
        while let Some(pixels) = source.read_chunk(&mut self.read_buf)? {
            for color in pixels {
                // Extra data past the declared size is ignored.
                if delivered < expected {
                    let display_x = (x as f32 / scale) as i64 - offset_x;
                    let display_y = (y as f32 / scale) as i64 + top;
                    if (0..view_width).contains(&display_x) && (0..view_height).contains(&display_y)
                    {
                        surface.put_pixel(display_x, display_y, color);
                    }
                    delivered += 1;
                }

                x += 1;
                if x >= header.width {
                    x = 0;
                    y = y.saturating_add(1);
                }
            }
        }

        if delivered < expected {
            Ok(BlitOutcome::Truncated {
                delivered,
                expected,
            })
        } else {
            Ok(BlitOutcome::Complete)
        }
    }

    fn paint_failure(
        &self,
        document: &mut Document,
        index: usize,
        top: i64,
        viewport: &Viewport,
        surface: &mut DisplaySurface,
    ) {
        document.reserve_placeholder(index);
        let span = i64::from(document.scaled_height(index, viewport.scale_factor()));
        surface.fill_rect(
            0,
            top,
            i64::from(viewport.width),
            top + span,
            self.palette.error,
        );
    }
}
