//! Scroll/zoom controller
//!
//! Owns the viewport and drives render passes. A pass may learn item
//! heights that move the content extent, so after clamping the offsets the
//! controller renders once more if the clamp moved anything.

use log::{debug, error};

use crate::compositor::Compositor;
use crate::decode::Decoder;
use crate::display::Display;
use crate::layout::Document;
use crate::viewport::{Action, ScrollSteps, Viewport};

/// Whether the event loop keeps going after an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Controller<D: Decoder> {
    document: Document,
    decoder: D,
    compositor: Compositor,
    viewport: Viewport,
    steps: ScrollSteps,
}

impl<D: Decoder> Controller<D> {
    pub fn new(
        document: Document,
        decoder: D,
        compositor: Compositor,
        viewport: Viewport,
        steps: ScrollSteps,
    ) -> Self {
        Self {
            document,
            decoder,
            compositor,
            viewport,
            steps,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Apply one action and redraw.
    pub fn handle(&mut self, action: Action, display: &mut dyn Display) -> Flow {
        debug!("action {action:?}");
        match action {
            Action::Quit => return Flow::Quit,
            Action::Resize { width, height } => match display.resize(width, height) {
                Ok(()) => {
                    let (width, height) = display.geometry();
                    self.viewport.width = width;
                    self.viewport.height = height;
                }
                Err(err) => error!("resize: {err}"),
            },
            Action::End => {
                // Every height between here and the end must be real before
                // the viewport can be placed on the last screenful.
                let unresolved = self.document.unresolved();
                self.compositor
                    .measure(&mut self.document, &mut self.decoder, &unresolved);
                self.viewport
                    .apply(Action::End, &self.steps, self.document.max_width_seen());
                self.viewport
                    .clamp(self.document.extents(self.viewport.scale_factor()));
            }
            action => {
                self.viewport
                    .apply(action, &self.steps, self.document.max_width_seen());
            }
        }
        self.refresh(display);
        Flow::Continue
    }

    /// Render the viewport, reclamp, and render a second time only if the
    /// clamp moved an offset. Returns the number of passes run.
    pub fn refresh(&mut self, display: &mut dyn Display) -> usize {
        let surface = match display.claim() {
            Ok(surface) => surface,
            Err(err) => {
                error!("{err}");
                return 0;
            }
        };

        let mut passes = 1;
        let extents =
            self.compositor
                .render(&mut self.document, &mut self.decoder, &self.viewport, surface);
        if self.viewport.clamp(extents) {
            passes += 1;
            let extents =
                self.compositor
                    .render(&mut self.document, &mut self.decoder, &self.viewport, surface);
            // Heights learned by the corrective pass are picked up by the
            // next refresh; the offsets stay in range meanwhile.
            self.viewport.clamp(extents);
        }

        if let Err(err) = display.update() {
            error!("{err}");
        }
        passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::Palette;
    use crate::surface::Rgb;
    use crate::test_utils::{MemoryDecoder, MemoryDisplay, solid_image};

    const GREEN: Rgb = Rgb::new(0, 0xC0, 0x20);

    fn controller(
        decoder: MemoryDecoder,
        items: &[&str],
        display: &MemoryDisplay,
    ) -> Controller<MemoryDecoder> {
        let (width, height) = display.geometry();
        Controller::new(
            Document::new(items.iter().copied(), 200),
            decoder,
            Compositor::new(Palette::default()),
            Viewport::new(width, height),
            ScrollSteps::default(),
        )
    }

    #[test]
    fn page_down_moves_by_seventy_percent() {
        let mut display = MemoryDisplay::new(200, 150);
        let decoder = MemoryDecoder::new().with_image("page", solid_image(100, 300, GREEN));
        let mut controller = controller(decoder, &["page"], &display);

        assert_eq!(controller.refresh(&mut display), 1);
        assert_eq!(controller.handle(Action::PageDown, &mut display), Flow::Continue);

        assert_eq!(controller.viewport().offset_y, 105);
        assert_eq!(display.updates(), 2);
        assert_eq!(display.surface().pixel(99, 149), Some(GREEN));
        assert_eq!(display.surface().pixel(100, 0), Some(Rgb::BLACK));
    }

    #[test]
    fn overshoot_takes_one_corrective_pass() {
        let mut display = MemoryDisplay::new(200, 150);
        let decoder = MemoryDecoder::new().with_image("page", solid_image(100, 300, GREEN));
        let mut controller = controller(decoder, &["page"], &display);
        controller.refresh(&mut display);

        controller.viewport_mut().offset_y = 1_000;
        assert_eq!(controller.refresh(&mut display), 2);
        assert_eq!(controller.viewport().offset_y, 150);
        assert_eq!(display.surface().pixel(0, 149), Some(GREEN));

        // already settled
        assert_eq!(controller.refresh(&mut display), 1);
    }

    #[test]
    fn end_lands_on_last_screenful() {
        let mut display = MemoryDisplay::new(50, 100);
        let decoder = MemoryDecoder::new()
            .with_image("a", solid_image(50, 120, GREEN))
            .with_image("b", solid_image(50, 80, GREEN));
        let mut controller = controller(decoder, &["a", "b"], &display);
        controller.refresh(&mut display);
        controller.handle(Action::Down, &mut display);
        controller.handle(Action::PageDown, &mut display);

        controller.handle(Action::End, &mut display);
        assert_eq!(controller.viewport().offset_y, 100);
        assert_eq!(controller.document().total_height(1.0), 200);

        controller.handle(Action::Home, &mut display);
        assert_eq!(controller.viewport().offset_y, 0);
    }

    #[test]
    fn end_over_undecoded_items_shows_the_last_item() {
        let blue = Rgb::new(0x10, 0x20, 0xE0);
        let mut display = MemoryDisplay::new(20, 100);
        let names: Vec<String> = (0..10).map(|i| format!("panel-{i}")).collect();
        let mut decoder = MemoryDecoder::new();
        for (i, name) in names.iter().enumerate() {
            let color = if i == 9 { blue } else { GREEN };
            decoder = decoder.with_image(name, solid_image(20, 50, color));
        }
        let items: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut controller = controller(decoder, &items, &display);
        controller.refresh(&mut display);

        controller.handle(Action::End, &mut display);

        assert_eq!(controller.document().total_height(1.0), 500);
        assert_eq!(controller.viewport().offset_y, 400);
        assert_eq!(display.surface().pixel(0, 50), Some(blue));
        assert_eq!(display.surface().pixel(19, 99), Some(blue));
        assert_eq!(display.surface().pixel(0, 49), Some(GREEN));

        // the frame on screen matches the settled viewport
        assert_eq!(controller.refresh(&mut display), 1);
        assert_eq!(controller.viewport().offset_y, 400);
    }

    #[test]
    fn quit_does_not_render() {
        let mut display = MemoryDisplay::new(10, 10);
        let mut controller = controller(MemoryDecoder::new(), &["a"], &display);
        assert_eq!(controller.handle(Action::Quit, &mut display), Flow::Quit);
        assert_eq!(display.updates(), 0);
        assert!(controller.decoder().opened().is_empty());
    }

    #[test]
    fn resize_adopts_display_geometry() {
        let mut display = MemoryDisplay::new(100, 100);
        let decoder = MemoryDecoder::new().with_image("page", solid_image(300, 300, GREEN));
        let mut controller = controller(decoder, &["page"], &display);
        controller.refresh(&mut display);
        controller.viewport_mut().offset_y = 200;
        controller.refresh(&mut display);

        controller.handle(
            Action::Resize {
                width: 100,
                height: 250,
            },
            &mut display,
        );
        assert_eq!(controller.viewport().height, 250);
        assert_eq!(controller.viewport().offset_y, 50);
    }

    #[test]
    fn failed_claim_skips_the_pass() {
        let mut display = MemoryDisplay::new(10, 10).failing_claims();
        let decoder = MemoryDecoder::new().with_image("page", solid_image(10, 10, GREEN));
        let mut controller = controller(decoder, &["page"], &display);
        assert_eq!(controller.refresh(&mut display), 0);
        assert_eq!(display.updates(), 0);
    }
}
