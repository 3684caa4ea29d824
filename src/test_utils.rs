//! Shared test fixtures: synthetic farbfeld images, in-memory decoders and
//! displays, and scripted input.

use std::collections::HashMap;
use std::io::{self, Cursor, ErrorKind, Read};

use crossterm::event::{Event, KeyCode, KeyModifiers};

use crate::decode::{Decoder, FarbfeldReader, FrameHeader, PixelSource};
use crate::display::Display;
use crate::error::{DecodeError, SurfaceError};
use crate::inputs::ScriptedEvents;
use crate::surface::{DisplaySurface, PixelFormat, Rgb};

/// Encode a `width × height` image whose pixel colors come from `color`.
pub fn farbfeld_image(width: u32, height: u32, color: impl Fn(u32, u32) -> Rgb) -> Vec<u8> {
    let mut bytes = FrameHeader { width, height }.encode().to_vec();
    for y in 0..height {
        for x in 0..width {
            bytes.extend_from_slice(&color(x, y).to_wire());
        }
    }
    bytes
}

pub fn solid_image(width: u32, height: u32, color: Rgb) -> Vec<u8> {
    farbfeld_image(width, height, |_, _| color)
}

/// Reader handing out at most `max_per_read` bytes per call, optionally
/// interrupting or failing along the way.
pub struct ChunkedReader {
    inner: Cursor<Vec<u8>>,
    max_per_read: usize,
    interrupt_every: Option<usize>,
    fail_after: Option<usize>,
    calls: usize,
    successful: usize,
}

impl ChunkedReader {
    pub fn new(bytes: Vec<u8>, max_per_read: usize) -> Self {
        Self {
            inner: Cursor::new(bytes),
            max_per_read: max_per_read.max(1),
            interrupt_every: None,
            fail_after: None,
            calls: 0,
            successful: 0,
        }
    }

    /// Every `n`th read call returns `ErrorKind::Interrupted`.
    pub fn interrupt_every(mut self, n: usize) -> Self {
        self.interrupt_every = Some(n.max(1));
        self
    }

    /// Reads fail with a broken pipe after `n` successful reads.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.calls += 1;
        if self.interrupt_every.is_some_and(|n| self.calls % n == 0) {
            return Err(io::Error::from(ErrorKind::Interrupted));
        }
        if self.fail_after.is_some_and(|n| self.successful >= n) {
            return Err(io::Error::from(ErrorKind::BrokenPipe));
        }
        let limit = buf.len().min(self.max_per_read);
        let count = self.inner.read(&mut buf[..limit])?;
        self.successful += 1;
        Ok(count)
    }
}

/// Decoder serving encoded images from memory by locator.
#[derive(Default)]
pub struct MemoryDecoder {
    images: HashMap<String, Vec<u8>>,
    opened: Vec<String>,
}

impl MemoryDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, locator: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.images.insert(locator.into(), bytes);
        self
    }

    /// Locators opened so far, in order.
    pub fn opened(&self) -> &[String] {
        &self.opened
    }
}

impl Decoder for MemoryDecoder {
    fn open(&mut self, locator: &str) -> Result<Box<dyn PixelSource>, DecodeError> {
        self.opened.push(locator.to_string());
        let bytes = self.images.get(locator).cloned().ok_or_else(|| {
            DecodeError::setup(
                format!("open({locator})"),
                io::Error::from(ErrorKind::NotFound),
            )
        })?;
        Ok(Box::new(FarbfeldReader::new(Cursor::new(bytes))))
    }
}

/// Display keeping its surface in memory. Resize arguments are pixels.
pub struct MemoryDisplay {
    surface: DisplaySurface,
    updates: usize,
    fail_claims: bool,
}

impl MemoryDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_format(width, height, PixelFormat::Rgb24)
    }

    pub fn with_format(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            surface: DisplaySurface::new(width, height, format),
            updates: 0,
            fail_claims: false,
        }
    }

    pub fn failing_claims(mut self) -> Self {
        self.fail_claims = true;
        self
    }

    pub fn surface(&self) -> &DisplaySurface {
        &self.surface
    }

    /// Number of frames published.
    pub fn updates(&self) -> usize {
        self.updates
    }
}

impl Display for MemoryDisplay {
    fn geometry(&self) -> (u32, u32) {
        (self.surface.width(), self.surface.height())
    }

    fn claim(&mut self) -> Result<&mut DisplaySurface, SurfaceError> {
        if self.fail_claims {
            return Err(SurfaceError::Claim);
        }
        Ok(&mut self.surface)
    }

    fn update(&mut self) -> Result<(), SurfaceError> {
        self.updates += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::Resize { width, height });
        }
        self.surface.resize(width, height);
        Ok(())
    }
}

/// Builder for scripted input sequences.
#[derive(Default)]
pub struct ScenarioBuilder {
    events: Vec<Event>,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press_char(mut self, c: char) -> Self {
        self.events.push(ScriptedEvents::char_key(c));
        self
    }

    pub fn press(mut self, code: KeyCode) -> Self {
        self.events
            .push(ScriptedEvents::key_event(code, KeyModifiers::empty()));
        self
    }

    pub fn press_ctrl_char(mut self, c: char) -> Self {
        self.events.push(ScriptedEvents::ctrl_char_key(c));
        self
    }

    /// Scroll down `times` arrow steps.
    pub fn scroll_down(mut self, times: usize) -> Self {
        for _ in 0..times {
            self = self.press_char('j');
        }
        self
    }

    pub fn resize(mut self, columns: u16, rows: u16) -> Self {
        self.events.push(Event::Resize(columns, rows));
        self
    }

    pub fn build(self) -> ScriptedEvents {
        ScriptedEvents::new(self.events)
    }
}
