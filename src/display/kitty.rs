//! Terminal backend presenting the surface as a single kitty graphics image

use std::io::{self, Stdout, Write};

use crossterm::cursor::{self, MoveTo};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use log::{debug, warn};

use super::Display;
use super::kgfx::{self, Compression, DirectTransmit, Quiet};
use crate::error::SurfaceError;
use crate::surface::{DisplaySurface, PixelFormat};

const IMAGE_ID: u32 = 1;
const PLACEMENT_ID: u32 = 1;

/// Pixel size of one terminal cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

pub struct KittyDisplay<W: Write = Stdout> {
    out: W,
    surface: DisplaySurface,
    cell: CellSize,
    compress: bool,
    frame: Vec<u8>,
}

impl KittyDisplay<Stdout> {
    /// Size the surface from the terminal's reported pixel geometry.
    pub fn open(format: PixelFormat, compress: bool) -> Result<Self, SurfaceError> {
        let size = terminal::window_size().map_err(|err| {
            debug!("window_size(): {err}");
            SurfaceError::Geometry
        })?;
        if size.width == 0 || size.height == 0 || size.columns == 0 || size.rows == 0 {
            warn!(
                "terminal reports {}x{} px over {}x{} cells",
                size.width, size.height, size.columns, size.rows
            );
            return Err(SurfaceError::Geometry);
        }

        let cell = CellSize {
            width: u32::from(size.width) / u32::from(size.columns),
            height: u32::from(size.height) / u32::from(size.rows),
        };
        debug!(
            "terminal {}x{} px, cell {}x{}",
            size.width, size.height, cell.width, cell.height
        );
        Ok(Self::with_writer(
            io::stdout(),
            u32::from(size.width),
            u32::from(size.height),
            cell,
            format,
            compress,
        ))
    }
}

impl<W: Write> KittyDisplay<W> {
    pub fn with_writer(
        out: W,
        width: u32,
        height: u32,
        cell: CellSize,
        format: PixelFormat,
        compress: bool,
    ) -> Self {
        Self {
            out,
            surface: DisplaySurface::new(width, height, format),
            cell,
            compress,
            frame: Vec::new(),
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    fn present(&mut self) -> io::Result<()> {
        self.surface.write_rgb(&mut self.frame);
        let (payload, compression) = if self.compress {
            (kgfx::compress_and_encode(&self.frame)?, Compression::Zlib)
        } else {
            (kgfx::encode(&self.frame), Compression::None)
        };

        queue!(self.out, MoveTo(0, 0))?;
        let chunks = DirectTransmit::new(self.surface.width(), self.surface.height())
            .image_id(IMAGE_ID)
            .placement_id(PLACEMENT_ID)
            .quiet(Quiet::Silent)
            .compression(compression)
            .send_encoded(&mut self.out, &payload)?;
        self.out.flush()?;
        debug!("frame sent in {chunks} chunks ({} bytes)", payload.len());
        Ok(())
    }
}

impl<W: Write> Display for KittyDisplay<W> {
    fn geometry(&self) -> (u32, u32) {
        (self.surface.width(), self.surface.height())
    }

    fn claim(&mut self) -> Result<&mut DisplaySurface, SurfaceError> {
        if self.surface.width() == 0 || self.surface.height() == 0 {
            return Err(SurfaceError::Claim);
        }
        Ok(&mut self.surface)
    }

    fn update(&mut self) -> Result<(), SurfaceError> {
        self.present().map_err(SurfaceError::Update)
    }

    /// `columns` and `rows` are terminal cells, as crossterm reports them.
    fn resize(&mut self, columns: u32, rows: u32) -> Result<(), SurfaceError> {
        let width = columns.saturating_mul(self.cell.width);
        let height = rows.saturating_mul(self.cell.height);
        if width == 0 || height == 0 {
            return Err(SurfaceError::Resize { width, height });
        }
        debug!("resizing surface to {width}x{height}");
        self.surface.resize(width, height);
        Ok(())
    }
}

/// Raw mode and the alternate screen for as long as the guard lives.
pub struct TerminalGuard {
    restored: bool,
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        Ok(Self { restored: false })
    }

    pub fn restore(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        let mut out = io::stdout();
        let _ = kgfx::delete_all(&mut out);
        let _ = execute!(out, cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        self.restore();
    }
}
