//! Display surface and the format-adapting pixel writer

use serde::{Deserialize, Serialize};

/// 8-bit RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const RED: Rgb = Rgb::new(0xFF, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// Byte layout of one surface pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// `[R, G, B]`
    #[default]
    Rgb24,
    /// `[X, R, G, B]`
    Xrgb32,
    /// `[R, G, B, X]`
    Rgbx32,
    /// `[B, G, R, X]`
    Bgrx32,
}

/// Unused channel filler for the 32-bit layouts.
const OPAQUE: u8 = 0xFF;

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb24 => 3,
            PixelFormat::Xrgb32 | PixelFormat::Rgbx32 | PixelFormat::Bgrx32 => 4,
        }
    }

    fn encode(self, color: Rgb, out: &mut [u8]) {
        let Rgb { r, g, b } = color;
        match self {
            PixelFormat::Rgb24 => out.copy_from_slice(&[r, g, b]),
            PixelFormat::Xrgb32 => out.copy_from_slice(&[OPAQUE, r, g, b]),
            PixelFormat::Rgbx32 => out.copy_from_slice(&[r, g, b, OPAQUE]),
            PixelFormat::Bgrx32 => out.copy_from_slice(&[b, g, r, OPAQUE]),
        }
    }

    fn decode(self, bytes: &[u8]) -> Rgb {
        match self {
            PixelFormat::Rgb24 | PixelFormat::Rgbx32 => Rgb::new(bytes[0], bytes[1], bytes[2]),
            PixelFormat::Xrgb32 => Rgb::new(bytes[1], bytes[2], bytes[3]),
            PixelFormat::Bgrx32 => Rgb::new(bytes[2], bytes[1], bytes[0]),
        }
    }
}

/// Target pixel buffer of a display backend.
///
/// All writes go through [`DisplaySurface::put_pixel`] or
/// [`DisplaySurface::fill_rect`], which clip to `[0, width) × [0, height)`
/// and never touch the padding at the end of a row.
#[derive(Clone, Debug)]
pub struct DisplaySurface {
    buffer: Vec<u8>,
    stride: usize,
    format: PixelFormat,
    width: u32,
    height: u32,
}

impl DisplaySurface {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = width as usize * format.bytes_per_pixel();
        Self::with_stride(width, height, stride, format)
    }

    /// A surface whose rows are `stride` bytes apart; a stride shorter than
    /// one row of pixels is widened to fit.
    pub fn with_stride(width: u32, height: u32, stride: usize, format: PixelFormat) -> Self {
        let stride = stride.max(width as usize * format.bytes_per_pixel());
        Self {
            buffer: vec![0; stride * height as usize],
            stride,
            format,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Reallocate for new dimensions, keeping the format. Contents are lost.
    pub fn resize(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height, self.format);
    }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(x as usize * self.format.bytes_per_pixel() + y as usize * self.stride)
    }

    /// Write one pixel; coordinates outside the surface are ignored.
    #[inline]
    pub fn put_pixel(&mut self, x: i64, y: i64, color: Rgb) {
        if let Some(offset) = self.offset(x, y) {
            let bpp = self.format.bytes_per_pixel();
            self.format.encode(color, &mut self.buffer[offset..offset + bpp]);
        }
    }

    pub fn pixel(&self, x: i64, y: i64) -> Option<Rgb> {
        let offset = self.offset(x, y)?;
        let bpp = self.format.bytes_per_pixel();
        Some(self.format.decode(&self.buffer[offset..offset + bpp]))
    }

    /// Fill the half-open rectangle `[x0, x1) × [y0, y1)`, clipped.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb) {
        let x0 = x0.clamp(0, i64::from(self.width));
        let x1 = x1.clamp(0, i64::from(self.width));
        let y0 = y0.clamp(0, i64::from(self.height));
        let y1 = y1.clamp(0, i64::from(self.height));
        for y in y0..y1 {
            for x in x0..x1 {
                self.put_pixel(x, y, color);
            }
        }
    }

    pub fn clear(&mut self, color: Rgb) {
        self.fill_rect(0, 0, i64::from(self.width), i64::from(self.height), color);
    }

    /// Copy the visible pixels out as tightly packed `[R, G, B]` rows.
    pub fn write_rgb(&self, out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.width as usize * self.height as usize * 3);
        let bpp = self.format.bytes_per_pixel();
        for row in self.buffer.chunks_exact(self.stride.max(1)).take(self.height as usize) {
            for pixel in row[..self.width as usize * bpp].chunks_exact(bpp) {
                let Rgb { r, g, b } = self.format.decode(pixel);
                out.extend_from_slice(&[r, g, b]);
            }
        }
    }
}
