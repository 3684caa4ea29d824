//! Streaming decode pipeline
//!
//! Every item is decoded by an external helper process that writes a
//! farbfeld stream to a pipe. Nothing decoded is kept between renders: each
//! render of an item re-runs the helper and consumes the stream from byte
//! zero through a small read buffer owned by the compositor.

mod farbfeld;
mod transport;

pub use farbfeld::{FarbfeldReader, FrameHeader, HEADER_LEN, MAGIC, PIXEL_BYTES, Pixels};
pub use transport::{DecoderVariant, HelperDecoder, ProcessStream};

use crate::error::DecodeError;

/// Read buffer size, one pipe buffer's worth.
pub const READ_BUF_SIZE: usize = 4096;

/// Fixed-size scratch buffer lent to one pixel stream at a time.
pub struct ReadBuffer {
    bytes: Box<[u8]>,
}

impl ReadBuffer {
    pub fn new() -> Self {
        Self::with_capacity(READ_BUF_SIZE)
    }

    /// Buffers smaller than a single pixel are bumped up to one pixel.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity.max(PIXEL_BYTES)].into_boxed_slice(),
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Default for ReadBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// A decode session producing one image.
pub trait PixelSource {
    /// Read and validate the 16-byte header. Must be called exactly once,
    /// before any chunk is read.
    fn read_header(&mut self) -> Result<FrameHeader, DecodeError>;

    /// Read the next run of whole pixels into `buf`.
    ///
    /// Returns `Ok(None)` once the stream is exhausted.
    fn read_chunk<'b>(&mut self, buf: &'b mut ReadBuffer)
    -> Result<Option<Pixels<'b>>, DecodeError>;

    /// Release the session, reaping any process behind it.
    fn finish(&mut self) {}
}

/// Opens pixel streams for item locators.
pub trait Decoder {
    fn open(&mut self, locator: &str) -> Result<Box<dyn PixelSource>, DecodeError>;
}
