//! Incremental farbfeld stream reader
//!
//! Wire format: `"farbfeld"`, width (u32 BE), height (u32 BE), then
//! `width * height` pixels of 8 bytes each. Only bytes 0 (blue), 2 (green)
//! and 4 (red) of a pixel are consulted.

use std::io::{self, ErrorKind, Read};
use std::slice::ChunksExact;

use log::debug;

use super::{PixelSource, ReadBuffer};
use crate::error::{DecodeError, ProtocolError};
use crate::surface::Rgb;

pub const MAGIC: &[u8; 8] = b"farbfeld";
pub const HEADER_LEN: usize = 16;
pub const PIXEL_BYTES: usize = 8;

/// Declared image dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub width: u32,
    pub height: u32,
}

impl FrameHeader {
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Result<Self, ProtocolError> {
        if &bytes[..8] != MAGIC {
            return Err(ProtocolError::BadMagic);
        }
        let width = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let height = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
        Ok(Self { width, height })
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[..8].copy_from_slice(MAGIC);
        bytes[8..12].copy_from_slice(&self.width.to_be_bytes());
        bytes[12..].copy_from_slice(&self.height.to_be_bytes());
        bytes
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl Rgb {
    fn from_wire(pixel: &[u8]) -> Self {
        Self {
            r: pixel[4],
            g: pixel[2],
            b: pixel[0],
        }
    }

    /// Encode as a stream pixel with an opaque alpha.
    pub fn to_wire(self) -> [u8; PIXEL_BYTES] {
        [self.b, self.b, self.g, self.g, self.r, self.r, 0xFF, 0xFF]
    }
}

/// Whole pixels produced by one chunk read.
pub struct Pixels<'b> {
    chunks: ChunksExact<'b, u8>,
}

impl<'b> Pixels<'b> {
    fn new(bytes: &'b [u8]) -> Self {
        Self {
            chunks: bytes.chunks_exact(PIXEL_BYTES),
        }
    }
}

impl Iterator for Pixels<'_> {
    type Item = Rgb;

    fn next(&mut self) -> Option<Rgb> {
        self.chunks.next().map(Rgb::from_wire)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Pixels<'_> {}

/// Farbfeld reader over any byte stream.
///
/// A pixel split across two reads is carried over to the next chunk rather
/// than dropped, so chunk boundaries never shift the pixel grid.
pub struct FarbfeldReader<R> {
    inner: R,
    carry: [u8; PIXEL_BYTES],
    carry_len: usize,
    drained: bool,
}

impl<R: Read> FarbfeldReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            carry: [0; PIXEL_BYTES],
            carry_len: 0,
            drained: false,
        }
    }

    /// True once the underlying stream has reported end of file.
    pub fn is_drained(&self) -> bool {
        self.drained
    }

    fn read_retrying(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.inner.read(buf) {
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                result => return result,
            }
        }
    }
}

impl<R: Read> PixelSource for FarbfeldReader<R> {
    fn read_header(&mut self) -> Result<FrameHeader, DecodeError> {
        let mut header = [0u8; HEADER_LEN];
        let mut got = 0;
        while got < HEADER_LEN {
            let count = self
                .read_retrying(&mut header[got..])
                .map_err(DecodeError::Transport)?;
            if count == 0 {
                self.drained = true;
                return Err(ProtocolError::ShortHeader { got }.into());
            }
            got += count;
        }
        Ok(FrameHeader::parse(&header)?)
    }

    fn read_chunk<'b>(
        &mut self,
        buf: &'b mut ReadBuffer,
    ) -> Result<Option<Pixels<'b>>, DecodeError> {
        if self.drained {
            return Ok(None);
        }

        let bytes = buf.as_mut_slice();
        let mut filled = self.carry_len;
        bytes[..filled].copy_from_slice(&self.carry[..filled]);
        self.carry_len = 0;

        loop {
            let count = self
                .read_retrying(&mut bytes[filled..])
                .map_err(DecodeError::Transport)?;
            if count == 0 {
                self.drained = true;
                if filled > 0 {
                    debug!("dropping {filled} trailing bytes of a partial pixel");
                }
                return Ok(None);
            }
            filled += count;

            let whole = filled - filled % PIXEL_BYTES;
            if whole == 0 {
                continue;
            }
            let tail = filled - whole;
            self.carry[..tail].copy_from_slice(&bytes[whole..filled]);
            self.carry_len = tail;

            let bytes: &'b [u8] = bytes;
            return Ok(Some(Pixels::new(&bytes[..whole])));
        }
    }
}
