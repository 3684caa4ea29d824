//! Kitty graphics protocol commands used to present frames.

use std::io::{self, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::write::ZlibEncoder;

const ESC: u8 = 0x1B;
const APC_START: &[u8] = &[ESC, b'_', b'G'];
const APC_END: &[u8] = &[ESC, b'\\'];

/// Maximum payload size per chunk (base64 characters).
pub const CHUNK_LIMIT: usize = 4096;

/// Frames are always sent as packed 24-bit RGB.
const RGB_FORMAT: u8 = 24;

/// Quiet mode for terminal responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quiet {
    #[default]
    Normal,
    Silent,
}

impl Quiet {
    fn code(self) -> Option<u8> {
        match self {
            Quiet::Normal => None,
            Quiet::Silent => Some(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Zlib,
}

/// Zlib-compress and base64-encode a pixel payload.
pub fn compress_and_encode(pixels: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(pixels)?;
    let compressed = encoder.finish()?;
    Ok(BASE64.encode(compressed).into_bytes())
}

pub fn encode(pixels: &[u8]) -> Vec<u8> {
    BASE64.encode(pixels).into_bytes()
}

/// Direct (inline) pixel transmission, chunked as the protocol requires.
pub struct DirectTransmit {
    width: u32,
    height: u32,
    image_id: Option<u32>,
    placement_id: Option<u32>,
    quiet: Quiet,
    compression: Compression,
    chunk_limit: usize,
}

impl DirectTransmit {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            image_id: None,
            placement_id: None,
            quiet: Quiet::default(),
            compression: Compression::default(),
            chunk_limit: CHUNK_LIMIT,
        }
    }

    pub fn image_id(mut self, id: u32) -> Self {
        self.image_id = Some(id);
        self
    }

    pub fn placement_id(mut self, id: u32) -> Self {
        self.placement_id = Some(id);
        self
    }

    pub fn quiet(mut self, quiet: Quiet) -> Self {
        self.quiet = quiet;
        self
    }

    /// Declares how the payload passed to [`DirectTransmit::send_encoded`]
    /// was compressed.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Will be clamped to [4, CHUNK_LIMIT] and aligned down to a multiple of 4.
    pub fn chunk_limit(mut self, limit: usize) -> Self {
        self.chunk_limit = limit;
        self
    }

    fn params(&self) -> String {
        let mut params = format!(
            "a=T,t=d,f={RGB_FORMAT},s={},v={}",
            self.width,
            self.height
        );
        if let Some(id) = self.image_id {
            params.push_str(&format!(",i={id}"));
        }
        if let Some(id) = self.placement_id {
            params.push_str(&format!(",p={id}"));
        }
        // The cursor stays put so the frame never scrolls the screen.
        params.push_str(",C=1");
        if self.compression == Compression::Zlib {
            params.push_str(",o=z");
        }
        if let Some(q) = self.quiet.code() {
            params.push_str(&format!(",q={q}"));
        }
        params
    }

    /// Transmit a base64 payload. Returns the number of chunks written.
    pub fn send_encoded<W: Write>(self, writer: &mut W, encoded: &[u8]) -> io::Result<usize> {
        let limit = self.chunk_limit.clamp(4, CHUNK_LIMIT);
        let limit = limit - (limit % 4);
        let params = self.params();

        if encoded.is_empty() {
            writer.write_all(APC_START)?;
            writer.write_all(params.as_bytes())?;
            writer.write_all(b";")?;
            writer.write_all(APC_END)?;
            return Ok(1);
        }

        let total = encoded.len().div_ceil(limit);
        for (i, chunk) in encoded.chunks(limit).enumerate() {
            writer.write_all(APC_START)?;
            if i == 0 {
                writer.write_all(params.as_bytes())?;
                if total > 1 {
                    writer.write_all(b",m=1")?;
                }
            } else if i == total - 1 {
                writer.write_all(b"m=0")?;
            } else {
                writer.write_all(b"m=1")?;
            }
            writer.write_all(b";")?;
            writer.write_all(chunk)?;
            writer.write_all(APC_END)?;
        }
        Ok(total)
    }
}

/// Delete every image placement and free the image data.
pub fn delete_all<W: Write>(writer: &mut W) -> io::Result<()> {
    writer.write_all(APC_START)?;
    writer.write_all(b"a=d,d=A,q=2")?;
    writer.write_all(APC_END)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chunk_carries_all_params() {
        let mut output = Vec::new();
        let chunks = DirectTransmit::new(100, 50)
            .image_id(1)
            .placement_id(1)
            .quiet(Quiet::Silent)
            .send_encoded(&mut output, b"AAAA")
            .unwrap();

        assert_eq!(chunks, 1);
        let output = String::from_utf8(output).unwrap();
        assert_eq!(
            output,
            "\x1b_Ga=T,t=d,f=24,s=100,v=50,i=1,p=1,C=1,q=2;AAAA\x1b\\"
        );
    }

    #[test]
    fn long_payloads_are_chunked() {
        let payload = vec![b'A'; 10];
        let mut output = Vec::new();
        let chunks = DirectTransmit::new(1, 1)
            .compression(Compression::Zlib)
            .chunk_limit(5)
            .send_encoded(&mut output, &payload)
            .unwrap();

        // 5 aligns down to 4: 4 + 4 + 2
        assert_eq!(chunks, 3);
        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("\x1b_Ga=T,t=d,f=24,s=1,v=1,C=1,o=z,m=1;AAAA\x1b\\"));
        assert!(output.contains("\x1b_Gm=1;AAAA\x1b\\"));
        assert!(output.ends_with("\x1b_Gm=0;AA\x1b\\"));
    }

    #[test]
    fn compressed_payload_is_base64() {
        let encoded = compress_and_encode(&[7u8; 3000]).unwrap();
        assert!(encoded.len() < 3000);
        assert_eq!(encoded.len() % 4, 0);
        assert!(encoded.iter().all(|b| b.is_ascii_alphanumeric() || b"+/=".contains(b)));
    }

    #[test]
    fn delete_all_frees_images() {
        let mut output = Vec::new();
        delete_all(&mut output).unwrap();
        assert_eq!(output, b"\x1b_Ga=d,d=A,q=2\x1b\\");
    }
}
