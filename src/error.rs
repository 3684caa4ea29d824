//! Error types for the decode pipeline, display backends and settings

use std::io;
use std::path::PathBuf;

/// The byte stream did not start with a valid pixel header.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("short header: got {got} of 16 bytes")]
    ShortHeader { got: usize },
    #[error("bad header magic")]
    BadMagic,
}

/// Why an item could not be decoded.
///
/// Every variant is recoverable: the compositor paints the error block for
/// the item and moves on to the next one.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The decoder process or its input could not be set up.
    #[error("{context}: {source}")]
    Setup {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A read from the decoder pipe failed for a reason other than a signal.
    #[error("read: {0}")]
    Transport(#[source] io::Error),
}

impl DecodeError {
    pub fn setup(context: impl Into<String>, source: io::Error) -> Self {
        Self::Setup {
            context: context.into(),
            source,
        }
    }
}

/// Failures reported by a display backend.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("failed to claim window region")]
    Claim,
    #[error("failed to get window geometry")]
    Geometry,
    #[error("failed to resize window region to {width}x{height}")]
    Resize { width: u32, height: u32 },
    #[error("failed to update window: {0}")]
    Update(#[source] io::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A settings file given explicitly could not be used.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
