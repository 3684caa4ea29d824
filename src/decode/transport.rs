//! Decoder subprocess management

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};

use log::{debug, error, warn};

use super::farbfeld::{FarbfeldReader, FrameHeader, Pixels};
use super::{Decoder, PixelSource, ReadBuffer};
use crate::error::DecodeError;

/// How the helper program gets at the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderVariant {
    /// The locator is a file the parent opens and connects to the helper's
    /// stdin; the helper runs without arguments.
    Stdin,
    /// The locator is passed as the helper's only argument.
    Argument,
}

/// Runs one helper process per item render.
#[derive(Clone, Debug)]
pub struct HelperDecoder {
    program: PathBuf,
    variant: DecoderVariant,
}

impl HelperDecoder {
    pub fn new(program: impl Into<PathBuf>, variant: DecoderVariant) -> Self {
        Self {
            program: program.into(),
            variant,
        }
    }

    /// A converter reading the image on stdin, e.g. `2ff`.
    pub fn stdin(program: impl Into<PathBuf>) -> Self {
        Self::new(program, DecoderVariant::Stdin)
    }

    /// A helper resolving an application-specific handle itself.
    pub fn argument(program: impl Into<PathBuf>) -> Self {
        Self::new(program, DecoderVariant::Argument)
    }
}

impl Decoder for HelperDecoder {
    fn open(&mut self, locator: &str) -> Result<Box<dyn PixelSource>, DecodeError> {
        let mut command = Command::new(&self.program);
        // The terminal is the display; helper chatter would corrupt it.
        command.stdout(Stdio::piped()).stderr(Stdio::null());

        match self.variant {
            DecoderVariant::Stdin => {
                let input = File::open(locator)
                    .map_err(|err| DecodeError::setup(format!("open({locator})"), err))?;
                command.stdin(Stdio::from(input));
            }
            DecoderVariant::Argument => {
                command.arg(locator).stdin(Stdio::null());
            }
        }

        let mut child = command.spawn().map_err(|err| {
            DecodeError::setup(format!("spawn({})", self.program.display()), err)
        })?;
        debug!("started helper pid {} for {locator}", child.id());

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(DecodeError::setup(
                "pipe",
                io::Error::other("helper stdout was not captured"),
            ));
        };

        Ok(Box::new(ProcessStream {
            locator: locator.to_string(),
            child: Some(child),
            reader: FarbfeldReader::new(stdout),
        }))
    }
}

/// Pixel stream read from a live helper process.
///
/// The child is reaped in [`PixelSource::finish`] or on drop, whichever
/// comes first.
pub struct ProcessStream {
    locator: String,
    child: Option<Child>,
    reader: FarbfeldReader<ChildStdout>,
}

impl ProcessStream {
    fn reap(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        // A helper still writing into a pipe nobody drains would block
        // forever; stop it before waiting.
        if !self.reader.is_drained() {
            debug!("stopping helper for {} before end of stream", self.locator);
            if let Err(err) = child.kill() {
                debug!("kill(): {err}");
            }
        }

        match child.wait() {
            Ok(status) if status.success() => {
                debug!("helper for {} exited cleanly", self.locator);
            }
            Ok(status) => {
                if self.reader.is_drained() {
                    warn!("helper failed for {}: {status}", self.locator);
                } else {
                    debug!("helper for {} stopped: {status}", self.locator);
                }
            }
            Err(err) => error!("waitpid(): {err}"),
        }
    }
}

impl PixelSource for ProcessStream {
    fn read_header(&mut self) -> Result<FrameHeader, DecodeError> {
        self.reader.read_header()
    }

    fn read_chunk<'b>(
        &mut self,
        buf: &'b mut ReadBuffer,
    ) -> Result<Option<Pixels<'b>>, DecodeError> {
        self.reader.read_chunk(buf)
    }

    fn finish(&mut self) {
        self.reap();
    }
}

impl Drop for ProcessStream {
    fn drop(&mut self) {
        self.reap();
    }
}
