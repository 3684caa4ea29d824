pub mod app;
pub mod cli;
pub mod compositor;
pub mod controller;
pub mod decode;
pub mod display;
pub mod error;
pub mod inputs;
pub mod layout;
pub mod panic_handler;
pub mod settings;
pub mod surface;
pub mod viewport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use compositor::{Compositor, Palette};
pub use controller::{Controller, Flow};
pub use layout::Document;
pub use surface::{DisplaySurface, PixelFormat, Rgb};
pub use viewport::{Action, Viewport};
