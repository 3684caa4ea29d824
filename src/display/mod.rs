//! Display backends
//!
//! A backend owns the [`DisplaySurface`] and lends it to the compositor for
//! one render pass at a time, bracketed by [`Display::claim`] and
//! [`Display::update`].

pub mod kgfx;
mod kitty;

pub use kitty::{CellSize, KittyDisplay, TerminalGuard};

use crate::error::SurfaceError;
use crate::surface::DisplaySurface;

pub trait Display {
    /// Current visible size in pixels.
    fn geometry(&self) -> (u32, u32);

    /// Take the surface for a render pass.
    fn claim(&mut self) -> Result<&mut DisplaySurface, SurfaceError>;

    /// Publish what was drawn since the last claim.
    fn update(&mut self) -> Result<(), SurfaceError>;

    /// React to a resize event. The arguments are in the unit the backend
    /// reports resize events in; [`Display::geometry`] gives the result.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError>;
}
