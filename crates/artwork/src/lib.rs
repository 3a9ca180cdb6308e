//! Grid artwork generation for DeckStore shortcuts.
//!
//! Renders the five images Steam shows for a non-Steam shortcut from a single
//! source logo: library header, hero banner, portrait capsule, icon and logo.

mod canvas;
mod error;
mod renderer;

pub use canvas::{Direction, fit_to_box, gradient};
pub use error::ArtworkError;
pub use renderer::GradientRenderer;
