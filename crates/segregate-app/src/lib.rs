//! Presentation plumbing for the segregate simulator.
//!
//! The engine in `segregate-core` knows nothing about terminals; this
//! crate supplies the renderer seam and the ANSI implementation the
//! `segregate` binary drives between rounds.

use anyhow::Result;
use segregate_core::WorldState;

pub mod terminal;

pub use terminal::AnsiRenderer;

/// A display surface invoked by the main loop after every round.
pub trait Renderer {
    /// Stable identifier describing the renderer implementation.
    fn name(&self) -> &'static str;

    /// Draw the current world state.
    fn draw(&mut self, world: &WorldState) -> Result<()>;
}
