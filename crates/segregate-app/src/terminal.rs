//! ANSI terminal renderer: two glyph columns per cell, red/cyan agents,
//! and a one-line status bar under the grid.

use std::io::{self, Write};

use anyhow::{Context, Result};
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use segregate_core::{Cell, WorldState};

use crate::Renderer;

/// Renderer writing crossterm-queued ANSI frames to any [`Write`] sink.
///
/// The screen is cleared once on the first frame; subsequent frames home
/// the cursor and overdraw in place, which keeps the animation flicker-free
/// at the small grid sizes this simulator runs at.
pub struct AnsiRenderer<W: Write> {
    out: W,
    cleared: bool,
}

impl AnsiRenderer<io::Stdout> {
    /// Renderer bound to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> AnsiRenderer<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out, cleared: false }
    }

    /// Consume the renderer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for AnsiRenderer<W> {
    fn name(&self) -> &'static str {
        "ansi-terminal"
    }

    fn draw(&mut self, world: &WorldState) -> Result<()> {
        if !self.cleared {
            queue!(self.out, Clear(ClearType::All)).context("clear screen")?;
            self.cleared = true;
        }
        queue!(self.out, MoveTo(0, 0)).context("home cursor")?;

        let grid = world.grid();
        for row in 0..grid.rows() + 2 {
            for col in 0..grid.cols() + 2 {
                match grid.get(row, col) {
                    Cell::Empty => queue!(self.out, Print("  ")),
                    Cell::Red => {
                        queue!(self.out, SetForegroundColor(Color::Red), Print("X "))
                    }
                    Cell::Blue => {
                        queue!(self.out, SetForegroundColor(Color::Cyan), Print("X "))
                    }
                }
                .context("draw cell")?;
            }
            queue!(self.out, ResetColor, Print("\r\n")).context("end row")?;
        }

        let status = format!(
            "\r\nRound {} | Satisfied {:>3}% | Alg {}: {}",
            world.round(),
            world.satisfied_percent(),
            world.config().strategy.index(),
            world.strategy_description(),
        );
        queue!(self.out, Print(status)).context("draw status line")?;
        self.out.flush().context("flush frame")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segregate_core::{RelocationStrategy, SegregationConfig, WorldState};

    #[test]
    fn frame_carries_grid_and_status_line() {
        let config = SegregationConfig {
            rows: 4,
            cols: 4,
            empty: 100,
            strategy: RelocationStrategy::UniformRandom,
            rng_seed: Some(1),
            ..SegregationConfig::default()
        };
        let world = WorldState::new(config).expect("world");

        let mut renderer = AnsiRenderer::new(Vec::new());
        assert_eq!(renderer.name(), "ansi-terminal");
        renderer.draw(&world).expect("draw");

        let frame = String::from_utf8(renderer.into_inner()).expect("utf8 frame");
        assert!(frame.contains("Round 0"));
        assert!(frame.contains("Satisfied   0%"));
        assert!(frame.contains("Alg 1: Pick a random available site"));
    }
}
