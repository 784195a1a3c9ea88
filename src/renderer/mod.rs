//! Character-grid renderer
//!
//! Plots body positions onto a fixed rows x cols grid of glyphs. Arena `x`
//! drives the row and `y` the column, so the arena is drawn transposed.

use std::fmt;

use glam::Vec2;

/// Glyph drawn for a body
pub const BODY_GLYPH: char = 'o';
/// Glyph for an empty cell
pub const EMPTY_GLYPH: char = ' ';

/// A screen-sized buffer of characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharGrid {
    rows: usize,
    cols: usize,
    cells: Vec<char>,
}

impl CharGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![EMPTY_GLYPH; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn clear(&mut self) {
        self.cells.fill(EMPTY_GLYPH);
    }

    pub fn get(&self, row: usize, col: usize) -> Option<char> {
        (row < self.rows && col < self.cols).then(|| self.cells[row * self.cols + col])
    }

    /// Map an arena position to a cell, `None` if it falls off the grid
    pub fn cell_for(&self, pos: Vec2, arena_size: f32) -> Option<(usize, usize)> {
        let scale_rows = self.rows as f32 / arena_size;
        let scale_cols = self.cols as f32 / arena_size;
        let row = pos.x * scale_rows;
        let col = pos.y * scale_cols;
        if row < 0.0 || col < 0.0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        (row < self.rows && col < self.cols).then_some((row, col))
    }

    /// Clear, then draw one glyph per body. Returns how many landed on the grid.
    pub fn plot_bodies(&mut self, positions: impl IntoIterator<Item = Vec2>, arena_size: f32) -> usize {
        self.clear();
        let mut drawn = 0;
        for pos in positions {
            if let Some((row, col)) = self.cell_for(pos, arena_size) {
                self.cells[row * self.cols + col] = BODY_GLYPH;
                drawn += 1;
            }
        }
        drawn
    }
}

impl CharGrid {
    /// One string per row, top to bottom
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.cells
            .chunks(self.cols.max(1))
            .map(|row| row.iter().collect())
    }
}

impl fmt::Display for CharGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(&line)?;
        }
        Ok(())
    }
}
