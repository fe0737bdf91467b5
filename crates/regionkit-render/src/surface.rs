#![forbid(unsafe_code)]

//! Terminal surfaces.
//!
//! A [`Surface`] is the sink the region tree draws into. The tree only ever
//! asks for one thing: put this cell at this absolute coordinate.
//! Coordinates are signed because regions may be positioned off-screen;
//! surfaces drop writes that fall outside their own grid.
//!
//! Two in-memory surfaces live here:
//!
//! - [`GridSurface`]: a headless screen, useful for snapshot-style asserts.
//! - [`RecordingSurface`]: an ordered log of every write, useful for
//!   checking paint order and write counts.
//!
//! The ANSI-emitting surface lives in [`crate::ansi_surface`].

use crate::cell::Cell;
use regionkit_core::geometry::Size;

/// The single primitive the composition core needs from a terminal.
pub trait Surface {
    /// Write one styled cell at an absolute coordinate.
    fn write_cell(&mut self, x: i32, y: i32, cell: &Cell);
}

impl<S: Surface + ?Sized> Surface for &mut S {
    #[inline]
    fn write_cell(&mut self, x: i32, y: i32, cell: &Cell) {
        (**self).write_cell(x, y, cell);
    }
}

/// A headless, in-memory screen.
///
/// Out-of-bounds writes are ignored but still counted in
/// [`GridSurface::writes`], so tests can tell "clipped by the tree" apart
/// from "clipped by the screen".
///
/// ```
/// use regionkit_render::cell::Cell;
/// use regionkit_render::surface::{GridSurface, Surface};
///
/// let mut screen = GridSurface::new(4, 1);
/// screen.write_cell(1, 0, &Cell::from_char('x'));
/// assert_eq!(screen.row_text(0).as_deref(), Some(" x"));
/// ```
#[derive(Debug, Clone)]
pub struct GridSurface {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    writes: usize,
}

impl GridSurface {
    /// Create a screen filled with default cells.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width as usize * height as usize],
            writes: 0,
        }
    }

    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.size().contains(x, y) {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Get the cell at `(x, y)`, or `None` outside the screen.
    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of `write_cell` calls received, including dropped ones.
    #[inline]
    pub const fn writes(&self) -> usize {
        self.writes
    }

    /// Reset the write counter without touching the contents.
    pub fn reset_writes(&mut self) {
        self.writes = 0;
    }

    /// Reset every cell to the default and zero the write counter.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
        self.writes = 0;
    }

    /// Text of a row with trailing spaces trimmed.
    ///
    /// Continuation cells are skipped so wide glyphs read naturally.
    pub fn row_text(&self, y: i32) -> Option<String> {
        if y < 0 || y >= self.height as i32 {
            return None;
        }
        let start = y as usize * self.width as usize;
        let row = &self.cells[start..start + self.width as usize];
        let text: String = row
            .iter()
            .filter(|c| !c.is_continuation())
            .map(|c| c.glyph)
            .collect();
        Some(text.trim_end().to_string())
    }

    /// Assert that a row reads exactly `expected` (trailing spaces ignored).
    ///
    /// # Panics
    ///
    /// Panics with a readable message on mismatch. Test helper.
    #[track_caller]
    pub fn assert_row(&self, y: i32, expected: &str) {
        let actual = self.row_text(y).unwrap_or_default();
        assert_eq!(
            actual,
            expected.trim_end(),
            "row {y} mismatch\n  expected: {expected:?}\n  actual:   {actual:?}"
        );
    }

    /// Assert the whole screen, one string per row.
    #[track_caller]
    pub fn assert_matches(&self, expected: &[&str]) {
        assert_eq!(
            expected.len(),
            self.height as usize,
            "expected {} rows, screen has {}",
            expected.len(),
            self.height
        );
        for (y, line) in expected.iter().enumerate() {
            self.assert_row(y as i32, line);
        }
    }
}

impl Surface for GridSurface {
    fn write_cell(&mut self, x: i32, y: i32, cell: &Cell) {
        self.writes += 1;
        if let Some(i) = self.index(x, y) {
            self.cells[i] = *cell;
        }
    }
}

/// A single recorded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellWrite {
    pub x: i32,
    pub y: i32,
    pub cell: Cell,
}

/// A surface that records every write in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    writes: Vec<CellWrite>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// All writes in the order they were received.
    pub fn writes(&self) -> &[CellWrite] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Number of writes that targeted `(x, y)`.
    pub fn count_at(&self, x: i32, y: i32) -> usize {
        self.writes.iter().filter(|w| w.x == x && w.y == y).count()
    }

    /// The most recent cell written at `(x, y)`.
    pub fn last_at(&self, x: i32, y: i32) -> Option<&Cell> {
        self.writes
            .iter()
            .rev()
            .find(|w| w.x == x && w.y == y)
            .map(|w| &w.cell)
    }

    /// Drain the log.
    pub fn take(&mut self) -> Vec<CellWrite> {
        std::mem::take(&mut self.writes)
    }
}

impl Surface for RecordingSurface {
    fn write_cell(&mut self, x: i32, y: i32, cell: &Cell) {
        self.writes.push(CellWrite { x, y, cell: *cell });
    }
}
