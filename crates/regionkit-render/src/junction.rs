#![forbid(unsafe_code)]

//! Border and junction synthesis.
//!
//! Every box-drawing glyph is picked from a 4-bit neighbor mask: which of
//! the four cardinal neighbors a cell connects to. Borders, separators and
//! arbitrary wiring diagrams all reduce to computing that mask per cell.
//!
//! # Mask layout
//!
//! ```text
//! bit 3: top   bit 2: right   bit 1: bottom   bit 0: left
//!
//! 0b0110 (right + bottom)  -> '┌'
//! 0b0101 (right + left)    -> '─'
//! 0b1111 (all four)        -> '┼'
//! ```
//!
//! Zero or one connected neighbor resolves to a blank: a lone stub is not
//! drawn.
//!
//! The synthesizer only needs a size query and a single-glyph write, so it
//! works on anything implementing [`GlyphTarget`]: regions, plain glyph
//! grids, or a caller's own canvas.

use regionkit_core::geometry::{Size, XY};

bitflags::bitflags! {
    /// Which cardinal neighbors a cell connects to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Junction: u8 {
        const TOP    = 0b1000;
        const RIGHT  = 0b0100;
        const BOTTOM = 0b0010;
        const LEFT   = 0b0001;
    }
}

/// Thin box-drawing glyphs indexed by [`Junction`] bits.
pub const THIN_GLYPHS: [char; 16] = [
    ' ', // 0000
    ' ', // 0001 left
    ' ', // 0010 bottom
    '┐', // 0011 bottom + left
    ' ', // 0100 right
    '─', // 0101 right + left
    '┌', // 0110 right + bottom
    '┬', // 0111 right + bottom + left
    ' ', // 1000 top
    '┘', // 1001 top + left
    '│', // 1010 top + bottom
    '┤', // 1011 top + bottom + left
    '└', // 1100 top + right
    '┴', // 1101 top + right + left
    '├', // 1110 top + right + bottom
    '┼', // 1111
];

/// Horizontal thin line glyph.
pub const HORIZONTAL: char = THIN_GLYPHS[0b0101];
/// Vertical thin line glyph.
pub const VERTICAL: char = THIN_GLYPHS[0b1010];

impl Junction {
    /// Build a mask from four neighbor flags.
    #[inline]
    pub fn from_neighbors(top: bool, right: bool, bottom: bool, left: bool) -> Self {
        let mut mask = Self::empty();
        mask.set(Self::TOP, top);
        mask.set(Self::RIGHT, right);
        mask.set(Self::BOTTOM, bottom);
        mask.set(Self::LEFT, left);
        mask
    }

    /// The thin glyph for this mask.
    #[inline]
    pub const fn glyph(self) -> char {
        THIN_GLYPHS[self.bits() as usize]
    }
}

/// Resolve four neighbor flags to a thin box-drawing glyph.
///
/// ```
/// use regionkit_render::junction::resolve_junction;
///
/// assert_eq!(resolve_junction(false, true, false, true), '─');
/// assert_eq!(resolve_junction(true, true, true, true), '┼');
/// assert_eq!(resolve_junction(true, false, false, false), ' ');
/// ```
#[inline]
pub fn resolve_junction(top: bool, right: bool, bottom: bool, left: bool) -> char {
    Junction::from_neighbors(top, right, bottom, left).glyph()
}

/// Anything that can report its size and take a single glyph.
///
/// Implementations ignore writes outside `0..width` x `0..height`.
pub trait GlyphTarget {
    fn size(&self) -> Size;
    fn set_glyph(&mut self, x: i32, y: i32, glyph: char);
}

impl<T: GlyphTarget + ?Sized> GlyphTarget for &mut T {
    #[inline]
    fn size(&self) -> Size {
        (**self).size()
    }

    #[inline]
    fn set_glyph(&mut self, x: i32, y: i32, glyph: char) {
        (**self).set_glyph(x, y, glyph);
    }
}

/// Draw a horizontal thin line of `length` cells starting at `(x, y)`.
///
/// A negative length draws nothing.
pub fn draw_horizontal_line<T: GlyphTarget + ?Sized>(target: &mut T, x: i32, y: i32, length: i32) {
    for dx in 0..length.max(0) {
        target.set_glyph(x.saturating_add(dx), y, HORIZONTAL);
    }
}

/// Draw a vertical thin line of `length` cells starting at `(x, y)`.
///
/// A negative length draws nothing.
pub fn draw_vertical_line<T: GlyphTarget + ?Sized>(target: &mut T, x: i32, y: i32, length: i32) {
    for dy in 0..length.max(0) {
        target.set_glyph(x, y.saturating_add(dy), VERTICAL);
    }
}

/// Draw a thin frame flush with the target's edges.
///
/// A target one cell wide or one cell tall has no distinct opposite edges
/// and is left untouched.
pub fn draw_thin_border<T: GlyphTarget + ?Sized>(target: &mut T) {
    let size = target.size();
    if size.width <= 1 || size.height <= 1 {
        return;
    }
    let (left, top) = (0, 0);
    let right = size.width as i32 - 1;
    let bottom = size.height as i32 - 1;

    target.set_glyph(left, top, (Junction::RIGHT | Junction::BOTTOM).glyph());
    target.set_glyph(right, top, (Junction::BOTTOM | Junction::LEFT).glyph());
    target.set_glyph(left, bottom, (Junction::TOP | Junction::RIGHT).glyph());
    target.set_glyph(right, bottom, (Junction::TOP | Junction::LEFT).glyph());

    let inner_width = size.width as i32 - 2;
    let inner_height = size.height as i32 - 2;
    draw_horizontal_line(target, left + 1, top, inner_width);
    draw_horizontal_line(target, left + 1, bottom, inner_width);
    draw_vertical_line(target, left, top + 1, inner_height);
    draw_vertical_line(target, right, top + 1, inner_height);
}

#[inline]
fn connected(connections: &[Vec<bool>], col: isize, row: isize) -> bool {
    if row < 0 || col < 0 {
        return false;
    }
    connections
        .get(row as usize)
        .and_then(|r| r.get(col as usize))
        .copied()
        .unwrap_or(false)
}

/// Resolve a boolean wiring grid into one glyph per cell.
///
/// Rows may have different lengths; a neighbor outside its row counts as
/// disconnected. The output has exactly the shape of the input.
///
/// ```
/// use regionkit_render::junction::resolve_junctions;
///
/// let wiring = vec![
///     vec![true, true, true],
///     vec![false, true, false],
/// ];
/// let glyphs = resolve_junctions(&wiring);
/// assert_eq!(glyphs[0], vec![' ', '┬', ' ']);
/// ```
pub fn resolve_junctions(connections: &[Vec<bool>]) -> Vec<Vec<char>> {
    connections
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let r = row as isize;
            (0..cells.len())
                .map(|col| {
                    let c = col as isize;
                    resolve_junction(
                        connected(connections, c, r - 1),
                        connected(connections, c + 1, r),
                        connected(connections, c, r + 1),
                        connected(connections, c - 1, r),
                    )
                })
                .collect()
        })
        .collect()
}

/// Draw a wiring grid onto a target with its top-left at `origin`.
///
/// Only connected cells are written, and only where they land inside the
/// target; unconnected cells leave the target's content alone.
pub fn draw_junctions<T: GlyphTarget + ?Sized>(
    target: &mut T,
    origin: XY,
    connections: &[Vec<bool>],
) {
    let size = target.size();
    let glyphs = resolve_junctions(connections);
    for (row, (wires, line)) in connections.iter().zip(&glyphs).enumerate() {
        let y = origin.y.saturating_add(row as i32);
        for (col, (&wired, &glyph)) in wires.iter().zip(line).enumerate() {
            let x = origin.x.saturating_add(col as i32);
            if wired && size.contains(x, y) {
                target.set_glyph(x, y, glyph);
            }
        }
    }
}

/// A plain glyph canvas.
///
/// Handy for previewing borders and wiring without a region tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphGrid {
    size: Size,
    rows: Vec<Vec<char>>,
}

impl GlyphGrid {
    /// Create a canvas filled with spaces.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            size: Size::new(width, height),
            rows: vec![vec![' '; width as usize]; height as usize],
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<char> {
        if self.size.contains(x, y) {
            Some(self.rows[y as usize][x as usize])
        } else {
            None
        }
    }

    /// Rows as strings, trailing spaces kept.
    pub fn lines(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.iter().collect()).collect()
    }
}

impl GlyphTarget for GlyphGrid {
    fn size(&self) -> Size {
        self.size
    }

    fn set_glyph(&mut self, x: i32, y: i32, glyph: char) {
        if self.size.contains(x, y) {
            self.rows[y as usize][x as usize] = glyph;
        }
    }
}
