#![forbid(unsafe_code)]

//! ANSI-emitting surface.
//!
//! [`AnsiSurface`] stages cell writes in a back buffer and emits only the
//! cells that actually changed when [`AnsiSurface::flush`] is called. It
//! tracks the terminal's current style and cursor so each flush writes a
//! minimal byte stream:
//!
//! - changed cells are visited in row-major order
//! - a cursor move is emitted only when the next cell is not where the
//!   cursor already is
//! - a style change is emitted as reset-then-apply only when the style
//!   differs from the previous cell
//! - continuation cells are never emitted as content
//!
//! Colors are written as given in 24-bit form, or omitted entirely when
//! [`SurfaceCaps::color`] is off. The flush can be wrapped in synchronized
//! output.
//!
//! ```
//! use regionkit_core::geometry::Size;
//! use regionkit_core::surface_caps::SurfaceCaps;
//! use regionkit_render::ansi_surface::AnsiSurface;
//! use regionkit_render::cell::Cell;
//! use regionkit_render::surface::Surface;
//!
//! let mut surface = AnsiSurface::new(Vec::new(), Size::new(4, 1), SurfaceCaps::basic());
//! surface.write_cell(0, 0, &Cell::from_char('A'));
//! surface.flush()?;
//! let bytes = surface.into_inner()?;
//! assert!(bytes.ends_with(b"A\x1b[0m"));
//! # Ok::<(), std::io::Error>(())
//! ```

use std::io::{self, BufWriter, Write};

use regionkit_core::geometry::Size;
use regionkit_core::surface_caps::SurfaceCaps;
use regionkit_core::text::char_width;
use regionkit_core::{debug, info_span};

use crate::ansi;
use crate::cell::{Cell, PackedRgba, StyleFlags};
use crate::surface::Surface;

/// Size of the internal write buffer (64KB).
const BUFFER_CAPACITY: usize = 64 * 1024;

/// The style the terminal is currently set to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellStyle {
    fg: PackedRgba,
    bg: PackedRgba,
    flags: StyleFlags,
}

impl CellStyle {
    fn from_cell(cell: &Cell) -> Self {
        Self {
            fg: cell.fg.color,
            bg: cell.bg.color,
            flags: cell.fg.flags | cell.bg.flags,
        }
    }
}

/// A [`Surface`] that renders to an ANSI terminal stream.
pub struct AnsiSurface<W: Write> {
    writer: BufWriter<W>,
    caps: SurfaceCaps,
    size: Size,
    /// Latest cell written to each position.
    staged: Vec<Cell>,
    /// What the terminal shows; `None` until first emitted.
    front: Vec<Option<Cell>>,
    /// Indices written since the last flush, deduplicated by `queued`.
    pending: Vec<usize>,
    queued: Vec<bool>,
    current_style: Option<CellStyle>,
    cursor: Option<(u16, u16)>,
}

impl<W: Write> AnsiSurface<W> {
    /// Create a surface covering `size` cells of the terminal.
    pub fn new(writer: W, size: Size, caps: SurfaceCaps) -> Self {
        let area = size.area();
        Self {
            writer: BufWriter::with_capacity(BUFFER_CAPACITY, writer),
            caps,
            size,
            staged: vec![Cell::default(); area],
            front: vec![None; area],
            pending: Vec::new(),
            queued: vec![false; area],
            current_style: None,
            cursor: None,
        }
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    #[inline]
    pub fn caps(&self) -> &SurfaceCaps {
        &self.caps
    }

    /// Number of positions written since the last flush.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// The most recently written cell at `(x, y)`.
    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.staged[i])
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.size.contains(x, y) {
            Some(y as usize * self.size.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Emit every changed cell and flush the writer.
    pub fn flush(&mut self) -> io::Result<()> {
        let span = info_span!("ansi_flush", pending = self.pending.len());
        let _guard = span.enter();

        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_unstable();
        for &i in &pending {
            self.queued[i] = false;
        }

        if self.caps.sync_output {
            ansi::sync_begin(&mut self.writer)?;
        }

        let width = self.size.width as usize;
        let mut emitted = 0usize;
        for &i in &pending {
            let cell = self.staged[i];
            if self.front[i] == Some(cell) {
                continue;
            }
            self.front[i] = Some(cell);
            if cell.is_continuation() {
                continue;
            }
            self.move_cursor_to((i % width) as u16, (i / width) as u16)?;
            self.emit_style(&cell)?;
            self.emit_glyph(cell.glyph)?;
            emitted += 1;
        }

        if emitted > 0 {
            ansi::sgr_reset(&mut self.writer)?;
            self.current_style = None;
        }
        if self.caps.sync_output {
            ansi::sync_end(&mut self.writer)?;
        }

        pending.clear();
        self.pending = pending;
        debug!(emitted, "surface flushed");
        self.writer.flush()
    }

    fn move_cursor_to(&mut self, x: u16, y: u16) -> io::Result<()> {
        if self.cursor == Some((x, y)) {
            return Ok(());
        }
        ansi::cup(&mut self.writer, y, x)?;
        self.cursor = Some((x, y));
        Ok(())
    }

    fn emit_style(&mut self, cell: &Cell) -> io::Result<()> {
        let style = CellStyle::from_cell(cell);
        if self.current_style == Some(style) {
            return Ok(());
        }

        // reset + apply
        ansi::sgr_reset(&mut self.writer)?;
        if self.caps.color {
            if !style.fg.is_default() {
                ansi::sgr_fg(&mut self.writer, style.fg)?;
            }
            if !style.bg.is_default() {
                ansi::sgr_bg(&mut self.writer, style.bg)?;
            }
        }
        ansi::sgr_flags(&mut self.writer, style.flags)?;

        self.current_style = Some(style);
        Ok(())
    }

    fn emit_glyph(&mut self, glyph: char) -> io::Result<()> {
        // Control and combining code points would desync the cursor.
        let glyph = if char_width(glyph) == 0 { ' ' } else { glyph };
        let mut buf = [0u8; 4];
        self.writer.write_all(glyph.encode_utf8(&mut buf).as_bytes())?;
        if let Some((x, y)) = self.cursor {
            self.cursor = Some((x.saturating_add(char_width(glyph) as u16), y));
        }
        Ok(())
    }

    /// Forget what the terminal shows, so the next flush repaints every
    /// staged cell.
    pub fn invalidate(&mut self) {
        self.front.fill(None);
        self.pending.clear();
        for (i, queued) in self.queued.iter_mut().enumerate() {
            *queued = true;
            self.pending.push(i);
        }
        self.current_style = None;
        self.cursor = None;
    }

    pub fn hide_cursor(&mut self) -> io::Result<()> {
        ansi::cursor_hide(&mut self.writer)?;
        self.writer.flush()
    }

    pub fn show_cursor(&mut self) -> io::Result<()> {
        ansi::cursor_show(&mut self.writer)?;
        self.writer.flush()
    }

    /// Get the inner writer, flushing buffered bytes first.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

impl<W: Write> Surface for AnsiSurface<W> {
    fn write_cell(&mut self, x: i32, y: i32, cell: &Cell) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        self.staged[i] = *cell;
        if !self.queued[i] {
            self.queued[i] = true;
            self.pending.push(i);
        }
    }
}

impl<W: Write> std::fmt::Debug for AnsiSurface<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsiSurface")
            .field("size", &self.size)
            .field("caps", &self.caps)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
