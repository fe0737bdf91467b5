#![forbid(unsafe_code)]

//! ANSI escape sequence generation.
//!
//! Pure byte writers for the handful of VT sequences the ANSI surface
//! needs. No state is tracked here; [`crate::ansi_surface::AnsiSurface`]
//! decides when each sequence is required.
//!
//! | Sequence | Meaning |
//! |----------|---------|
//! | `ESC [ n m` | SGR (style and color) |
//! | `ESC [ row ; col H` | CUP, 1-indexed |
//! | `ESC [ ? 25 l/h` | cursor hide/show |
//! | `ESC [ ? 2026 h/l` | synchronized output |
//!
//! Colors are opaque: an RGB value is written as 24-bit SGR exactly as
//! given, and the default color (alpha 0) as SGR 39/49.

use std::io::{self, Write};

use crate::cell::{PackedRgba, StyleFlags};

// --- SGR ---

/// SGR reset: `CSI 0 m`
pub const SGR_RESET: &[u8] = b"\x1b[0m";

#[inline]
pub fn sgr_reset<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SGR_RESET)
}

/// Style flags and their SGR "on" codes, in emission order.
pub const FLAG_TABLE: [(StyleFlags, u8); 8] = [
    (StyleFlags::BOLD, 1),
    (StyleFlags::DIM, 2),
    (StyleFlags::ITALIC, 3),
    (StyleFlags::UNDERLINE, 4),
    (StyleFlags::BLINK, 5),
    (StyleFlags::REVERSE, 7),
    (StyleFlags::HIDDEN, 8),
    (StyleFlags::STRIKETHROUGH, 9),
];

/// Write one SGR sequence enabling every set flag: `CSI n ; n ; ... m`.
///
/// Writes nothing for empty flags. Does not reset first.
pub fn sgr_flags<W: Write>(w: &mut W, flags: StyleFlags) -> io::Result<()> {
    if flags.is_empty() {
        return Ok(());
    }
    w.write_all(b"\x1b[")?;
    let mut first = true;
    for (flag, code) in FLAG_TABLE {
        if flags.contains(flag) {
            if !first {
                w.write_all(b";")?;
            }
            write!(w, "{code}")?;
            first = false;
        }
    }
    w.write_all(b"m")
}

/// True color foreground: `CSI 38;2;r;g;b m`
pub fn sgr_fg_rgb<W: Write>(w: &mut W, r: u8, g: u8, b: u8) -> io::Result<()> {
    write!(w, "\x1b[38;2;{r};{g};{b}m")
}

/// True color background: `CSI 48;2;r;g;b m`
pub fn sgr_bg_rgb<W: Write>(w: &mut W, r: u8, g: u8, b: u8) -> io::Result<()> {
    write!(w, "\x1b[48;2;{r};{g};{b}m")
}

/// Default foreground: `CSI 39 m`
pub fn sgr_fg_default<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(b"\x1b[39m")
}

/// Default background: `CSI 49 m`
pub fn sgr_bg_default<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(b"\x1b[49m")
}

/// Write a foreground color: `CSI 39 m` for the default, else true color.
pub fn sgr_fg<W: Write>(w: &mut W, color: PackedRgba) -> io::Result<()> {
    if color.is_default() {
        return sgr_fg_default(w);
    }
    sgr_fg_rgb(w, color.r(), color.g(), color.b())
}

/// Write a background color: `CSI 49 m` for the default, else true color.
pub fn sgr_bg<W: Write>(w: &mut W, color: PackedRgba) -> io::Result<()> {
    if color.is_default() {
        return sgr_bg_default(w);
    }
    sgr_bg_rgb(w, color.r(), color.g(), color.b())
}

// --- Cursor ---

/// CUP: `CSI row ; col H`. Takes 0-indexed input.
pub fn cup<W: Write>(w: &mut W, row: u16, col: u16) -> io::Result<()> {
    write!(
        w,
        "\x1b[{};{}H",
        row.saturating_add(1),
        col.saturating_add(1)
    )
}

pub const CURSOR_HIDE: &[u8] = b"\x1b[?25l";
pub const CURSOR_SHOW: &[u8] = b"\x1b[?25h";

#[inline]
pub fn cursor_hide<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(CURSOR_HIDE)
}

#[inline]
pub fn cursor_show<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(CURSOR_SHOW)
}

// --- Synchronized output (DEC 2026) ---

pub const SYNC_BEGIN: &[u8] = b"\x1b[?2026h";
pub const SYNC_END: &[u8] = b"\x1b[?2026l";

#[inline]
pub fn sync_begin<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SYNC_BEGIN)
}

#[inline]
pub fn sync_end<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SYNC_END)
}
