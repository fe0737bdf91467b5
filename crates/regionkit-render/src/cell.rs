#![forbid(unsafe_code)]

//! Cell types.
//!
//! A [`Cell`] is one glyph plus a foreground and a background [`Attribute`].
//! Cells are plain values: copied into region buffers, copied out to
//! surfaces. The composition core never interprets attributes; only the
//! ANSI surface turns them into escape sequences.
//!
//! # Layout
//!
//! ```text
//! Cell {
//!     glyph: char,     // 4 bytes
//!     fg: Attribute,   // color (4 bytes) + style flags (1 byte)
//!     bg: Attribute,
//! }
//! ```

/// A compact RGBA color.
///
/// - **Size:** 4 bytes.
/// - **Layout:** `0xRRGGBBAA` (R in bits 31..24, A in bits 7..0).
///
/// Alpha 0 means "terminal default": the surface emits the default color
/// sequence instead of an explicit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(transparent)]
pub struct PackedRgba(pub u32);

impl PackedRgba {
    /// Terminal default color (alpha = 0).
    pub const DEFAULT: Self = Self(0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Create an opaque RGB color (alpha = 255).
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Create an RGBA color with explicit alpha.
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | (a as u32))
    }

    /// Red channel.
    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Green channel.
    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Blue channel.
    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Alpha channel.
    #[inline]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    /// Check if this is the terminal default color.
    #[inline]
    pub const fn is_default(self) -> bool {
        self.a() == 0
    }
}

bitflags::bitflags! {
    /// 8-bit cell style flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u8 {
        /// Bold / increased intensity.
        const BOLD          = 0b0000_0001;
        /// Dim / decreased intensity.
        const DIM           = 0b0000_0010;
        /// Italic text.
        const ITALIC        = 0b0000_0100;
        /// Underlined text.
        const UNDERLINE     = 0b0000_1000;
        /// Blinking text.
        const BLINK         = 0b0001_0000;
        /// Reverse video (swap fg/bg).
        const REVERSE       = 0b0010_0000;
        /// Strikethrough text.
        const STRIKETHROUGH = 0b0100_0000;
        /// Hidden / invisible text.
        const HIDDEN        = 0b1000_0000;
    }
}

/// A foreground or background attribute: a color plus style flags.
///
/// Passed through unmodified from region cells to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attribute {
    pub color: PackedRgba,
    pub flags: StyleFlags,
}

impl Attribute {
    /// Terminal default color, no style flags.
    pub const DEFAULT: Self = Self {
        color: PackedRgba::DEFAULT,
        flags: StyleFlags::empty(),
    };

    #[inline]
    pub const fn new(color: PackedRgba, flags: StyleFlags) -> Self {
        Self { color, flags }
    }

    /// An attribute with the given color and no style flags.
    #[inline]
    pub const fn color(color: PackedRgba) -> Self {
        Self::new(color, StyleFlags::empty())
    }

    /// Return a copy with additional style flags.
    #[inline]
    pub fn with_flags(self, flags: StyleFlags) -> Self {
        Self {
            color: self.color,
            flags: self.flags | flags,
        }
    }
}

impl From<PackedRgba> for Attribute {
    fn from(color: PackedRgba) -> Self {
        Self::color(color)
    }
}

/// A single terminal cell.
///
/// # Default
///
/// The default cell is a space with default foreground and background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// The code point shown in this cell.
    pub glyph: char,
    /// Foreground attribute.
    pub fg: Attribute,
    /// Background attribute.
    pub bg: Attribute,
}

impl Cell {
    /// Continuation marker for the trailing column of a wide glyph.
    ///
    /// Uses U+0000, which never appears as visible content. Surfaces record
    /// it but do not emit it.
    pub const CONTINUATION: Self = Self {
        glyph: '\0',
        fg: Attribute::DEFAULT,
        bg: Attribute::DEFAULT,
    };

    #[inline]
    pub const fn new(glyph: char, fg: Attribute, bg: Attribute) -> Self {
        Self { glyph, fg, bg }
    }

    /// Create a cell from a single character with default attributes.
    #[inline]
    pub const fn from_char(glyph: char) -> Self {
        Self::new(glyph, Attribute::DEFAULT, Attribute::DEFAULT)
    }

    /// Check if this is a continuation cell.
    #[inline]
    pub const fn is_continuation(&self) -> bool {
        self.glyph == '\0'
    }

    /// Set the glyph, preserving attributes.
    #[inline]
    pub const fn with_glyph(mut self, glyph: char) -> Self {
        self.glyph = glyph;
        self
    }

    /// Set the foreground attribute.
    #[inline]
    pub const fn with_fg(mut self, fg: Attribute) -> Self {
        self.fg = fg;
        self
    }

    /// Set the background attribute.
    #[inline]
    pub const fn with_bg(mut self, bg: Attribute) -> Self {
        self.bg = bg;
        self
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::from_char(' ')
    }
}
