#![forbid(unsafe_code)]

//! regionkit public facade.
//!
//! Re-exports the region tree, cells, surfaces and border helpers from the
//! kernel crates and offers a prelude for day-to-day use.
//!
//! ```
//! use regionkit::prelude::*;
//!
//! fn main() -> regionkit::Result<()> {
//!     let mut tree = RegionTree::new();
//!     let root = tree.new_region(Size::new(8, 3), Cell::default())?;
//!     if let Some(mut region) = tree.region_mut(root) {
//!         region.draw_thin_border();
//!         region.set_text_center(1, "hi", TextStyle::default());
//!     }
//!
//!     let mut screen = GridSurface::new(8, 3);
//!     tree.draw(root, &mut screen, DrawOptions::default());
//!     screen.assert_matches(&["┌──────┐", "│  hi  │", "└──────┘"]);
//!     Ok(())
//! }
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use regionkit_core::geometry::{Rect, Size, XY};
pub use regionkit_core::surface_caps::SurfaceCaps;
pub use regionkit_core::text::{char_width, display_width};

#[cfg(feature = "tracing-json")]
pub use regionkit_core::logging::init_json_subscriber;

// --- Render re-exports -----------------------------------------------------

pub use regionkit_render::ansi_surface::AnsiSurface;
pub use regionkit_render::cell::{Attribute, Cell, PackedRgba, StyleFlags};
pub use regionkit_render::junction::{
    GlyphGrid, GlyphTarget, Junction, draw_horizontal_line, draw_junctions, draw_thin_border,
    draw_vertical_line, resolve_junction, resolve_junctions,
};
pub use regionkit_render::region::{
    DrawOptions, DrawStats, Region, RegionError, RegionId, RegionMut, RegionTree, TextStyle,
};
pub use regionkit_render::surface::{CellWrite, GridSurface, RecordingSurface, Surface};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for regionkit hosts.
#[derive(Debug)]
pub enum Error {
    /// I/O failure while flushing a surface.
    Io(std::io::Error),
    /// Region construction failed.
    Region(RegionError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Region(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Region(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<RegionError> for Error {
    fn from(err: RegionError) -> Self {
        Self::Region(err)
    }
}

/// Standard result type for regionkit hosts.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        AnsiSurface, Attribute, Cell, DrawOptions, Error, GlyphTarget, GridSurface, PackedRgba,
        RegionId, RegionTree, Result, Size, StyleFlags, Surface, SurfaceCaps, TextStyle, XY,
    };
}
