#![forbid(unsafe_code)]

//! Core: coordinates, display width, logging, and surface capabilities.

pub mod geometry;
pub mod logging;
pub mod surface_caps;
pub mod text;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, info_span, trace};
