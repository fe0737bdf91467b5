#![forbid(unsafe_code)]

//! Render kernel: cells, the region tree, border junctions and surfaces.

pub mod ansi;
pub mod ansi_surface;
pub mod cell;
pub mod junction;
pub mod region;
pub mod surface;
