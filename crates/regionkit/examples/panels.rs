//! Draw two bordered panels and a status line to the terminal.
//!
//! Run with: cargo run -p regionkit --example panels
//! JSON logs: RUST_LOG=debug cargo run -p regionkit --example panels --features tracing-json

use regionkit::prelude::*;

fn main() -> regionkit::Result<()> {
    #[cfg(feature = "tracing-json")]
    regionkit::init_json_subscriber();

    let size = Size::new(40, 8);
    let mut tree = RegionTree::new();
    let root = tree.new_region(size, Cell::default())?;

    let accent = Attribute::color(PackedRgba::rgb(80, 160, 255)).with_flags(StyleFlags::BOLD);
    for (i, title) in ["left", "right"].into_iter().enumerate() {
        let panel = tree.new_child(root, Size::new(20, 7), Cell::default())?;
        if let Some(mut region) = tree.region_mut(panel) {
            region.set_position(XY::new(i as i32 * 20, 0));
            region.draw_thin_border();
            region.set_text_center(0, title, TextStyle::new().fg(accent));
        }
    }

    let status = tree.new_child(root, Size::new(40, 1), Cell::default())?;
    if let Some(mut region) = tree.region_mut(status) {
        region.set_position(XY::new(0, 7));
        region.set_text(1, 0, "ready", TextStyle::default());
    }

    let stdout = std::io::stdout();
    let mut surface = AnsiSurface::new(stdout.lock(), size, SurfaceCaps::detect());
    tree.draw(root, &mut surface, DrawOptions::default());
    surface.flush()?;
    println!();
    Ok(())
}
