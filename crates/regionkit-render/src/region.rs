#![forbid(unsafe_code)]

//! The region tree.
//!
//! A region is a fixed-size rectangle of [`Cell`]s positioned relative to
//! its parent. Regions nest: children paint over their parent, later
//! siblings paint over earlier ones, and drawing the root composes the whole
//! tree onto a [`Surface`].
//!
//! # Ownership
//!
//! All regions live in one [`RegionTree`] arena and are addressed by
//! generational [`RegionId`] handles. A parent owns its children through
//! its ordered child list; a child's parent link is a plain handle used
//! only to mark the parent dirty and to detach. Removing a region frees its
//! whole subtree, and every freed handle goes stale (it never aliases a
//! region created later).
//!
//! # Dirty tracking
//!
//! Every mutation sets the region's dirty flag. Position and visibility
//! changes also dirty the parent, since the parent's painted area is what
//! changed from its own parent's point of view. Drawing writes only dirty
//! regions, forces every child of a dirty region to repaint, and clears
//! the flags on the way out, so an idle tree produces no surface writes.
//!
//! # Invariants
//!
//! 1. `cells.len() == width * height`, row-major, and the shape never changes
//! 2. A region id appears in at most one child list
//! 3. `parent(child) == Some(p)` iff `child` is in `children(p)`
//! 4. Out-of-bounds cell access is a silent no-op and never dirties
//!
//! # Example
//!
//! ```
//! use regionkit_core::geometry::{Size, XY};
//! use regionkit_render::cell::Cell;
//! use regionkit_render::region::{DrawOptions, RegionTree, TextStyle};
//! use regionkit_render::surface::GridSurface;
//!
//! let mut tree = RegionTree::new();
//! let root = tree.new_region(Size::new(12, 3), Cell::default())?;
//! let label = tree.new_child(root, Size::new(5, 1), Cell::default())?;
//! if let Some(mut label) = tree.region_mut(label) {
//!     label.set_text(0, 0, "hello", TextStyle::default());
//!     label.set_position(XY::new(2, 1));
//! }
//!
//! let mut screen = GridSurface::new(12, 3);
//! tree.draw(root, &mut screen, DrawOptions::default());
//! screen.assert_matches(&["", "  hello", ""]);
//! # Ok::<(), regionkit_render::region::RegionError>(())
//! ```

use core::fmt;

use regionkit_core::geometry::{Rect, Size, XY};
use regionkit_core::text::char_width;
use regionkit_core::{debug, debug_span, trace};
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::cell::{Attribute, Cell};
use crate::junction::{self, GlyphTarget};
use crate::surface::Surface;

slotmap::new_key_type! {
    /// Handle to a region in a [`RegionTree`].
    pub struct RegionId;
}

/// Errors from region construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionError {
    /// Width or height was zero.
    ZeroSize { width: u16, height: u16 },
    /// The handle does not refer to a live region.
    UnknownRegion(RegionId),
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSize { width, height } => {
                write!(f, "region size must be positive, got {width}x{height}")
            }
            Self::UnknownRegion(id) => write!(f, "unknown region: {id:?}"),
        }
    }
}

impl std::error::Error for RegionError {}

/// Where and how to draw a region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawOptions {
    /// Absolute origin the region's position is relative to.
    ///
    /// Default: `(0, 0)`.
    pub origin: XY,
    /// Clip window anchored at `origin`.
    ///
    /// Default: `None`, drawing unclipped.
    pub clip: Option<Size>,
}

impl DrawOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            origin: XY::ORIGIN,
            clip: None,
        }
    }

    #[must_use]
    pub const fn with_origin(mut self, origin: XY) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub const fn with_clip(mut self, clip: Size) -> Self {
        self.clip = Some(clip);
        self
    }
}

/// Counters from one [`RegionTree::draw`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Visible regions walked.
    pub regions_visited: usize,
    /// Regions that were dirty and repainted.
    pub regions_painted: usize,
    /// Calls made to [`Surface::write_cell`].
    pub cells_written: usize,
}

/// Optional attributes for text writes.
///
/// A `None` field keeps the attribute already in each target cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStyle {
    pub fg: Option<Attribute>,
    pub bg: Option<Attribute>,
}

impl TextStyle {
    #[must_use]
    pub const fn new() -> Self {
        Self { fg: None, bg: None }
    }

    #[must_use]
    pub const fn fg(mut self, fg: Attribute) -> Self {
        self.fg = Some(fg);
        self
    }

    #[must_use]
    pub const fn bg(mut self, bg: Attribute) -> Self {
        self.bg = Some(bg);
        self
    }

    #[inline]
    fn apply(self, cell: Cell, glyph: char) -> Cell {
        Cell {
            glyph,
            fg: self.fg.unwrap_or(cell.fg),
            bg: self.bg.unwrap_or(cell.bg),
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    size: Size,
    cells: Vec<Cell>,
    children: SmallVec<[RegionId; 4]>,
    parent: Option<RegionId>,
    position: XY,
    hidden: bool,
    dirty: bool,
}

impl Node {
    fn new(size: Size, fill: Cell, parent: Option<RegionId>) -> Result<Self, RegionError> {
        if size.is_empty() {
            return Err(RegionError::ZeroSize {
                width: size.width,
                height: size.height,
            });
        }
        Ok(Self {
            size,
            cells: vec![fill; size.area()],
            children: SmallVec::new(),
            parent,
            position: XY::ORIGIN,
            hidden: false,
            dirty: true,
        })
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.size.contains(x, y) {
            Some(y as usize * self.size.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Blank wide-glyph pieces that a write to columns `x..x + width` of row
    /// `y` would split: the head of a glyph whose continuation sits at `x`,
    /// and continuations trailing past the span. Attributes are kept.
    fn clear_wide_overlap(&mut self, x: i32, y: i32, width: i32) {
        let mut cleared = false;
        if self.index(x, y).is_some_and(|i| self.cells[i].is_continuation()) {
            let mut head_x = x - 1;
            while let Some(i) = self.index(head_x, y) {
                let tail = self.cells[i].is_continuation();
                self.cells[i].glyph = ' ';
                cleared = true;
                if !tail {
                    break;
                }
                head_x -= 1;
            }
        }
        let mut tail_x = x.saturating_add(width);
        while let Some(i) = self.index(tail_x, y) {
            if !self.cells[i].is_continuation() {
                break;
            }
            self.cells[i].glyph = ' ';
            cleared = true;
            tail_x += 1;
        }
        if cleared {
            self.dirty = true;
        }
    }
}

/// Arena owning every region.
#[derive(Debug, Clone, Default)]
pub struct RegionTree {
    nodes: SlotMap<RegionId, Node>,
}

impl RegionTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with room for `capacity` regions.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(capacity),
        }
    }

    /// Number of live regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check whether a handle refers to a live region.
    #[must_use]
    pub fn contains(&self, id: RegionId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Create a parentless region filled with `fill`.
    ///
    /// The region starts dirty so the first draw paints it.
    pub fn new_region(&mut self, size: Size, fill: Cell) -> Result<RegionId, RegionError> {
        let node = Node::new(size, fill, None)?;
        let id = self.nodes.insert(node);
        trace!(region = ?id, width = size.width, height = size.height, "region created");
        Ok(id)
    }

    /// Create a region owned by `parent`, painted above its existing
    /// children. Marks the parent dirty.
    pub fn new_child(
        &mut self,
        parent: RegionId,
        size: Size,
        fill: Cell,
    ) -> Result<RegionId, RegionError> {
        if !self.nodes.contains_key(parent) {
            return Err(RegionError::UnknownRegion(parent));
        }
        let node = Node::new(size, fill, Some(parent))?;
        let id = self.nodes.insert(node);
        let parent_node = &mut self.nodes[parent];
        parent_node.children.push(id);
        parent_node.dirty = true;
        trace!(region = ?id, parent = ?parent, "child region created");
        Ok(id)
    }

    /// Detach `target` from `parent` and free its subtree.
    ///
    /// Returns `false`, changing nothing, if `target` is not one of
    /// `parent`'s children. On success the parent is marked dirty so the
    /// area the child covered gets repainted.
    pub fn remove_child(&mut self, parent: RegionId, target: RegionId) -> bool {
        let Some(parent_node) = self.nodes.get_mut(parent) else {
            debug!(parent = ?parent, "remove_child on unknown parent");
            return false;
        };
        let Some(index) = parent_node.children.iter().position(|&c| c == target) else {
            debug!(parent = ?parent, target = ?target, "remove_child: not a child");
            return false;
        };
        parent_node.children.remove(index);
        parent_node.dirty = true;
        let freed = self.free_subtree(target);
        trace!(parent = ?parent, target = ?target, freed, "child region removed");
        true
    }

    /// Detach a region from its parent.
    ///
    /// A root has nothing to detach from; closing it is a no-op that
    /// returns `false`.
    pub fn close(&mut self, id: RegionId) -> bool {
        match self.parent(id) {
            Some(parent) => self.remove_child(parent, id),
            None => false,
        }
    }

    fn free_subtree(&mut self, root: RegionId) -> usize {
        let mut freed = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(id) {
                stack.extend(node.children);
                freed += 1;
            }
        }
        freed
    }

    /// Read-only view of a region.
    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<Region<'_>> {
        self.nodes.get(id).map(|node| Region { id, node })
    }

    /// Mutable view of a region.
    #[must_use]
    pub fn region_mut(&mut self, id: RegionId) -> Option<RegionMut<'_>> {
        if self.nodes.contains_key(id) {
            Some(RegionMut { tree: self, id })
        } else {
            None
        }
    }

    /// Children of `id` in paint order (empty for unknown ids).
    #[must_use]
    pub fn children(&self, id: RegionId) -> &[RegionId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Parent of `id`, `None` for roots and unknown ids.
    #[must_use]
    pub fn parent(&self, id: RegionId) -> Option<RegionId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Compose `id` and its visible subtree onto `surface`.
    ///
    /// The region lands at `options.origin + position`. Only dirty regions
    /// write cells; children of a dirty region are forced to repaint so
    /// they end up above their parent again. Each child is clipped to its
    /// immediate parent's rectangle. The clip is not intersected with
    /// further ancestors, so a grandchild can show outside a grandparent
    /// that is smaller than the child's own parent.
    ///
    /// Hidden regions are skipped together with their subtree and keep
    /// their dirty flag. Unknown ids draw nothing.
    pub fn draw<S: Surface + ?Sized>(
        &mut self,
        id: RegionId,
        surface: &mut S,
        options: DrawOptions,
    ) -> DrawStats {
        let span = debug_span!("region_draw", region = ?id);
        let _guard = span.enter();

        let mut stats = DrawStats::default();
        self.draw_node(id, surface, options.origin, options.clip, false, &mut stats);
        debug!(
            visited = stats.regions_visited,
            painted = stats.regions_painted,
            written = stats.cells_written,
            "region tree drawn"
        );
        stats
    }

    fn draw_node<S: Surface + ?Sized>(
        &mut self,
        id: RegionId,
        surface: &mut S,
        origin: XY,
        clip: Option<Size>,
        force: bool,
        stats: &mut DrawStats,
    ) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if force {
            node.dirty = true;
        }
        if node.hidden {
            return;
        }
        stats.regions_visited += 1;

        let start = origin + node.position;
        let window = clip.map(|size| Rect::new(origin, size));

        if node.dirty {
            stats.regions_painted += 1;
            let width = node.size.width as usize;
            let mut written = 0;
            for (i, cell) in node.cells.iter().enumerate() {
                let x = start.x.saturating_add((i % width) as i32);
                let y = start.y.saturating_add((i / width) as i32);
                if window.is_some_and(|w| !w.contains(x, y)) {
                    continue;
                }
                surface.write_cell(x, y, cell);
                written += 1;
            }
            stats.cells_written += written;
            trace!(region = ?id, written, "region repainted");
        }

        let dirty = node.dirty;
        let size = node.size;
        // Drawing never changes structure, so the list can be lent out
        // for the recursion and put back afterwards.
        let children = core::mem::take(&mut node.children);
        for &child in &children {
            self.draw_node(child, surface, start, Some(size), dirty, stats);
        }

        let node = &mut self.nodes[id];
        node.children = children;
        node.dirty = false;
    }
}

/// Read-only view of one region.
#[derive(Debug, Clone, Copy)]
pub struct Region<'a> {
    id: RegionId,
    node: &'a Node,
}

impl<'a> Region<'a> {
    #[inline]
    pub fn id(&self) -> RegionId {
        self.id
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.node.size
    }

    /// Offset from the parent's origin.
    #[inline]
    pub fn position(&self) -> XY {
        self.node.position
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.node.hidden
    }

    /// Whether the region changed since it was last drawn.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.node.dirty
    }

    #[inline]
    pub fn parent(&self) -> Option<RegionId> {
        self.node.parent
    }

    /// Children in paint order.
    #[inline]
    pub fn children(&self) -> &'a [RegionId] {
        self.node.children.as_slice()
    }

    /// Check if a local coordinate lies outside the region.
    #[inline]
    pub fn is_out_of_bound(&self, x: i32, y: i32) -> bool {
        !self.node.size.contains(x, y)
    }

    /// The cell at a local coordinate, `None` outside the region.
    #[inline]
    pub fn cell(&self, x: i32, y: i32) -> Option<&'a Cell> {
        self.node.index(x, y).map(|i| &self.node.cells[i])
    }

    /// All cells, row-major.
    #[inline]
    pub fn cells(&self) -> &'a [Cell] {
        &self.node.cells
    }

    /// One row of cells, `None` outside the region.
    pub fn row(&self, y: i32) -> Option<&'a [Cell]> {
        if y < 0 || y >= self.node.size.height as i32 {
            return None;
        }
        let width = self.node.size.width as usize;
        let start = y as usize * width;
        Some(&self.node.cells[start..start + width])
    }

    /// Glyphs of a row as a string, continuation cells skipped.
    pub fn row_text(&self, y: i32) -> Option<String> {
        self.row(y).map(|cells| {
            cells
                .iter()
                .filter(|c| !c.is_continuation())
                .map(|c| c.glyph)
                .collect()
        })
    }
}

/// Mutable view of one region.
///
/// Obtained from [`RegionTree::region_mut`]. Every write that lands inside
/// the region marks it dirty; writes outside are ignored.
#[derive(Debug)]
pub struct RegionMut<'a> {
    tree: &'a mut RegionTree,
    id: RegionId,
}

impl RegionMut<'_> {
    // `id` is live for as long as this view borrows the tree.
    #[inline]
    fn node(&self) -> &Node {
        &self.tree.nodes[self.id]
    }

    #[inline]
    fn node_mut(&mut self) -> &mut Node {
        &mut self.tree.nodes[self.id]
    }

    #[inline]
    fn mark_parent_dirty(&mut self) {
        let Some(parent) = self.node().parent else {
            return;
        };
        if let Some(parent) = self.tree.nodes.get_mut(parent) {
            parent.dirty = true;
        }
    }

    #[inline]
    fn update(&mut self, x: i32, y: i32, f: impl FnOnce(&mut Cell)) -> bool {
        let node = self.node_mut();
        match node.index(x, y) {
            Some(i) => {
                f(&mut node.cells[i]);
                node.dirty = true;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Reborrow as a read-only view.
    #[inline]
    pub fn as_region(&self) -> Region<'_> {
        Region {
            id: self.id,
            node: self.node(),
        }
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.node().size
    }

    #[inline]
    pub fn position(&self) -> XY {
        self.node().position
    }

    #[inline]
    pub fn is_out_of_bound(&self, x: i32, y: i32) -> bool {
        !self.node().size.contains(x, y)
    }

    /// Replace the cell at `(x, y)`.
    pub fn set_cell(&mut self, x: i32, y: i32, cell: Cell) {
        self.update(x, y, |c| *c = cell);
    }

    /// Replace only the glyph at `(x, y)`.
    pub fn set_glyph(&mut self, x: i32, y: i32, glyph: char) {
        self.update(x, y, |c| c.glyph = glyph);
    }

    /// Replace only the foreground attribute at `(x, y)`.
    pub fn set_foreground(&mut self, x: i32, y: i32, fg: Attribute) {
        self.update(x, y, |c| c.fg = fg);
    }

    /// Replace only the background attribute at `(x, y)`.
    pub fn set_background(&mut self, x: i32, y: i32, bg: Attribute) {
        self.update(x, y, |c| c.bg = bg);
    }

    /// Overwrite every cell.
    pub fn fill(&mut self, cell: Cell) {
        let node = self.node_mut();
        node.cells.fill(cell);
        node.dirty = true;
    }

    /// Mutable access to one cell. Marks the region dirty when in bounds.
    pub fn cell_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        let node = self.node_mut();
        let i = node.index(x, y)?;
        node.dirty = true;
        Some(&mut node.cells[i])
    }

    /// Write `text` starting at `(x, y)`, one glyph per cell.
    ///
    /// The cursor advances by each glyph's display width; the trailing
    /// column of a wide glyph is filled with a continuation cell, and any
    /// wide glyph the write splits is blanked rather than left half-drawn.
    /// Zero-width code points are skipped. Glyphs falling outside the
    /// region are dropped. Returns the cursor column after the last glyph.
    pub fn set_text(&mut self, x: i32, y: i32, text: &str, style: TextStyle) -> i32 {
        let mut cursor = x;
        for glyph in text.chars() {
            let width = char_width(glyph) as i32;
            if width == 0 {
                continue;
            }
            self.node_mut().clear_wide_overlap(cursor, y, width);
            let mut lead = None;
            self.update(cursor, y, |c| {
                *c = style.apply(*c, glyph);
                lead = Some(*c);
            });
            for dx in 1..width {
                self.update(cursor + dx, y, |c| {
                    let base = lead.unwrap_or(*c);
                    *c = Cell {
                        glyph: Cell::CONTINUATION.glyph,
                        fg: base.fg,
                        bg: base.bg,
                    };
                });
            }
            cursor = cursor.saturating_add(width);
        }
        cursor
    }

    /// Write `text` horizontally centered on row `y`.
    ///
    /// Starts at `width / 2 - text_width / 2`, which may be negative for
    /// text wider than the region. `text_width` is the number of columns
    /// [`set_text`](Self::set_text) advances, so the centered span is exact.
    pub fn set_text_center(&mut self, y: i32, text: &str, style: TextStyle) -> i32 {
        let text_width: usize = text.chars().map(char_width).sum();
        let half_text = (text_width / 2).min(i32::MAX as usize) as i32;
        let x = self.size().width as i32 / 2 - half_text;
        self.set_text(x, y, text, style)
    }

    /// Move the region relative to its parent.
    ///
    /// Marks the region and its parent dirty.
    pub fn set_position(&mut self, position: XY) {
        let node = self.node_mut();
        node.position = position;
        node.dirty = true;
        self.mark_parent_dirty();
    }

    /// Show or hide the region and its subtree.
    ///
    /// A change marks the region and its parent dirty.
    pub fn set_hidden(&mut self, hidden: bool) {
        let node = self.node_mut();
        if node.hidden == hidden {
            return;
        }
        node.hidden = hidden;
        node.dirty = true;
        self.mark_parent_dirty();
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.node().hidden
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.node().dirty
    }

    /// Force a repaint on the next draw.
    pub fn mark_dirty(&mut self) {
        self.node_mut().dirty = true;
    }

    /// Create a child of this region. See [`RegionTree::new_child`].
    pub fn new_child(&mut self, size: Size, fill: Cell) -> Result<RegionId, RegionError> {
        self.tree.new_child(self.id, size, fill)
    }

    /// Draw a thin frame along the region's edges.
    pub fn draw_thin_border(&mut self) {
        junction::draw_thin_border(self);
    }

    /// Detach this region from its parent. See [`RegionTree::close`].
    pub fn close(self) -> bool {
        self.tree.close(self.id)
    }
}

impl GlyphTarget for RegionMut<'_> {
    fn size(&self) -> Size {
        RegionMut::size(self)
    }

    fn set_glyph(&mut self, x: i32, y: i32, glyph: char) {
        RegionMut::set_glyph(self, x, y, glyph);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::PackedRgba;
    use crate::surface::{GridSurface, RecordingSurface};

    fn blank() -> Cell {
        Cell::from_char('.')
    }

    fn tree_with_root(w: u16, h: u16) -> (RegionTree, RegionId) {
        let mut tree = RegionTree::new();
        let root = tree.new_region(Size::new(w, h), blank()).unwrap();
        (tree, root)
    }

    fn settle(tree: &mut RegionTree, root: RegionId) {
        tree.draw(root, &mut RecordingSurface::new(), DrawOptions::default());
    }

    // --- Construction ---

    #[test]
    fn new_region_has_exact_shape_and_is_dirty() {
        let (tree, root) = tree_with_root(4, 3);
        let region = tree.region(root).unwrap();
        assert_eq!(region.size(), Size::new(4, 3));
        assert_eq!(region.cells().len(), 12);
        for y in 0..3 {
            let row = region.row(y).unwrap();
            assert_eq!(row.len(), 4);
            assert!(row.iter().all(|c| *c == blank()));
        }
        assert!(region.row(3).is_none());
        assert!(region.row(-1).is_none());
        assert!(region.is_dirty());
        assert!(!region.is_hidden());
        assert_eq!(region.position(), XY::ORIGIN);
        assert_eq!(region.parent(), None);
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut tree = RegionTree::new();
        let err = tree.new_region(Size::new(0, 3), blank()).unwrap_err();
        assert_eq!(err, RegionError::ZeroSize { width: 0, height: 3 });
        assert!(err.to_string().contains("0x3"));
        assert!(tree.is_empty());
    }

    #[test]
    fn new_child_links_both_ways_and_dirties_parent() {
        let (mut tree, root) = tree_with_root(5, 5);
        settle(&mut tree, root);
        assert!(!tree.region(root).unwrap().is_dirty());

        let child = tree.new_child(root, Size::new(2, 2), blank()).unwrap();
        assert_eq!(tree.parent(child), Some(root));
        assert_eq!(tree.children(root), &[child]);
        assert!(tree.region(root).unwrap().is_dirty());
        assert!(tree.region(child).unwrap().is_dirty());
    }

    #[test]
    fn new_child_of_unknown_parent_fails() {
        let (mut tree, root) = tree_with_root(2, 2);
        let child = tree.new_child(root, Size::new(1, 1), blank()).unwrap();
        assert!(tree.close(child));
        let err = tree.new_child(child, Size::new(1, 1), blank()).unwrap_err();
        assert_eq!(err, RegionError::UnknownRegion(child));
    }

    #[test]
    fn children_keep_insertion_order() {
        let (mut tree, root) = tree_with_root(5, 5);
        let a = tree.new_child(root, Size::new(1, 1), blank()).unwrap();
        let b = tree.new_child(root, Size::new(1, 1), blank()).unwrap();
        let c = tree.region_mut(root).unwrap().new_child(Size::new(1, 1), blank()).unwrap();
        assert_eq!(tree.children(root), &[a, b, c]);
    }

    // --- Removal ---

    #[test]
    fn remove_child_frees_subtree() {
        let (mut tree, root) = tree_with_root(5, 5);
        let child = tree.new_child(root, Size::new(3, 3), blank()).unwrap();
        let grandchild = tree.new_child(child, Size::new(1, 1), blank()).unwrap();
        settle(&mut tree, root);

        assert!(tree.remove_child(root, child));
        assert!(tree.children(root).is_empty());
        assert!(!tree.contains(child));
        assert!(!tree.contains(grandchild));
        assert_eq!(tree.len(), 1);
        assert!(tree.region(root).unwrap().is_dirty());
    }

    #[test]
    fn remove_missing_child_changes_nothing() {
        let (mut tree, root) = tree_with_root(5, 5);
        let a = tree.new_child(root, Size::new(1, 1), blank()).unwrap();
        let b = tree.new_child(root, Size::new(1, 1), blank()).unwrap();
        let stranger = tree.new_region(Size::new(1, 1), blank()).unwrap();
        settle(&mut tree, root);

        assert!(!tree.remove_child(root, stranger));
        assert!(!tree.remove_child(a, b), "siblings are not children");
        assert_eq!(tree.children(root), &[a, b]);
        assert!(tree.contains(stranger));
        assert!(!tree.region(root).unwrap().is_dirty());
    }

    #[test]
    fn stale_handle_is_not_reused() {
        let (mut tree, root) = tree_with_root(5, 5);
        let old = tree.new_child(root, Size::new(1, 1), blank()).unwrap();
        assert!(tree.remove_child(root, old));
        let new = tree.new_child(root, Size::new(1, 1), blank()).unwrap();
        assert_ne!(old, new);
        assert!(!tree.remove_child(root, old));
        assert_eq!(tree.children(root), &[new]);
        assert!(tree.region_mut(old).is_none());
    }

    #[test]
    fn close_detaches_child_but_not_root() {
        let (mut tree, root) = tree_with_root(5, 5);
        let child = tree.new_child(root, Size::new(1, 1), blank()).unwrap();
        assert!(tree.region_mut(child).unwrap().close());
        assert!(tree.children(root).is_empty());
        assert!(!tree.close(root));
        assert!(tree.contains(root));
    }

    // --- Cell mutation ---

    #[test]
    fn set_cell_out_of_bounds_is_silent() {
        let (mut tree, root) = tree_with_root(3, 2);
        settle(&mut tree, root);
        let before = tree.region(root).unwrap().cells().to_vec();

        let mut region = tree.region_mut(root).unwrap();
        for (x, y) in [(-1, 0), (3, 0), (0, -1), (0, 2), (i32::MAX, i32::MIN)] {
            region.set_cell(x, y, Cell::from_char('X'));
            region.set_glyph(x, y, 'X');
            region.set_foreground(x, y, Attribute::color(PackedRgba::WHITE));
            region.set_background(x, y, Attribute::color(PackedRgba::WHITE));
            assert!(region.cell_mut(x, y).is_none());
            assert!(region.is_out_of_bound(x, y));
        }
        assert!(!region.is_dirty());
        assert_eq!(tree.region(root).unwrap().cells(), before.as_slice());
    }

    #[test]
    fn in_bounds_writes_mark_dirty() {
        let (mut tree, root) = tree_with_root(3, 2);
        let red = Attribute::color(PackedRgba::rgb(200, 0, 0));

        settle(&mut tree, root);
        tree.region_mut(root).unwrap().set_glyph(2, 1, '#');
        assert!(tree.region(root).unwrap().is_dirty());

        settle(&mut tree, root);
        tree.region_mut(root).unwrap().set_foreground(0, 0, red);
        assert!(tree.region(root).unwrap().is_dirty());

        settle(&mut tree, root);
        tree.region_mut(root).unwrap().set_background(1, 0, red);
        let region = tree.region(root).unwrap();
        assert!(region.is_dirty());
        assert_eq!(region.cell(2, 1).map(|c| c.glyph), Some('#'));
        assert_eq!(region.cell(0, 0).map(|c| c.fg), Some(red));
        assert_eq!(region.cell(1, 0).map(|c| c.bg), Some(red));
        assert_eq!(region.cell(1, 0).map(|c| c.glyph), Some('.'));
    }

    #[test]
    fn fill_overwrites_everything() {
        let (mut tree, root) = tree_with_root(3, 2);
        settle(&mut tree, root);
        tree.region_mut(root).unwrap().fill(Cell::from_char('~'));
        let region = tree.region(root).unwrap();
        assert!(region.cells().iter().all(|c| c.glyph == '~'));
        assert!(region.is_dirty());
    }

    #[test]
    fn cell_mut_marks_dirty() {
        let (mut tree, root) = tree_with_root(2, 2);
        settle(&mut tree, root);
        if let Some(cell) = tree.region_mut(root).unwrap().cell_mut(1, 1) {
            cell.glyph = '@';
        }
        let region = tree.region(root).unwrap();
        assert!(region.is_dirty());
        assert_eq!(region.cell(1, 1).map(|c| c.glyph), Some('@'));
    }

    // --- Text ---

    #[test]
    fn set_text_writes_glyphs_and_keeps_attributes() {
        let (mut tree, root) = tree_with_root(6, 1);
        let blue = Attribute::color(PackedRgba::rgb(0, 0, 255));
        let mut region = tree.region_mut(root).unwrap();
        region.set_background(1, 0, blue);
        let end = region.set_text(1, 0, "abc", TextStyle::default());
        assert_eq!(end, 4);
        let region = tree.region(root).unwrap();
        assert_eq!(region.row_text(0).as_deref(), Some(".abc.."));
        assert_eq!(region.cell(1, 0).map(|c| c.bg), Some(blue));
    }

    #[test]
    fn set_text_applies_style() {
        let (mut tree, root) = tree_with_root(4, 1);
        let fg = Attribute::color(PackedRgba::rgb(1, 2, 3));
        let bg = Attribute::color(PackedRgba::rgb(4, 5, 6));
        tree.region_mut(root)
            .unwrap()
            .set_text(0, 0, "hi", TextStyle::new().fg(fg).bg(bg));
        let region = tree.region(root).unwrap();
        assert_eq!(region.cell(0, 0), Some(&Cell::new('h', fg, bg)));
        assert_eq!(region.cell(1, 0), Some(&Cell::new('i', fg, bg)));
        assert_eq!(region.cell(2, 0), Some(&blank()));
    }

    #[test]
    fn set_text_advances_two_for_wide_glyphs() {
        let (mut tree, root) = tree_with_root(6, 1);
        let end = tree.region_mut(root).unwrap().set_text(0, 0, "中a", TextStyle::default());
        assert_eq!(end, 3);
        let region = tree.region(root).unwrap();
        assert_eq!(region.cell(0, 0).map(|c| c.glyph), Some('中'));
        assert!(region.cell(1, 0).unwrap().is_continuation());
        assert_eq!(region.cell(2, 0).map(|c| c.glyph), Some('a'));
        assert_eq!(region.row_text(0).as_deref(), Some("中a..."));
    }

    #[test]
    fn set_text_clips_overflow_and_negative_start() {
        let (mut tree, root) = tree_with_root(3, 1);
        let end = tree.region_mut(root).unwrap().set_text(-2, 0, "abcdef", TextStyle::default());
        assert_eq!(end, 4);
        assert_eq!(tree.region(root).unwrap().row_text(0).as_deref(), Some("cde"));
    }

    #[test]
    fn set_text_off_region_does_not_dirty() {
        let (mut tree, root) = tree_with_root(3, 1);
        settle(&mut tree, root);
        tree.region_mut(root).unwrap().set_text(0, 5, "abc", TextStyle::default());
        assert!(!tree.region(root).unwrap().is_dirty());
    }

    #[test]
    fn set_text_skips_zero_width() {
        let (mut tree, root) = tree_with_root(4, 1);
        let end = tree.region_mut(root).unwrap().set_text(0, 0, "a\u{200B}b", TextStyle::default());
        assert_eq!(end, 2);
        assert_eq!(tree.region(root).unwrap().row_text(0).as_deref(), Some("ab.."));
    }

    #[test]
    fn set_text_center_positions() {
        let (mut tree, root) = tree_with_root(10, 2);
        let mut region = tree.region_mut(root).unwrap();
        // 10/2 - 4/2 = 3
        region.set_text_center(0, "abcd", TextStyle::default());
        // 10/2 - 3/2 = 4
        region.set_text_center(1, "xyz", TextStyle::default());
        let region = tree.region(root).unwrap();
        assert_eq!(region.row_text(0).as_deref(), Some("...abcd..."));
        assert_eq!(region.row_text(1).as_deref(), Some("....xyz..."));
    }

    #[test]
    fn set_text_center_counts_display_width() {
        let (mut tree, root) = tree_with_root(8, 1);
        // 8/2 - 4/2 = 2
        tree.region_mut(root).unwrap().set_text_center(0, "日本", TextStyle::default());
        let region = tree.region(root).unwrap();
        assert_eq!(region.cell(2, 0).map(|c| c.glyph), Some('日'));
        assert_eq!(region.cell(4, 0).map(|c| c.glyph), Some('本'));
    }

    #[test]
    fn set_text_center_matches_cursor_advance_for_zwj_sequences() {
        let (mut tree, root) = tree_with_root(10, 1);
        // family emoji: three wide members joined by zero-width joiners,
        // laid out as 6 columns by set_text
        let family = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}";
        let end = tree.region_mut(root).unwrap().set_text_center(0, family, TextStyle::default());
        let region = tree.region(root).unwrap();
        assert_eq!(region.cell(2, 0).map(|c| c.glyph), Some('\u{1F468}'));
        assert_eq!(end, 8);
        assert_eq!((2 + end) / 2, 5, "span is centered on the region midpoint");
    }

    #[test]
    fn set_text_center_with_variation_selector() {
        let (mut tree, root) = tree_with_root(5, 1);
        // U+2764 is one column; the selector adds none
        let end = tree.region_mut(root).unwrap().set_text_center(0, "\u{2764}\u{FE0F}", TextStyle::default());
        assert_eq!(end, 3);
        assert_eq!(tree.region(root).unwrap().cell(2, 0).map(|c| c.glyph), Some('\u{2764}'));
    }

    fn continuations(region: &Region<'_>) -> usize {
        region.cells().iter().filter(|c| c.is_continuation()).count()
    }

    #[test]
    fn narrow_over_wide_head_clears_stale_tail() {
        let (mut tree, root) = tree_with_root(4, 1);
        let mut region = tree.region_mut(root).unwrap();
        region.set_text(0, 0, "中", TextStyle::default());
        region.set_text(0, 0, "a", TextStyle::default());
        let region = tree.region(root).unwrap();
        assert_eq!(region.row_text(0).as_deref(), Some("a .."));
        assert_eq!(continuations(&region), 0);
    }

    #[test]
    fn narrow_over_wide_tail_clears_head() {
        let (mut tree, root) = tree_with_root(4, 1);
        let mut region = tree.region_mut(root).unwrap();
        region.set_text(0, 0, "中", TextStyle::default());
        region.set_text(1, 0, "b", TextStyle::default());
        let region = tree.region(root).unwrap();
        assert_eq!(region.row_text(0).as_deref(), Some(" b.."));
        assert_eq!(continuations(&region), 0);
    }

    #[test]
    fn wide_over_shifted_wide_leaves_one_continuation() {
        let (mut tree, root) = tree_with_root(4, 1);
        let mut region = tree.region_mut(root).unwrap();
        region.set_text(0, 0, "a日", TextStyle::default());
        region.set_text(0, 0, "中", TextStyle::default());
        let region = tree.region(root).unwrap();
        assert_eq!(region.cell(0, 0).map(|c| c.glyph), Some('中'));
        assert!(region.cell(1, 0).is_some_and(|c| c.is_continuation()));
        assert_eq!(region.cell(2, 0).map(|c| c.glyph), Some(' '));
        assert_eq!(region.cell(3, 0).map(|c| c.glyph), Some('.'));
        assert_eq!(continuations(&region), 1);
    }

    // --- Position & visibility ---

    #[test]
    fn set_position_dirties_self_and_parent() {
        let (mut tree, root) = tree_with_root(5, 5);
        let child = tree.new_child(root, Size::new(1, 1), blank()).unwrap();
        settle(&mut tree, root);
        assert!(!tree.region(child).unwrap().is_dirty());

        tree.region_mut(child).unwrap().set_position(XY::new(-3, 9));
        assert!(tree.region(child).unwrap().is_dirty());
        assert!(tree.region(root).unwrap().is_dirty());
        assert_eq!(tree.region(child).unwrap().position(), XY::new(-3, 9));
    }

    #[test]
    fn set_position_on_root_dirties_root_only() {
        let (mut tree, root) = tree_with_root(2, 2);
        settle(&mut tree, root);
        tree.region_mut(root).unwrap().set_position(XY::new(1, 1));
        assert!(tree.region(root).unwrap().is_dirty());
    }

    #[test]
    fn set_hidden_dirties_on_change_only() {
        let (mut tree, root) = tree_with_root(5, 5);
        let child = tree.new_child(root, Size::new(1, 1), blank()).unwrap();
        settle(&mut tree, root);

        tree.region_mut(child).unwrap().set_hidden(false);
        assert!(!tree.region(root).unwrap().is_dirty());

        tree.region_mut(child).unwrap().set_hidden(true);
        assert!(tree.region(child).unwrap().is_hidden());
        assert!(tree.region(root).unwrap().is_dirty());
    }

    // --- Border ---

    #[test]
    fn region_border() {
        let (mut tree, root) = tree_with_root(4, 3);
        tree.region_mut(root).unwrap().draw_thin_border();
        let region = tree.region(root).unwrap();
        assert_eq!(region.row_text(0).as_deref(), Some("┌──┐"));
        assert_eq!(region.row_text(1).as_deref(), Some("│..│"));
        assert_eq!(region.row_text(2).as_deref(), Some("└──┘"));
    }

    #[test]
    fn thin_region_border_leaves_region_clean() {
        let (mut tree, root) = tree_with_root(1, 4);
        settle(&mut tree, root);
        tree.region_mut(root).unwrap().draw_thin_border();
        let region = tree.region(root).unwrap();
        assert!(!region.is_dirty());
        assert!(region.cells().iter().all(|c| *c == blank()));
    }

    // --- Draw ---

    #[test]
    fn draw_paints_root_then_children() {
        let (mut tree, root) = tree_with_root(4, 2);
        let child = tree.new_child(root, Size::new(2, 1), Cell::from_char('c')).unwrap();
        tree.region_mut(child).unwrap().set_position(XY::new(1, 1));

        let mut screen = GridSurface::new(4, 2);
        let stats = tree.draw(root, &mut screen, DrawOptions::default());
        screen.assert_matches(&["....", ".cc."]);
        assert_eq!(stats.regions_visited, 2);
        assert_eq!(stats.regions_painted, 2);
        assert_eq!(stats.cells_written, 8 + 2);
        assert_eq!(screen.writes(), 10);
    }

    #[test]
    fn second_draw_writes_nothing() {
        let (mut tree, root) = tree_with_root(4, 2);
        tree.new_child(root, Size::new(2, 1), Cell::from_char('c')).unwrap();
        let mut rec = RecordingSurface::new();
        tree.draw(root, &mut rec, DrawOptions::default());
        assert_eq!(rec.take().len(), 10);

        let stats = tree.draw(root, &mut rec, DrawOptions::default());
        assert!(rec.is_empty());
        assert_eq!(stats.cells_written, 0);
        assert_eq!(stats.regions_visited, 2);
        assert!(!tree.region(root).unwrap().is_dirty());
    }

    #[test]
    fn dirty_child_repaints_alone() {
        let (mut tree, root) = tree_with_root(4, 2);
        let child = tree.new_child(root, Size::new(2, 1), Cell::from_char('c')).unwrap();
        settle(&mut tree, root);

        tree.region_mut(child).unwrap().set_glyph(0, 0, 'Z');
        let mut rec = RecordingSurface::new();
        let stats = tree.draw(root, &mut rec, DrawOptions::default());
        assert_eq!(rec.len(), 2);
        assert_eq!(stats.regions_painted, 1);
        assert_eq!(rec.last_at(0, 0).map(|c| c.glyph), Some('Z'));
    }

    #[test]
    fn dirty_parent_forces_children() {
        let (mut tree, root) = tree_with_root(4, 2);
        let child = tree.new_child(root, Size::new(2, 1), Cell::from_char('c')).unwrap();
        let grandchild = tree.new_child(child, Size::new(1, 1), Cell::from_char('g')).unwrap();
        settle(&mut tree, root);

        tree.region_mut(root).unwrap().mark_dirty();
        let mut rec = RecordingSurface::new();
        let stats = tree.draw(root, &mut rec, DrawOptions::default());
        assert_eq!(stats.regions_painted, 3);
        assert_eq!(rec.len(), 8 + 2 + 1);
        assert!(!tree.region(grandchild).unwrap().is_dirty());
    }

    #[test]
    fn hidden_subtree_is_skipped() {
        let (mut tree, root) = tree_with_root(3, 1);
        let child = tree.new_child(root, Size::new(1, 1), Cell::from_char('c')).unwrap();
        let grandchild = tree.new_child(child, Size::new(1, 1), Cell::from_char('g')).unwrap();
        tree.region_mut(child).unwrap().set_hidden(true);

        let mut screen = GridSurface::new(3, 1);
        let stats = tree.draw(root, &mut screen, DrawOptions::default());
        screen.assert_row(0, "...");
        assert_eq!(stats.regions_visited, 1);
        // skipped regions keep their dirty flag for when they reappear
        assert!(tree.region(child).unwrap().is_dirty());
        assert!(tree.region(grandchild).unwrap().is_dirty());

        tree.region_mut(child).unwrap().set_hidden(false);
        tree.draw(root, &mut screen, DrawOptions::default());
        screen.assert_row(0, "g..");
    }

    #[test]
    fn hidden_root_draws_nothing() {
        let (mut tree, root) = tree_with_root(3, 1);
        tree.region_mut(root).unwrap().set_hidden(true);
        let mut rec = RecordingSurface::new();
        let stats = tree.draw(root, &mut rec, DrawOptions::default());
        assert!(rec.is_empty());
        assert_eq!(stats, DrawStats::default());
    }

    #[test]
    fn child_clipped_to_parent_bounds() {
        let (mut tree, root) = tree_with_root(4, 3);
        let child = tree.new_child(root, Size::new(3, 3), Cell::from_char('c')).unwrap();
        tree.region_mut(child).unwrap().set_position(XY::new(2, -1));

        let mut rec = RecordingSurface::new();
        tree.draw(root, &mut rec, DrawOptions::default());
        let child_writes: Vec<_> = rec.writes().iter().filter(|w| w.cell.glyph == 'c').collect();
        // columns 2..4 of rows 0..2 survive the 4x3 parent clip
        assert_eq!(child_writes.len(), 4);
        assert!(child_writes.iter().all(|w| (2..4).contains(&w.x) && (0..2).contains(&w.y)));
    }

    #[test]
    fn child_fully_outside_writes_nothing() {
        let (mut tree, root) = tree_with_root(4, 3);
        let child = tree.new_child(root, Size::new(2, 2), Cell::from_char('c')).unwrap();
        tree.region_mut(child).unwrap().set_position(XY::new(10, 10));
        let mut rec = RecordingSurface::new();
        let stats = tree.draw(root, &mut rec, DrawOptions::default());
        assert_eq!(rec.len(), 12);
        assert_eq!(stats.regions_visited, 2);
    }

    #[test]
    fn clip_uses_immediate_parent_only() {
        // root 2x2 > child 6x6 at (0,0) > grandchild 3x1 at (3,0)
        let (mut tree, root) = tree_with_root(2, 2);
        let child = tree.new_child(root, Size::new(6, 6), Cell::from_char('c')).unwrap();
        let grandchild = tree.new_child(child, Size::new(3, 1), Cell::from_char('g')).unwrap();
        tree.region_mut(grandchild).unwrap().set_position(XY::new(3, 0));

        let mut rec = RecordingSurface::new();
        tree.draw(root, &mut rec, DrawOptions::default());
        let g: Vec<i32> = rec
            .writes()
            .iter()
            .filter(|w| w.cell.glyph == 'g')
            .map(|w| w.x)
            .collect();
        // outside the 2x2 root but inside the 6x6 parent
        assert_eq!(g, vec![3, 4, 5]);
        let c = rec.writes().iter().filter(|w| w.cell.glyph == 'c').count();
        assert_eq!(c, 4, "child is clipped by the root");
    }

    #[test]
    fn root_draw_options_origin_and_clip() {
        let (mut tree, root) = tree_with_root(3, 3);
        tree.region_mut(root).unwrap().set_position(XY::new(1, 0));
        let mut rec = RecordingSurface::new();
        let options = DrawOptions::new()
            .with_origin(XY::new(10, 20))
            .with_clip(Size::new(2, 2));
        let stats = tree.draw(root, &mut rec, options);
        // root lands at (11, 20); the window covers x 10..12, y 20..22
        assert_eq!(stats.cells_written, 2);
        let mut coords: Vec<(i32, i32)> = rec.writes().iter().map(|w| (w.x, w.y)).collect();
        coords.sort_unstable();
        assert_eq!(coords, vec![(11, 20), (11, 21)]);
    }

    #[test]
    fn unclipped_root_writes_negative_coordinates() {
        let (mut tree, root) = tree_with_root(2, 1);
        tree.region_mut(root).unwrap().set_position(XY::new(-1, -1));
        let mut rec = RecordingSurface::new();
        tree.draw(root, &mut rec, DrawOptions::default());
        assert_eq!(rec.count_at(-1, -1), 1);
        assert_eq!(rec.count_at(0, -1), 1);
    }

    #[test]
    fn moving_child_repaints_parent_to_erase_old_spot() {
        let (mut tree, root) = tree_with_root(4, 1);
        let child = tree.new_child(root, Size::new(1, 1), Cell::from_char('c')).unwrap();
        let mut screen = GridSurface::new(4, 1);
        tree.draw(root, &mut screen, DrawOptions::default());
        screen.assert_row(0, "c...");

        tree.region_mut(child).unwrap().set_position(XY::new(3, 0));
        tree.draw(root, &mut screen, DrawOptions::default());
        screen.assert_row(0, "...c");
    }

    #[test]
    fn removed_child_is_erased_on_next_draw() {
        let (mut tree, root) = tree_with_root(3, 1);
        let child = tree.new_child(root, Size::new(1, 1), Cell::from_char('c')).unwrap();
        let mut screen = GridSurface::new(3, 1);
        tree.draw(root, &mut screen, DrawOptions::default());
        screen.assert_row(0, "c..");

        assert!(tree.close(child));
        tree.draw(root, &mut screen, DrawOptions::default());
        screen.assert_row(0, "...");
    }

    #[test]
    fn draw_unknown_id_is_noop() {
        let (mut tree, root) = tree_with_root(1, 1);
        let child = tree.new_child(root, Size::new(1, 1), blank()).unwrap();
        tree.close(child);
        let mut rec = RecordingSurface::new();
        assert_eq!(tree.draw(child, &mut rec, DrawOptions::default()), DrawStats::default());
        assert!(rec.is_empty());
    }

    #[test]
    fn error_display() {
        let err = RegionError::ZeroSize { width: 3, height: 0 };
        assert_eq!(err.to_string(), "region size must be positive, got 3x0");
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.to_string().starts_with("region size"));
    }
}
