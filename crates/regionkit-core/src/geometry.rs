#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Positions are signed: a region may sit partially or fully outside its
//! parent, and visibility is decided at draw time. Sizes are unsigned cell
//! counts.

use core::ops::{Add, AddAssign, Neg, Sub};

/// A signed 2D offset in cell units.
///
/// Used for region positions (relative to the parent origin) and for
/// absolute terminal coordinates produced while drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct XY {
    pub x: i32,
    pub y: i32,
}

impl XY {
    /// The origin `(0, 0)`.
    pub const ORIGIN: Self = Self::new(0, 0);

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Return a copy shifted by `(dx, dy)`.
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }
}

impl Add for XY {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.offset(rhs.x, rhs.y)
    }
}

impl AddAssign for XY {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for XY {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

impl Neg for XY {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(self.x.saturating_neg(), self.y.saturating_neg())
    }
}

impl From<(i32, i32)> for XY {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Width and height in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    #[inline]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Area in cells.
    #[inline]
    pub const fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check if either dimension is zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a local coordinate lies inside `0..width` x `0..height`.
    #[inline]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    /// The size as a signed offset (`width`, `height`).
    #[inline]
    pub const fn to_xy(self) -> XY {
        XY::new(self.width as i32, self.height as i32)
    }
}

impl From<(u16, u16)> for Size {
    fn from((width, height): (u16, u16)) -> Self {
        Self::new(width, height)
    }
}

/// A rectangle in signed terminal coordinates.
///
/// Used as a clip window while composing: the origin may be negative or lie
/// beyond the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Top-left corner (inclusive).
    pub origin: XY,
    pub size: Size,
}

impl Rect {
    #[inline]
    pub const fn new(origin: XY, size: Size) -> Self {
        Self { origin, size }
    }

    /// Left edge (inclusive).
    #[inline]
    pub const fn left(&self) -> i32 {
        self.origin.x
    }

    /// Top edge (inclusive).
    #[inline]
    pub const fn top(&self) -> i32 {
        self.origin.y
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.origin.x.saturating_add(self.size.width as i32)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.origin.y.saturating_add(self.size.height as i32)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    /// Check if an absolute point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left() && x < self.right() && y >= self.top() && y < self.bottom()
    }
}
