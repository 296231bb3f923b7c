//! Integer rectangles in room pixel space (+y points down).
//!
//! Positions in the core are whole pixels while velocities stay fractional, so every box the
//! physics touches is a `PixelRect`. The edge setters move the rect without resizing it, which is
//! what the collision resolver relies on when it snaps a hitbox flush against a tile.

use bevy::math::IVec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rect of `size` whose bottom edge is centred on `anchor`.
    pub fn from_midbottom(anchor: IVec2, size: IVec2) -> Self {
        let mut rect = Self::new(0, 0, size.x, size.y);
        rect.set_midbottom(anchor);
        rect
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub fn set_left(&mut self, value: i32) {
        self.x = value;
    }

    #[inline]
    pub fn set_right(&mut self, value: i32) {
        self.x = value - self.width;
    }

    #[inline]
    pub fn set_top(&mut self, value: i32) {
        self.y = value;
    }

    #[inline]
    pub fn set_bottom(&mut self, value: i32) {
        self.y = value - self.height;
    }

    /// Centre point, rounded toward the top-left like integer halving.
    pub fn center(&self) -> IVec2 {
        IVec2::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn midbottom(&self) -> IVec2 {
        IVec2::new(self.x + self.width / 2, self.bottom())
    }

    pub fn set_midbottom(&mut self, anchor: IVec2) {
        self.x = anchor.x - self.width / 2;
        self.y = anchor.y - self.height;
    }

    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    /// Returns a copy moved by `offset`.
    pub fn offset(&self, offset: IVec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    pub fn translate(&mut self, offset: IVec2) {
        self.x += offset.x;
        self.y += offset.y;
    }

    /// Strict overlap: rects that only share an edge do not collide.
    pub fn overlaps(&self, other: &PixelRect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    #[cfg(test)]
    /// True when `other` lies completely inside `self` (edges may touch).
    pub fn contains_rect(&self, other: &PixelRect) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }
}
