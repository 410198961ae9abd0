//! Axis-aligned collision primitives
//!
//! Every gameplay entity in the shooter, and every HUD button, is an
//! axis-aligned rectangle stored as top-left corner plus size. Overlap uses
//! strict inequalities so rectangles that merely touch do not collide.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    /// Centre point of the rectangle
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap test (shared edges do not count)
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Inclusive containment, used for tap hit-testing on HUD buttons
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Clamp the rectangle so it lies fully inside `bounds` (size unchanged)
    pub fn clamp_within(&mut self, bounds: Vec2) {
        let max = (bounds - self.size).max(Vec2::ZERO);
        self.pos = self.pos.clamp(Vec2::ZERO, max);
    }
}
