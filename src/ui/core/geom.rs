use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

/// A half-open cell rectangle: `a` is the top-left corner (inclusive), `b` the
/// bottom-right corner (exclusive).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub a: Point,
    pub b: Point,
}

impl Rect {
    pub const fn new(ax: i16, ay: i16, bx: i16, by: i16) -> Self {
        Self {
            a: Point::new(ax, ay),
            b: Point::new(bx, by),
        }
    }

    pub const fn from_points(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Rectangle anchored at `origin` with the given extent.
    pub fn with_size(origin: Point, size: Point) -> Self {
        Self::from_points(origin, origin + size)
    }

    pub fn width(&self) -> i16 {
        self.b.x.saturating_sub(self.a.x).max(0)
    }

    pub fn height(&self) -> i16 {
        self.b.y.saturating_sub(self.a.y).max(0)
    }

    pub fn size(&self) -> Point {
        Point::new(self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.b.x <= self.a.x || self.b.y <= self.a.y
    }

    pub fn contains(&self, p: Point) -> bool {
        if self.is_empty() {
            return false;
        }
        p.x >= self.a.x && p.x < self.b.x && p.y >= self.a.y && p.y < self.b.y
    }

    /// Overlap of both rectangles; empty rectangles collapse to `Rect::default()`.
    pub fn intersect(&self, other: Rect) -> Rect {
        let r = Rect::new(
            self.a.x.max(other.a.x),
            self.a.y.max(other.a.y),
            self.b.x.min(other.b.x),
            self.b.y.min(other.b.y),
        );
        if r.is_empty() {
            Rect::default()
        } else {
            r
        }
    }

    /// Smallest rectangle covering both. An empty side is ignored.
    pub fn union(&self, other: Rect) -> Rect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect::new(
            self.a.x.min(other.a.x),
            self.a.y.min(other.a.y),
            self.b.x.max(other.b.x),
            self.b.y.max(other.b.y),
        )
    }

    pub fn moved(&self, dx: i16, dy: i16) -> Rect {
        let d = Point::new(dx, dy);
        Rect::from_points(self.a + d, self.b + d)
    }

    pub fn grown(&self, dx: i16, dy: i16) -> Rect {
        let d = Point::new(dx, dy);
        Rect::from_points(self.a - d, self.b + d)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/ui/core/geom.rs"]
mod tests;
