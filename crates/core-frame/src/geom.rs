//! Pixel geometry. Rectangles are half-open: `min` is inside, `max` is not.

use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, o: Point) -> Point {
        Point::new(self.x + o.x, self.y + o.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, o: Point) -> Point {
        Point::new(self.x - o.x, self.y - o.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: Point::new(x0, y0),
            max: Point::new(x1, y1),
        }
    }

    pub const fn from_points(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn dx(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn dy(&self) -> i32 {
        self.max.y - self.min.y
    }

    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Overlap of the two rectangles; empty when they do not meet.
    pub fn intersect(&self, o: &Rect) -> Rect {
        Rect::new(
            self.min.x.max(o.min.x),
            self.min.y.max(o.min.y),
            self.max.x.min(o.max.x),
            self.max.y.min(o.max.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_open_containment() {
        let r = Rect::new(10, 15, 67, 72);
        assert_eq!((r.dx(), r.dy()), (57, 57));
        assert!(r.contains(Point::new(10, 15)));
        assert!(!r.contains(Point::new(67, 20)));
        assert!(!r.contains(Point::new(20, 72)));
    }

    #[test]
    fn intersection_may_be_empty() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(a.intersect(&Rect::new(5, 5, 20, 20)), Rect::new(5, 5, 10, 10));
        assert!(a.intersect(&Rect::new(10, 0, 20, 10)).is_empty());
    }
}
