//! Planar value types: points, rotations and axis-aligned bounds.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Default tolerance for positional equality checks.
pub const POINT_TOLERANCE: f64 = 1e-9;

/// Represents a 2D point (or vector) with X and Y coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point with the given X and Y coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Calculates the distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        (*self - *other).length()
    }

    pub fn distance_squared_to(&self, other: &Point) -> f64 {
        (*self - *other).length_squared()
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product.
    pub fn cross(&self, other: &Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Returns the unit vector in the same direction, or `None` for a zero vector.
    pub fn normalized(&self) -> Option<Point> {
        let len = self.length();
        if len <= POINT_TOLERANCE {
            None
        } else {
            Some(Point::new(self.x / len, self.y / len))
        }
    }

    /// Vector rotated a quarter turn counter-clockwise.
    pub fn perp(&self) -> Point {
        Point::new(-self.y, self.x)
    }

    /// Rotates about the origin by `angle` radians (counter-clockwise positive).
    pub fn rotated(&self, angle: f64) -> Point {
        let (sin_a, cos_a) = angle.sin_cos();
        Point::new(
            self.x * cos_a - self.y * sin_a,
            self.x * sin_a + self.y * cos_a,
        )
    }

    /// Polar angle in radians, in `(-PI, PI]`.
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn approx_eq(&self, other: &Point, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }

    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        *self + (*other - *self) * t
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Point;
    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// A rotation about the origin with its trigonometry computed once.
///
/// Carries both directions so geometry can be taken into a rotated frame and
/// brought back without recomputing `sin`/`cos` per vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    sin: f64,
    cos: f64,
}

impl Rotation {
    /// Rotation by `degrees` (counter-clockwise positive).
    pub fn from_degrees(degrees: f64) -> Self {
        Self::from_radians(degrees.to_radians())
    }

    pub fn from_radians(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self { sin, cos }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(p.x * self.cos - p.y * self.sin, p.x * self.sin + p.y * self.cos)
    }

    /// Applies the inverse rotation.
    pub fn invert(&self, p: Point) -> Point {
        Point::new(p.x * self.cos + p.y * self.sin, -p.x * self.sin + p.y * self.cos)
    }

    pub fn inverse(&self) -> Rotation {
        Rotation {
            sin: -self.sin,
            cos: self.cos,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// A zero-size box at `p`.
    pub fn from_point(p: Point) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    pub fn include_point(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Checks containment with `tolerance` slack on every side.
    pub fn contains_box(&self, other: &BoundingBox, tolerance: f64) -> bool {
        other.min_x >= self.min_x - tolerance
            && other.min_y >= self.min_y - tolerance
            && other.max_x <= self.max_x + tolerance
            && other.max_y <= self.max_y + tolerance
    }
}

/// Center of the circle through three points, `None` when they are collinear.
pub fn circle_through_points(a: Point, b: Point, c: Point) -> Option<Point> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-12 {
        return None;
    }
    let a2 = a.length_squared();
    let b2 = b.length_squared();
    let c2 = c.length_squared();
    Some(Point::new(
        (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
        (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
    ))
}
