//! Geometry and color values
//!
//! Plain `f64` value types that animations commonly drive. Each one is a
//! [`VectorQuantity`], so it can be handed straight to a spring.

use serde::{Deserialize, Serialize};

use crate::vector::{AnimatableVector, VectorQuantity};

// ─────────────────────────────────────────────────────────────────────────────
// Core Geometry Types
// ─────────────────────────────────────────────────────────────────────────────

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Convert to a Rect at the origin (0, 0)
    pub const fn to_rect(self) -> Rect {
        Rect {
            origin: Point::ZERO,
            size: self,
        }
    }
}

impl From<Size> for Rect {
    fn from(size: Size) -> Self {
        size.to_rect()
    }
}

/// 2D rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Color
// ─────────────────────────────────────────────────────────────────────────────

/// RGBA color, components in `0.0..=1.0`
///
/// Springs may overshoot the unit range on bouncy curves; clamping is left to
/// whoever consumes the color.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: u32) -> Self {
        let r = f64::from((hex >> 16) & 0xFF) / 255.0;
        let g = f64::from((hex >> 8) & 0xFF) / 255.0;
        let b = f64::from(hex & 0xFF) / 255.0;
        Self::rgb(r, g, b)
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.a = alpha;
        self
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// VectorQuantity impls
// ─────────────────────────────────────────────────────────────────────────────

impl VectorQuantity for Point {
    fn to_vector(&self) -> AnimatableVector {
        AnimatableVector::from_slice(&[self.x, self.y])
    }

    fn from_vector(vector: &AnimatableVector) -> Self {
        Point::new(vector.get(0), vector.get(1))
    }

    fn zero() -> Self {
        Point::ZERO
    }

    fn integralized(&self) -> Self {
        Point::new(self.x.round(), self.y.round())
    }
}

impl VectorQuantity for Size {
    fn to_vector(&self) -> AnimatableVector {
        AnimatableVector::from_slice(&[self.width, self.height])
    }

    fn from_vector(vector: &AnimatableVector) -> Self {
        Size::new(vector.get(0), vector.get(1))
    }

    fn zero() -> Self {
        Size::ZERO
    }

    fn integralized(&self) -> Self {
        Size::new(self.width.round(), self.height.round())
    }
}

impl VectorQuantity for Rect {
    fn to_vector(&self) -> AnimatableVector {
        AnimatableVector::from_slice(&[
            self.origin.x,
            self.origin.y,
            self.size.width,
            self.size.height,
        ])
    }

    fn from_vector(vector: &AnimatableVector) -> Self {
        Rect::new(vector.get(0), vector.get(1), vector.get(2), vector.get(3))
    }

    fn zero() -> Self {
        Rect::ZERO
    }

    fn integralized(&self) -> Self {
        Rect::from_origin_size(self.origin.integralized(), self.size.integralized())
    }
}

impl VectorQuantity for Color {
    fn to_vector(&self) -> AnimatableVector {
        AnimatableVector::from(self.to_array())
    }

    fn from_vector(vector: &AnimatableVector) -> Self {
        Color::rgba(vector.get(0), vector.get(1), vector.get(2), vector.get(3))
    }

    fn zero() -> Self {
        Color::TRANSPARENT
    }
}
