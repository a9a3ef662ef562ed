//! Recoil Core
//!
//! Value types shared by the Recoil animation crates:
//!
//! - **Vector quantities**: any value that flattens to a fixed number of `f64`
//!   components can be driven by a spring ([`VectorQuantity`])
//! - **Component vectors**: the flat, inline-stored representation the
//!   integrator works on ([`AnimatableVector`])
//! - **Geometry**: points, sizes, rectangles and colors
//!
//! # Example
//!
//! ```rust
//! use recoil_core::{Point, VectorQuantity};
//!
//! let p = Point::new(3.0, 4.0);
//! let v = p.to_vector();
//! assert_eq!(v.as_slice(), &[3.0, 4.0]);
//! assert_eq!(Point::from_vector(&v), p);
//! ```

pub mod geometry;
pub mod vector;

pub use geometry::{Color, Point, Rect, Size};
pub use vector::{AnimatableVector, VectorQuantity};
