//! Animatable vector quantities
//!
//! Springs integrate over a flat list of `f64` components. Anything that can
//! flatten itself to such a list (and rebuild itself from one) implements
//! [`VectorQuantity`] and can be animated. The dimensionality is fixed per type:
//! 1 for scalars, 2 for points and sizes, 4 for rects and colors.

use smallvec::SmallVec;
use std::ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign};

/// Inline capacity; covers every built-in quantity without a heap allocation
const INLINE_COMPONENTS: usize = 4;

/// Flattened component representation of a [`VectorQuantity`]
///
/// Binary operations expect both operands to have the same length. Mixing
/// lengths is a programming error caught by a debug assertion; release builds
/// operate over the shorter of the two.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimatableVector {
    components: SmallVec<[f64; INLINE_COMPONENTS]>,
}

impl AnimatableVector {
    /// A vector of `len` zero components
    pub fn zeros(len: usize) -> Self {
        Self {
            components: SmallVec::from_elem(0.0, len),
        }
    }

    pub fn from_slice(components: &[f64]) -> Self {
        Self {
            components: SmallVec::from_slice(components),
        }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.components
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.components
    }

    /// Component at `index`, or `0.0` when out of range
    pub fn get(&self, index: usize) -> f64 {
        self.components.get(index).copied().unwrap_or(0.0)
    }

    /// True when every component is exactly zero
    pub fn is_zero(&self) -> bool {
        self.components.iter().all(|c| *c == 0.0)
    }

    /// Apply `f` to every component
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            components: self.components.iter().map(|c| f(*c)).collect(),
        }
    }

    /// Set every component to zero, keeping the dimensionality
    pub fn clear(&mut self) {
        self.components.iter_mut().for_each(|c| *c = 0.0);
    }

    /// Overwrite this vector's components with `other`'s
    pub fn assign(&mut self, other: &AnimatableVector) {
        self.components.clear();
        self.components.extend_from_slice(&other.components);
    }

    fn zip_with(&self, other: &AnimatableVector, f: impl Fn(f64, f64) -> f64) -> Self {
        debug_assert_eq!(self.len(), other.len(), "vector dimension mismatch");
        Self {
            components: self
                .components
                .iter()
                .zip(other.components.iter())
                .map(|(a, b)| f(*a, *b))
                .collect(),
        }
    }
}

impl From<&[f64]> for AnimatableVector {
    fn from(components: &[f64]) -> Self {
        Self::from_slice(components)
    }
}

impl<const N: usize> From<[f64; N]> for AnimatableVector {
    fn from(components: [f64; N]) -> Self {
        Self::from_slice(&components)
    }
}

impl FromIterator<f64> for AnimatableVector {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self {
            components: iter.into_iter().collect(),
        }
    }
}

impl Add for &AnimatableVector {
    type Output = AnimatableVector;

    fn add(self, rhs: &AnimatableVector) -> AnimatableVector {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub for &AnimatableVector {
    type Output = AnimatableVector;

    fn sub(self, rhs: &AnimatableVector) -> AnimatableVector {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl Mul<f64> for &AnimatableVector {
    type Output = AnimatableVector;

    fn mul(self, rhs: f64) -> AnimatableVector {
        self.map(|c| c * rhs)
    }
}

impl AddAssign<&AnimatableVector> for AnimatableVector {
    fn add_assign(&mut self, rhs: &AnimatableVector) {
        debug_assert_eq!(self.len(), rhs.len(), "vector dimension mismatch");
        for (a, b) in self.components.iter_mut().zip(rhs.components.iter()) {
            *a += *b;
        }
    }
}

impl SubAssign<&AnimatableVector> for AnimatableVector {
    fn sub_assign(&mut self, rhs: &AnimatableVector) {
        debug_assert_eq!(self.len(), rhs.len(), "vector dimension mismatch");
        for (a, b) in self.components.iter_mut().zip(rhs.components.iter()) {
            *a -= *b;
        }
    }
}

impl MulAssign<f64> for AnimatableVector {
    fn mul_assign(&mut self, rhs: f64) {
        self.components.iter_mut().for_each(|c| *c *= rhs);
    }
}

/// A value a spring can drive
///
/// Implementors map themselves to and from a fixed-length component vector.
/// `from_vector` must accept any vector produced by `to_vector` for the same
/// type; missing components read as zero.
pub trait VectorQuantity: Clone {
    /// Flatten to components
    fn to_vector(&self) -> AnimatableVector;

    /// Rebuild from components
    fn from_vector(vector: &AnimatableVector) -> Self;

    /// The additive identity
    fn zero() -> Self;

    /// A copy snapped to whole units, for quantities that land on the pixel grid.
    ///
    /// Identity unless the type overrides it.
    fn integralized(&self) -> Self {
        self.clone()
    }
}

impl VectorQuantity for f64 {
    fn to_vector(&self) -> AnimatableVector {
        AnimatableVector::from_slice(&[*self])
    }

    fn from_vector(vector: &AnimatableVector) -> Self {
        vector.get(0)
    }

    fn zero() -> Self {
        0.0
    }
}

impl VectorQuantity for f32 {
    fn to_vector(&self) -> AnimatableVector {
        AnimatableVector::from_slice(&[f64::from(*self)])
    }

    fn from_vector(vector: &AnimatableVector) -> Self {
        vector.get(0) as f32
    }

    fn zero() -> Self {
        0.0
    }
}

impl<const N: usize> VectorQuantity for [f64; N] {
    fn to_vector(&self) -> AnimatableVector {
        AnimatableVector::from_slice(self)
    }

    fn from_vector(vector: &AnimatableVector) -> Self {
        std::array::from_fn(|i| vector.get(i))
    }

    fn zero() -> Self {
        [0.0; N]
    }
}

impl VectorQuantity for (f64, f64) {
    fn to_vector(&self) -> AnimatableVector {
        AnimatableVector::from_slice(&[self.0, self.1])
    }

    fn from_vector(vector: &AnimatableVector) -> Self {
        (vector.get(0), vector.get(1))
    }

    fn zero() -> Self {
        (0.0, 0.0)
    }
}
