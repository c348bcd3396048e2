//! Keyframe value type: a fixed-size numeric vector.
//!
//! Every track stores the same shape of value. Scalar properties (an audio
//! gain, a light intensity) occupy component 0 and leave the rest at zero;
//! the engine never inspects what a component means.

use serde::{Deserialize, Serialize};

/// Number of components in a keyframe value.
pub const VALUE_DIM: usize = 3;

/// A fixed-size numeric vector sampled along a track.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(pub [f64; VALUE_DIM]);

impl Value {
    /// Create a value from its components
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }

    /// Zero value
    #[inline]
    pub fn zero() -> Self {
        Self([0.0; VALUE_DIM])
    }

    /// Create a value carrying a scalar in component 0
    #[inline]
    pub fn scalar(v: f64) -> Self {
        let mut components = [0.0; VALUE_DIM];
        components[0] = v;
        Self(components)
    }

    /// Get the components as a slice
    #[inline]
    pub fn components(&self) -> &[f64; VALUE_DIM] {
        &self.0
    }

    /// Whether every component is finite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }

    /// Componentwise linear interpolation toward `other`.
    /// `t` is the interpolation factor, clamped to [0, 1].
    #[inline]
    pub fn lerp(&self, other: &Value, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mut out = [0.0; VALUE_DIM];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.0[i] + (other.0[i] - self.0[i]) * t;
        }
        Self(out)
    }

    /// Largest componentwise absolute difference from `other`
    #[inline]
    pub fn max_abs_diff(&self, other: &Value) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

impl std::ops::Index<usize> for Value {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl From<[f64; VALUE_DIM]> for Value {
    fn from(components: [f64; VALUE_DIM]) -> Self {
        Self(components)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::scalar(v)
    }
}

impl From<Value> for [f64; VALUE_DIM] {
    fn from(value: Value) -> Self {
        value.0
    }
}
