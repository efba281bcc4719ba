//! Fixed-point math utilities for deterministic simulation.
//!
//! All match simulation uses fixed-point arithmetic so that the same level
//! and the same placements produce bit-identical matches on every platform.
//! Level files are authored with ordinary decimals and converted once with
//! [`to_fixed`].

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Number of fractional bits in [`Fixed`].
const FRAC_BITS: u32 = 32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Build a vector from integer coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Exact squared distance, in units of `2^-64` (see [`square_wide`]).
    ///
    /// Computed on the raw bits in 128-bit integers, so it never saturates for
    /// any pair of representable points on a realistic map.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> u128 {
        let dx = raw_delta(self.x, other.x);
        let dy = raw_delta(self.y, other.y);
        (dx * dx).saturating_add(dy * dy)
    }

    /// Euclidean distance between two points.
    ///
    /// Saturates at [`Fixed::MAX`] when the distance is not representable.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        sqrt_wide(self.distance_squared(other)).unwrap_or(Fixed::MAX)
    }

    /// Scale both components by `factor`.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Convert to a pair of floats for presentation layers.
    #[must_use]
    pub fn to_f64_pair(self) -> (f64, f64) {
        (self.x.to_num::<f64>(), self.y.to_num::<f64>())
    }
}

/// Magnitude of `a - b` in raw bits.
fn raw_delta(a: Fixed, b: Fixed) -> u128 {
    (i128::from(a.to_bits()) - i128::from(b.to_bits())).unsigned_abs()
}

/// Square of a fixed-point value in units of `2^-64`.
///
/// Comparable with [`Vec2Fixed::distance_squared`].
#[must_use]
pub fn square_wide(value: Fixed) -> u128 {
    let magnitude = u128::from(value.to_bits().unsigned_abs());
    magnitude * magnitude
}

/// Floor square root of a value in units of `2^-64`.
///
/// Returns `None` if the root does not fit in [`Fixed`].
#[must_use]
pub fn sqrt_wide(value: u128) -> Option<Fixed> {
    i64::try_from(isqrt_u128(value)).ok().map(Fixed::from_bits)
}

/// Computes the floor square root of a fixed-point number.
///
/// Works on the raw bits with an integer digit-by-digit root, so the result is
/// exact to the last fractional bit and identical on every platform.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let widened = u128::from(value.to_bits().unsigned_abs()) << FRAC_BITS;
    sqrt_wide(widened).unwrap_or(Fixed::MAX)
}

fn isqrt_u128(n: u128) -> u128 {
    let mut remainder = n;
    let mut result: u128 = 0;
    let mut bit: u128 = 1 << 126;

    while bit > remainder {
        bit >>= 2;
    }

    while bit != 0 {
        if remainder >= result + bit {
            remainder -= result + bit;
            result = (result >> 1) + bit;
        } else {
            result >>= 1;
        }
        bit >>= 2;
    }

    result
}

/// Convert an authored decimal into [`Fixed`].
///
/// `field` names the value in the error message.
pub fn to_fixed(value: f64, field: &str) -> Result<Fixed> {
    if !value.is_finite() {
        return Err(GameError::InvalidLevelShape(format!(
            "{field} must be a finite number, got {value}"
        )));
    }
    Fixed::checked_from_num(value).ok_or_else(|| {
        GameError::InvalidLevelShape(format!("{field} is out of range: {value}"))
    })
}

/// Clamp a fixed-point value into `[low, high]`.
#[must_use]
pub fn clamp_fixed(value: Fixed, low: Fixed, high: Fixed) -> Fixed {
    value.max(low).min(high)
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), square_wide(Fixed::from_num(5)));
        assert_eq!(a.distance(b), Fixed::from_num(5));
    }

    #[test]
    fn test_long_distances_are_exact() {
        let a = Vec2Fixed::ZERO;
        let b = Vec2Fixed::from_ints(50_000, 0);
        assert_eq!(a.distance(b), Fixed::from_num(50_000));

        let c = Vec2Fixed::from_ints(-1_000_000_000, 0);
        let d = Vec2Fixed::from_ints(1_000_000_000, 0);
        assert_eq!(c.distance_squared(d), square_wide(Fixed::from_num(1_000_000_000)) * 4);
    }

    #[test]
    fn test_unrepresentable_distance_saturates() {
        let a = Vec2Fixed::from_ints(-2_000_000_000, 0);
        let b = Vec2Fixed::from_ints(2_000_000_000, 0);
        assert_eq!(a.distance(b), Fixed::MAX);
        assert_eq!(sqrt_wide(a.distance_squared(b)), None);
    }

    #[test]
    fn test_sqrt_exact_squares() {
        assert_eq!(fixed_sqrt(Fixed::from_num(25)), Fixed::from_num(5));
        assert_eq!(fixed_sqrt(Fixed::from_num(40_000)), Fixed::from_num(200));
        assert_eq!(fixed_sqrt(Fixed::from_num(0.25)), Fixed::from_num(0.5));
        assert_eq!(fixed_sqrt(Fixed::ZERO), Fixed::ZERO);
        assert_eq!(fixed_sqrt(Fixed::from_num(-4)), Fixed::ZERO);
    }

    #[test]
    fn test_sqrt_is_floor_root() {
        let value = Fixed::from_num(2);
        let root = fixed_sqrt(value);
        assert!(root * root <= value);
        let next = root + Fixed::DELTA;
        assert!(next * next > value);
    }

    #[test]
    fn test_fixed_determinism() {
        // Same operations must produce identical results
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }

    #[test]
    fn test_to_fixed_rejects_non_finite() {
        assert!(to_fixed(f64::NAN, "speed").is_err());
        assert!(to_fixed(f64::INFINITY, "speed").is_err());
        assert!(to_fixed(1e12, "speed").is_err());
        assert_eq!(to_fixed(60.0, "speed").unwrap(), Fixed::from_num(60));
    }
}
