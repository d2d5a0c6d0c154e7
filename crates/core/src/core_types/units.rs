//! Semantic unit types for physical quantities
//!
//! The absorption model takes temperatures as [`Kelvin`] at its single-cell API so a
//! Celsius value or a bare pressure cannot be passed in its place. Field kernels
//! work on raw `f64` storage and convert at the boundary.
//!
//! # Usage
//! ```
//! use p1rad_core::core_types::units::Kelvin;
//!
//! let t = Kelvin::new(610.0);
//! assert!((*t - 610.0).abs() < 1e-12);
//! assert!(t > Kelvin::new(300.0));
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

/// Temperature in Kelvin (absolute scale)
///
/// Ordered with `f64::total_cmp`, so NaN sorts above every finite temperature.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kelvin(f64);

impl Eq for Kelvin {}

impl PartialOrd for Kelvin {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Kelvin {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Deref for Kelvin {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Kelvin {
    /// Absolute zero
    pub const ABSOLUTE_ZERO: Kelvin = Kelvin(0.0);

    /// Create a new Kelvin temperature. Asserts value >= absolute zero (0 K).
    ///
    /// NaN fails the assertion. Values read from solver storage that may be NaN
    /// go through [`Kelvin::from_field`], where the table lookup clamps them to the
    /// lowest bin.
    ///
    /// # Panics
    ///
    /// Panics if `value` is negative or NaN
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(
            value >= 0.0,
            "Kelvin::new: value is NaN or below absolute zero (0 K)"
        );
        Kelvin(value)
    }

    /// Create from a raw field value without validation
    ///
    /// Field kernels read temperatures straight out of solver storage, where a
    /// transient negative or NaN value must be clamped by the table lookup rather
    /// than abort the whole sweep.
    #[inline]
    #[must_use]
    pub const fn from_field(value: f64) -> Self {
        Kelvin(value)
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl From<Kelvin> for f64 {
    fn from(k: Kelvin) -> f64 {
        k.0
    }
}

impl fmt::Display for Kelvin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} K", self.0)
    }
}
