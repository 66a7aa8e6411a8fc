//! Numerical constants shared across the crate.

use crate::Float;

pub const TWOPI: Float = 2. * std::f64::consts::PI;

/// Floor used when dividing by quantities that may have cancelled to zero.
pub const TINY_NUMBER: Float = 1.0e-20;
