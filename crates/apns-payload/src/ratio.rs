//! Bounded fractional value.

use serde::{Deserialize, Serialize};

use crate::errors::RatioError;

/// A value expected to lie in `[0.0, 1.0]`.
///
/// Construction does not clamp; the bound is only enforced by [`Ratio::validate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ratio(pub f64);

impl Ratio {
    /// Wrap a raw value without checking it.
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// The raw value.
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Whether the value is zero (omitted on the wire).
    #[allow(clippy::trivially_copy_pass_by_ref, clippy::float_cmp)]
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Check that the value lies in `[0.0, 1.0]`.
    pub fn validate(self) -> Result<(), RatioError> {
        if (0.0..=1.0).contains(&self.0) {
            Ok(())
        } else {
            Err(RatioError(self.0))
        }
    }
}

impl From<f64> for Ratio {
    fn from(value: f64) -> Self {
        Self(value)
    }
}
