//! Utilities related to numbers.

use ieee754;
use num;
use std::fmt;

/// Floating point marker trait for easier control over trait bounds.
pub trait BFloat:
    Sync + Send + num::Float + num::cast::FromPrimitive + ieee754::Ieee754 + fmt::Debug
{
}

impl BFloat for f32 {}
impl BFloat for f64 {}

/// Rounds the given value to the nearest integer, or returns `None`
/// if the value is not finite or does not fit in an `i64`.
///
/// Halfway cases are rounded away from zero.
pub fn round_to_index<F: BFloat>(value: F) -> Option<i64> {
    if value.is_finite() {
        num::cast::<F, i64>(value.round())
    } else {
        None
    }
}

/// Computes the minimum and maximum of the given values, ignoring NaN.
///
/// Returns `None` if there are no non-NaN values.
pub fn finite_min_max<'a, F, I>(values: I) -> Option<[F; 2]>
where
    F: BFloat + 'a,
    I: IntoIterator<Item = &'a F>,
{
    values
        .into_iter()
        .filter(|value| !value.is_nan())
        .fold(None, |bounds, &value| match bounds {
            None => Some([value, value]),
            Some([min, max]) => Some([F::min(min, value), F::max(max, value)]),
        })
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn rounding_to_index_works() {
        assert_eq!(round_to_index(2.4999_f64), Some(2));
        assert_eq!(round_to_index(2.5_f64), Some(3));
        assert_eq!(round_to_index(-0.4_f64), Some(0));
        assert_eq!(round_to_index(-1.6_f32), Some(-2));
        assert_eq!(round_to_index(f64::NAN), None);
        assert_eq!(round_to_index(f64::INFINITY), None);
        assert_eq!(round_to_index(1e300_f64), None);
    }

    #[test]
    fn min_max_skips_nan() {
        assert_eq!(finite_min_max(&[3.0, f64::NAN, -1.0, 2.0]), Some([-1.0, 3.0]));
        assert_eq!(finite_min_max::<f64, _>(&[f64::NAN]), None);
        assert_eq!(finite_min_max::<f64, _>(&[]), None);
    }
}
