//! Missing-value sentinel shared by every gridded field.

/// Sentinel stored in place of missing or invalid samples.
pub const BAD_DATA: f64 = -9999.0;

/// Returns true for the bad-data sentinel (and NaN, which never compares).
///
/// Always use this instead of `==` on computed values.
#[inline]
pub fn is_bad_data(value: f64) -> bool {
    value.is_nan() || (value - BAD_DATA).abs() < crate::EPSILON
}

pub trait FloatExt {
    fn approximately_eq(self, other: Self) -> bool;
    fn is_bad_data(self) -> bool;
}

impl FloatExt for f32 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON as f32
    }

    fn is_bad_data(self) -> bool {
        is_bad_data(self as f64)
    }
}

impl FloatExt for f64 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON
    }

    fn is_bad_data(self) -> bool {
        is_bad_data(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_is_bad() {
        assert!(is_bad_data(BAD_DATA));
        assert!(is_bad_data(-9999.0000001));
        assert!(BAD_DATA.is_bad_data());
        assert!((BAD_DATA as f32).is_bad_data());
    }

    #[test]
    fn test_nan_is_bad() {
        assert!(is_bad_data(f64::NAN));
        assert!(f32::NAN.is_bad_data());
    }

    #[test]
    fn test_valid_values_are_not_bad() {
        for v in [0.0, -9998.0, 9999.0, 1e-12, -1.0] {
            assert!(!is_bad_data(v), "{v} flagged as bad");
        }
    }

    #[test]
    fn test_approximately_eq() {
        assert!(1.0_f64.approximately_eq(1.0));
        assert!((0.1_f64 + 0.2_f64).approximately_eq(0.3));
        assert!(!1.0_f64.approximately_eq(1.001));
        assert!(!f64::NAN.approximately_eq(f64::NAN));
    }
}
