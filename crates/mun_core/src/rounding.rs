//! Rounding helpers.
//!
//! Every float → count conversion in the engine rounds half to even, so
//! `10.5 → 10` and `13.5 → 14`. Odd sector sizes with a 50 % bonus hit the
//! half-way point on every call, so the rule matters.

/// Round half to even, returned as `f64`.
#[inline]
pub fn round_half_even(x: f64) -> f64 {
    x.round_ties_even()
}

/// Round half to even into a non-negative count. NaN and negatives map to 0.
#[inline]
pub fn to_count(x: f64) -> u64 {
    if !x.is_finite() || x <= 0.0 {
        return 0;
    }
    round_half_even(x) as u64
}

/// Same as [`to_count`] for seat-sized quantities.
#[inline]
pub fn to_seats(x: f64) -> u32 {
    to_count(x).min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_go_to_even() {
        assert_eq!(round_half_even(10.5), 10.0);
        assert_eq!(round_half_even(13.5), 14.0);
        assert_eq!(round_half_even(49.5), 50.0);
        assert_eq!(round_half_even(40.75), 41.0);
    }

    #[test]
    fn counts_never_negative() {
        assert_eq!(to_count(-3.2), 0);
        assert_eq!(to_count(f64::NAN), 0);
        assert_eq!(to_count(2.5), 2);
        assert_eq!(to_seats(20.5), 20);
    }
}
