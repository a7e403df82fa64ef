//! UTC ↔ local hour arithmetic.
//!
//! Every hour in the engine is an `f64` on a 24-hour circle. Conversions
//! never fail: out-of-range input is wrapped, not rejected.

/// Hours in a day.
pub const HOURS_PER_DAY: f64 = 24.0;

/// Wrap any hour value into `[0, 24)`.
pub fn normalize_hour(hour: f64) -> f64 {
    let wrapped = hour.rem_euclid(HOURS_PER_DAY);
    // rem_euclid can return 24.0 for tiny negative inputs due to rounding.
    if wrapped >= HOURS_PER_DAY {
        0.0
    } else {
        wrapped
    }
}

/// Convert a UTC hour to local time at `offset`: `(hour + offset) mod 24`.
///
/// # Examples
///
/// ```
/// use offset_engine::convert::utc_to_local;
///
/// assert_eq!(utc_to_local(14.0, -5), 9.0);
/// assert_eq!(utc_to_local(23.5, 2), 1.5);
/// ```
pub fn utc_to_local(hour: f64, offset: i32) -> f64 {
    normalize_hour(hour + f64::from(offset))
}

/// Convert a local hour at `offset` back to UTC: `(hour - offset) mod 24`.
///
/// Exact inverse of [`utc_to_local`].
pub fn local_to_utc(hour: f64, offset: i32) -> f64 {
    normalize_hour(hour - f64::from(offset))
}

/// Shortest distance between two hours on the 24-hour circle, in `[0, 12]`.
pub fn circular_distance(a: f64, b: f64) -> f64 {
    let d = normalize_hour(a - b);
    d.min(HOURS_PER_DAY - d)
}

/// Whether `hour` falls in the half-open window `[start, end)`, where the
/// window may wrap past midnight (e.g. `[21, 9)`).
pub fn in_window(hour: f64, start: f64, end: f64) -> bool {
    let hour = normalize_hour(hour);
    let start = normalize_hour(start);
    let end = normalize_hour(end);
    if start <= end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_utc_to_local_wraps_forward() {
        assert_eq!(utc_to_local(22.0, 5), 3.0);
        assert_eq!(utc_to_local(0.0, 14), 14.0);
    }

    #[test]
    fn test_utc_to_local_wraps_backward() {
        assert_eq!(utc_to_local(2.0, -5), 21.0);
        assert_eq!(utc_to_local(0.0, -12), 12.0);
    }

    #[test]
    fn test_local_to_utc_eastern() {
        // 09:00 in UTC-4 is 13:00 UTC
        assert_eq!(local_to_utc(9.0, -4), 13.0);
    }

    #[test]
    fn test_out_of_range_input_is_normalized() {
        assert_eq!(utc_to_local(30.0, 0), 6.0);
        assert_eq!(utc_to_local(-1.5, 0), 22.5);
        assert_eq!(local_to_utc(48.5, 0), 0.5);
    }

    #[test]
    fn test_circular_distance() {
        assert_eq!(circular_distance(23.0, 1.0), 2.0);
        assert_eq!(circular_distance(12.0, 12.0), 0.0);
        assert_eq!(circular_distance(0.0, 12.0), 12.0);
    }

    #[test]
    fn test_in_window_plain_and_wrapping() {
        assert!(in_window(10.0, 9.0, 17.0));
        assert!(!in_window(17.0, 9.0, 17.0));
        assert!(in_window(23.5, 21.0, 9.0));
        assert!(in_window(3.0, 21.0, 9.0));
        assert!(!in_window(12.0, 21.0, 9.0));
    }

    proptest! {
        #[test]
        fn prop_round_trip(bucket in 0u32..48, offset in -12i32..=14) {
            let h = f64::from(bucket) * 0.5;
            prop_assert_eq!(local_to_utc(utc_to_local(h, offset), offset), h);
            prop_assert_eq!(utc_to_local(local_to_utc(h, offset), offset), h);
        }

        #[test]
        fn prop_result_in_range(h in -100.0f64..100.0, offset in -12i32..=14) {
            let local = utc_to_local(h, offset);
            prop_assert!((0.0..24.0).contains(&local));
        }
    }
}
