//! Busiest half-hour bucket.

use serde::Serialize;

use crate::histogram::{ActivityHistogram, BUCKET_HOURS};

/// The single busiest bucket of a histogram, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakWindow {
    /// Bucket start (UTC hour).
    pub start: f64,
    /// Bucket end (`start + 0.5`, not wrapped).
    pub end: f64,
    /// Events in the bucket.
    pub count: u32,
}

/// Find the busiest bucket.
///
/// Buckets are scanned in ascending order and only a strictly larger count
/// replaces the current best, so ties resolve to the earliest bucket.
///
/// # Returns
///
/// `None` for an empty or all-zero histogram.
///
/// # Examples
///
/// ```
/// use offset_engine::{detect_peak, ActivityHistogram};
///
/// let hist = ActivityHistogram::from_pairs([(14.0, 9), (15.5, 9), (3.0, 2)]).unwrap();
/// let peak = detect_peak(&hist).unwrap();
/// assert_eq!((peak.start, peak.end, peak.count), (14.0, 14.5, 9));
/// ```
pub fn detect_peak(hist: &ActivityHistogram) -> Option<PeakWindow> {
    let mut best: Option<PeakWindow> = None;
    for (start, count) in hist.buckets() {
        if count > best.map_or(0, |b| b.count) {
            best = Some(PeakWindow {
                start,
                end: start + BUCKET_HOURS,
                count,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_histogram_has_no_peak() {
        assert_eq!(detect_peak(&ActivityHistogram::new()), None);
    }

    #[test]
    fn test_tie_keeps_earliest_bucket() {
        let hist = ActivityHistogram::from_pairs([(20.0, 7), (6.5, 7), (12.0, 7)]).unwrap();
        let peak = detect_peak(&hist).unwrap();
        assert_eq!(peak.start, 6.5);
    }

    #[test]
    fn test_last_bucket_end_is_not_wrapped() {
        let hist = ActivityHistogram::from_pairs([(23.5, 1)]).unwrap();
        let peak = detect_peak(&hist).unwrap();
        assert_eq!((peak.start, peak.end), (23.5, 24.0));
    }

    #[test]
    fn test_deterministic_for_identical_input() {
        let hist = ActivityHistogram::from_pairs([(1.0, 3), (2.0, 5), (9.0, 5)]).unwrap();
        assert_eq!(detect_peak(&hist), detect_peak(&hist.clone()));
    }
}
