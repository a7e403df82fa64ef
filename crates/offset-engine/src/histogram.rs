//! Half-hourly activity histogram in UTC.
//!
//! The histogram is the only input to the engine. It holds one count per
//! 30-minute bucket of the UTC day; a bucket that was never set is zero.
//! Detectors borrow it immutably for the duration of a pass.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::convert::normalize_hour;
use crate::error::{HistogramError, Result};

/// Number of half-hour buckets in a day.
pub const BUCKETS_PER_DAY: usize = 48;

/// Width of one bucket in hours.
pub const BUCKET_HOURS: f64 = 0.5;

/// Index (0..48) of the bucket containing `hour`, after wrapping modulo 24.
pub fn bucket_index(hour: f64) -> usize {
    ((normalize_hour(hour) / BUCKET_HOURS).floor() as usize) % BUCKETS_PER_DAY
}

/// Start hour of the bucket at `index` (wrapped modulo 48).
pub fn bucket_start(index: usize) -> f64 {
    (index % BUCKETS_PER_DAY) as f64 * BUCKET_HOURS
}

/// Event counts per UTC half-hour bucket.
///
/// # Examples
///
/// ```
/// use offset_engine::ActivityHistogram;
///
/// let hist = ActivityHistogram::from_pairs([(13.5, 4), (14.0, 9)]).unwrap();
/// assert_eq!(hist.count(13.5), 4);
/// assert_eq!(hist.count(13.7), 4); // same bucket
/// assert_eq!(hist.count(2.0), 0); // absent = zero
/// assert_eq!(hist.total(), 13);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityHistogram {
    counts: [u32; BUCKETS_PER_DAY],
}

impl Default for ActivityHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityHistogram {
    /// An all-zero histogram.
    pub fn new() -> Self {
        Self {
            counts: [0; BUCKETS_PER_DAY],
        }
    }

    /// Build from 48 counts, index 0 being the 00:00 UTC bucket.
    pub fn from_counts(counts: [u32; BUCKETS_PER_DAY]) -> Self {
        Self { counts }
    }

    /// Build from `(bucket_start_hour, count)` pairs.
    ///
    /// Repeated buckets accumulate.
    ///
    /// # Errors
    ///
    /// Returns [`HistogramError::InvalidBucket`] if a bucket start is not a
    /// multiple of 0.5 in `[0, 24)`.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, u32)>,
    {
        let mut hist = Self::new();
        for (bucket, count) in pairs {
            let index = checked_index(bucket)?;
            hist.counts[index] = hist.counts[index].saturating_add(count);
        }
        Ok(hist)
    }

    /// Increment the bucket containing `hour` by one event.
    ///
    /// Used by ingestion code while bucketing raw timestamps; `hour` may be
    /// fractional (e.g. 13.75 lands in the 13.5 bucket).
    pub fn record(&mut self, hour: f64) {
        let index = bucket_index(hour);
        self.counts[index] = self.counts[index].saturating_add(1);
    }

    /// Count in the bucket containing `hour`.
    pub fn count(&self, hour: f64) -> u32 {
        self.counts[bucket_index(hour)]
    }

    /// Count at bucket `index` (wrapped modulo 48).
    pub fn count_at(&self, index: usize) -> u32 {
        self.counts[index % BUCKETS_PER_DAY]
    }

    /// Combined count of both buckets in the whole UTC hour `hour` (0..24).
    pub fn hour_count(&self, hour: u32) -> u32 {
        let first = (hour as usize % 24) * 2;
        self.counts[first].saturating_add(self.counts[first + 1])
    }

    /// Sum of `len` consecutive buckets starting at the bucket containing
    /// `start`, wrapping past midnight.
    pub fn sum_span(&self, start: f64, len: usize) -> u32 {
        let first = bucket_index(start);
        (0..len)
            .map(|i| self.count_at(first + i))
            .fold(0, u32::saturating_add)
    }

    /// Total events across all buckets, saturating at `u32::MAX`.
    pub fn total(&self) -> u32 {
        self.counts.iter().fold(0, |acc, &c| acc.saturating_add(c))
    }

    /// True when no bucket holds any events.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Mean count over all 48 buckets.
    pub fn mean(&self) -> f64 {
        f64::from(self.total()) / BUCKETS_PER_DAY as f64
    }

    /// `(bucket_start_hour, count)` for every bucket in ascending order,
    /// zero buckets included.
    pub fn buckets(&self) -> impl Iterator<Item = (f64, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &c)| (bucket_start(i), c))
    }

    /// Raw counts, index 0 being 00:00 UTC.
    pub fn counts(&self) -> &[u32; BUCKETS_PER_DAY] {
        &self.counts
    }
}

fn checked_index(bucket: f64) -> Result<usize> {
    let doubled = bucket * 2.0;
    if !(0.0..24.0).contains(&bucket) || doubled.fract() != 0.0 {
        return Err(HistogramError::InvalidBucket(bucket));
    }
    Ok(doubled as usize)
}

// ── Serde ───────────────────────────────────────────────────────────────────
//
// JSON shape: {"13.5": 4, "14.0": 9}. Zero buckets are omitted on output and
// implied on input.

fn format_bucket_key(hour: f64) -> String {
    format!("{hour:.1}")
}

impl Serialize for ActivityHistogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let non_zero = self.counts.iter().filter(|&&c| c > 0).count();
        let mut map = serializer.serialize_map(Some(non_zero))?;
        for (bucket, count) in self.buckets().filter(|&(_, c)| c > 0) {
            map.serialize_entry(&format_bucket_key(bucket), &count)?;
        }
        map.end()
    }
}

impl TryFrom<BTreeMap<String, u32>> for ActivityHistogram {
    type Error = HistogramError;

    fn try_from(raw: BTreeMap<String, u32>) -> Result<Self> {
        let mut pairs = Vec::with_capacity(raw.len());
        for (key, count) in raw {
            let bucket: f64 = key
                .trim()
                .parse()
                .map_err(|_| HistogramError::InvalidKey(key.clone()))?;
            pairs.push((bucket, count));
        }
        Self::from_pairs(pairs)
    }
}

impl<'de> Deserialize<'de> for ActivityHistogram {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = BTreeMap::<String, u32>::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_index_wraps_and_floors() {
        assert_eq!(bucket_index(0.0), 0);
        assert_eq!(bucket_index(13.75), 27);
        assert_eq!(bucket_index(23.5), 47);
        assert_eq!(bucket_index(24.0), 0);
        assert_eq!(bucket_index(-0.5), 47);
    }

    #[test]
    fn test_absent_bucket_is_zero() {
        let hist = ActivityHistogram::from_pairs([(9.0, 3)]).unwrap();
        assert_eq!(hist.count(9.5), 0);
        assert_eq!(hist.count(9.0), 3);
    }

    #[test]
    fn test_from_pairs_rejects_off_grid_bucket() {
        let err = ActivityHistogram::from_pairs([(9.25, 3)]).unwrap_err();
        assert_eq!(err, HistogramError::InvalidBucket(9.25));
        assert!(ActivityHistogram::from_pairs([(24.0, 1)]).is_err());
        assert!(ActivityHistogram::from_pairs([(-0.5, 1)]).is_err());
    }

    #[test]
    fn test_from_pairs_accumulates_duplicates() {
        let hist = ActivityHistogram::from_pairs([(1.0, 2), (1.0, 5)]).unwrap();
        assert_eq!(hist.count(1.0), 7);
    }

    #[test]
    fn test_hour_count_and_span_wrap() {
        let hist = ActivityHistogram::from_pairs([(23.5, 1), (0.0, 2), (0.5, 4)]).unwrap();
        assert_eq!(hist.hour_count(0), 6);
        assert_eq!(hist.sum_span(23.5, 3), 7);
    }

    #[test]
    fn test_mean_counts_every_bucket() {
        let hist = ActivityHistogram::from_pairs([(1.0, 6), (2.0, 2)]).unwrap();
        assert!((hist.mean() - 8.0 / 48.0).abs() < 1e-12);
        assert_eq!(ActivityHistogram::new().mean(), 0.0);
    }

    #[test]
    fn test_sums_saturate_on_huge_counts() {
        let hist: ActivityHistogram =
            serde_json::from_str(r#"{"1.0": 4294967295, "1.5": 7, "2.0": 1}"#).unwrap();
        assert_eq!(hist.total(), u32::MAX);
        assert_eq!(hist.hour_count(1), u32::MAX);
        assert_eq!(hist.sum_span(1.0, 3), u32::MAX);
        assert!(hist.mean() > 0.0);
    }

    #[test]
    fn test_record_lands_in_containing_bucket() {
        let mut hist = ActivityHistogram::new();
        hist.record(13.99);
        hist.record(13.5);
        assert_eq!(hist.count(13.5), 2);
    }

    #[test]
    fn test_json_shape() {
        let hist = ActivityHistogram::from_pairs([(13.5, 4), (2.0, 1)]).unwrap();
        let json = serde_json::to_string(&hist).unwrap();
        assert_eq!(json, r#"{"2.0":1,"13.5":4}"#);
        let back: ActivityHistogram = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hist);
    }

    #[test]
    fn test_json_rejects_bad_keys() {
        let err = serde_json::from_str::<ActivityHistogram>(r#"{"noon": 3}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid bucket key"), "got: {err}");
        let err = serde_json::from_str::<ActivityHistogram>(r#"{"12.3": 3}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid bucket"), "got: {err}");
    }
}
