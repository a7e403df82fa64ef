//! Per-offset lunch detection.
//!
//! For one offset hypothesis, searches local starts 10:00–14:00 in half-hour
//! steps and durations of 30, 60 and 90 minutes for a dip in activity
//! relative to the hour before. Each surviving window is scored; the best
//! one is returned in UTC.

use serde::Serialize;
use tracing::trace;

use crate::convert::{circular_distance, local_to_utc, normalize_hour, utc_to_local};
use crate::histogram::{bucket_index, bucket_start, ActivityHistogram, BUCKET_HOURS};

/// Candidate window durations in hours.
pub const LUNCH_DURATIONS: [f64; 3] = [0.5, 1.0, 1.5];

const SEARCH_FROM_LOCAL: f64 = 10.0;
const SEARCH_TO_LOCAL: f64 = 14.0;

/// Accepted local starts are `[10:30, 13:30)`.
const EARLIEST_START_LOCAL: f64 = 10.5;
const LATEST_START_LOCAL: f64 = 13.5;

/// Midpoints people commonly take lunch around.
pub const STANDARD_LUNCH_MIDPOINTS: [f64; 3] = [12.0, 11.5, 12.5];

/// Offsets (Western/Central Europe through Moscow) where early lunches are
/// uncommon.
const EARLY_LUNCH_PENALTY_OFFSETS: std::ops::RangeInclusive<i32> = -1..=3;

/// A detected lunch dip, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LunchWindow {
    /// Window start (UTC hour).
    pub start: f64,
    /// One of [`LUNCH_DURATIONS`].
    pub duration: f64,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f64,
    /// Fractional activity drop versus the preceding hour.
    pub drop_ratio: f64,
}

impl LunchWindow {
    /// Window end (UTC), wrapped into `[0, 24)`.
    pub fn end(&self) -> f64 {
        normalize_hour(self.start + self.duration)
    }

    /// Window centre (UTC).
    pub fn midpoint(&self) -> f64 {
        normalize_hour(self.start + self.duration / 2.0)
    }

    /// Local start at `offset`.
    pub fn local_start(&self, offset: i32) -> f64 {
        utc_to_local(self.start, offset)
    }

    /// Whether the bucket containing `hour` (UTC) is inside the window.
    pub fn contains(&self, hour: f64) -> bool {
        let first = bucket_index(self.start);
        let len = (self.duration / BUCKET_HOURS).round() as usize;
        let target = bucket_index(hour);
        (0..len).any(|i| bucket_index(bucket_start(first + i)) == target)
    }
}

/// Minimum activity in the lookback before a window, by histogram volume.
pub fn min_pre_activity(total_events: u32) -> u32 {
    match total_events {
        0..=49 => 3,
        50..=199 => 10,
        200..=499 => 15,
        _ => 20,
    }
}

/// Activity before a candidate window.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PreActivity {
    total: u32,
    per_bucket: f64,
}

/// Measure the activity before `utc_start`.
///
/// Tries the preceding hour, then the preceding two hours. Sparse histograms
/// also fall back to the stretch 2.5–4h before the window. A window whose
/// midpoint is within half an hour of noon only needs some activity.
fn pre_activity(
    hist: &ActivityHistogram,
    utc_start: f64,
    total_events: u32,
    near_noon: bool,
) -> Option<PreActivity> {
    let minimum = min_pre_activity(total_events);
    let passes = |sum: u32| if near_noon { sum > 0 } else { sum > minimum };

    let lookbacks: &[(f64, usize)] = if total_events < 50 {
        &[(1.0, 2), (2.0, 4), (4.0, 4)]
    } else {
        &[(1.0, 2), (2.0, 4)]
    };

    lookbacks.iter().find_map(|&(hours_back, buckets)| {
        let sum = hist.sum_span(utc_start - hours_back, buckets);
        passes(sum).then(|| PreActivity {
            total: sum,
            per_bucket: f64::from(sum) / buckets as f64,
        })
    })
}

/// Distance from `midpoint` to the nearest standard lunch midpoint.
pub fn distance_from_standard(midpoint: f64) -> f64 {
    STANDARD_LUNCH_MIDPOINTS
        .iter()
        .map(|&m| circular_distance(midpoint, m))
        .fold(f64::INFINITY, f64::min)
}

/// Required drop ratio for a window whose midpoint is `distance` hours from
/// the nearest standard time.
fn drop_threshold(distance: f64, quick_lunch: bool) -> f64 {
    let base: f64 = if distance <= 0.25 {
        0.2
    } else if distance <= 0.5 {
        0.3
    } else if distance <= 1.0 {
        0.4
    } else {
        0.6
    };
    if quick_lunch {
        base.min(0.45)
    } else {
        base
    }
}

fn pre_strength_multiplier(pre_per_bucket: f64, mean: f64) -> f64 {
    if mean <= 0.0 {
        1.0
    } else if pre_per_bucket >= 3.0 * mean {
        1.5
    } else if pre_per_bucket >= 2.0 * mean {
        1.3
    } else if pre_per_bucket >= mean {
        1.1
    } else {
        1.0
    }
}

fn proximity_multiplier(distance: f64) -> f64 {
    match (distance / BUCKET_HOURS).round() as u32 {
        0 => 1.5,
        1 => 1.25,
        2 => 1.1,
        _ => 1.0,
    }
}

/// A window that passed every gate.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoredLunch {
    local_start: f64,
    duration: f64,
    drop_ratio: f64,
    score: f64,
}

/// Score one `(local_start, duration)` window, or `None` if it is rejected.
fn score_window(
    hist: &ActivityHistogram,
    offset: i32,
    local_start: f64,
    duration: f64,
) -> Option<ScoredLunch> {
    if !(EARLIEST_START_LOCAL..LATEST_START_LOCAL).contains(&local_start) {
        return None;
    }

    let total_events = hist.total();
    let utc_start = local_to_utc(local_start, offset);
    let midpoint = local_start + duration / 2.0;
    let near_noon = (11.5..=12.5).contains(&midpoint);

    let pre = pre_activity(hist, utc_start, total_events, near_noon)?;

    let buckets = (duration / BUCKET_HOURS).round() as usize;
    let window_sum = hist.sum_span(utc_start, buckets);
    let window_avg = f64::from(window_sum) / buckets as f64;
    let drop_ratio = (pre.per_bucket - window_avg) / pre.per_bucket;

    let post_avg = f64::from(hist.sum_span(utc_start + duration, 2)) / 2.0;
    let recovery = if pre.per_bucket > window_avg {
        (post_avg - window_avg) / (pre.per_bucket - window_avg)
    } else {
        0.0
    };

    let quick_lunch = drop_ratio > 0.5 && recovery >= 0.4;
    let distance = distance_from_standard(midpoint);
    if drop_ratio <= drop_threshold(distance, quick_lunch) {
        return None;
    }

    let mut score = drop_ratio * pre_strength_multiplier(pre.per_bucket, hist.mean());

    if window_sum == 0 {
        let minimum = min_pre_activity(total_events);
        score *= if pre.total >= 2 * minimum { 10.0 } else { 5.0 };
    }

    let mut effective_duration = duration;
    if duration == 0.5 {
        if recovery >= 0.7 {
            score *= 1.8;
        } else if recovery >= 0.4 {
            score *= 1.4;
        } else {
            // Activity stays low afterwards: this is the front of a longer break.
            effective_duration = 1.0;
            score *= 0.7;
        }
    } else if duration == 1.0 {
        score *= 1.2;
    } else {
        score *= 0.9;
    }

    score *= proximity_multiplier(distance);

    if EARLY_LUNCH_PENALTY_OFFSETS.contains(&offset) && midpoint < 11.5 {
        score *= 0.6;
    }

    trace!(offset, local_start, duration, drop_ratio, score, "lunch window accepted");

    Some(ScoredLunch {
        local_start,
        duration: effective_duration,
        drop_ratio,
        score,
    })
}

/// Confidence of an accepted window.
fn lunch_confidence(drop_ratio: f64, local_start: f64) -> f64 {
    let mut confidence: f64 = 0.3;
    if drop_ratio > 0.2 {
        confidence += 0.3;
    }
    if (11.5..=13.0).contains(&local_start) {
        confidence += 0.2;
    }
    confidence.min(1.0)
}

/// Find the lunch dip for one offset hypothesis.
///
/// # Returns
///
/// The highest-scoring window converted to UTC, or `None` when no window
/// shows a convincing dip. Ties keep the earliest (start, duration) found.
///
/// # Examples
///
/// ```
/// use offset_engine::{detect_lunch, ActivityHistogram};
///
/// // UTC-4: steady work 09:00–17:00 local with a gap at 12:00 local (16:00 UTC).
/// let hist = ActivityHistogram::from_pairs(
///     (26..42).filter(|&i| i != 32).map(|i| (i as f64 * 0.5, 20)),
/// )
/// .unwrap();
/// let lunch = detect_lunch(&hist, -4).unwrap();
/// assert_eq!(lunch.local_start(-4), 12.0);
/// ```
pub fn detect_lunch(hist: &ActivityHistogram, offset: i32) -> Option<LunchWindow> {
    let steps = ((SEARCH_TO_LOCAL - SEARCH_FROM_LOCAL) / BUCKET_HOURS) as usize;
    let best = (0..=steps)
        .map(|i| SEARCH_FROM_LOCAL + i as f64 * BUCKET_HOURS)
        .flat_map(|local_start| {
            LUNCH_DURATIONS
                .into_iter()
                .filter_map(move |duration| score_window(hist, offset, local_start, duration))
        })
        .fold(None::<ScoredLunch>, |best, candidate| match best {
            Some(b) if candidate.score <= b.score => Some(b),
            _ => Some(candidate),
        })?;

    Some(LunchWindow {
        start: local_to_utc(best.local_start, offset),
        duration: best.duration,
        confidence: lunch_confidence(best.drop_ratio, best.local_start),
        drop_ratio: best.drop_ratio,
    })
}
