//! Offset-independent lunch anchor.
//!
//! Scans UTC starts 15:00–21:00 (local noon for offsets roughly -3 through -9)
//! for the strongest dip in activity. The result does not assume any offset;
//! the evaluator translates it into each hypothesis and rewards offsets that
//! place it near local noon.

use serde::Serialize;
use tracing::trace;

use crate::histogram::{ActivityHistogram, BUCKET_HOURS};

const SCAN_FROM_UTC: f64 = 15.0;
const SCAN_TO_UTC: f64 = 21.0;

/// Window lengths tried, in buckets.
const WINDOW_BUCKETS: [usize; 3] = [1, 2, 3];

/// A window may not average more than this share of the global mean.
const MAX_WINDOW_TO_MEAN: f64 = 0.8;

/// A lunch-shaped dip found directly on the UTC axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlobalLunchPattern {
    /// Dip start (UTC hour), `-1` when nothing was found.
    pub start: f64,
    /// Dip end (UTC hour, not wrapped), `-1` when nothing was found.
    pub end: f64,
    /// Confidence in `[0, 1]`; zero means no pattern.
    pub confidence: f64,
    /// Drop versus the preceding hour, in percent.
    pub drop_percent: f64,
}

impl GlobalLunchPattern {
    /// The "no pattern" sentinel.
    pub fn none() -> Self {
        Self {
            start: -1.0,
            end: -1.0,
            confidence: 0.0,
            drop_percent: 0.0,
        }
    }

    pub fn is_found(&self) -> bool {
        self.confidence > 0.0
    }
}

/// Find the strongest UTC lunch dip in the histogram.
///
/// A window qualifies when activity drops more than 25% against the hour
/// before it (or more than 15% with post-window activity at least twice the
/// window average) and the window averages no more than 80% of the global
/// mean. Qualifying windows are ranked by drop size, quietness, recovery and
/// a bonus for one-hour windows.
///
/// # Returns
///
/// The best pattern, or [`GlobalLunchPattern::none`].
pub fn detect_global_lunch(hist: &ActivityHistogram) -> GlobalLunchPattern {
    let mean = hist.mean();
    if mean <= 0.0 {
        return GlobalLunchPattern::none();
    }

    let steps = ((SCAN_TO_UTC - SCAN_FROM_UTC) / BUCKET_HOURS) as usize;
    let mut best: Option<(f64, GlobalLunchPattern)> = None;

    for step in 0..=steps {
        let start = SCAN_FROM_UTC + step as f64 * BUCKET_HOURS;
        for &buckets in &WINDOW_BUCKETS {
            let Some((score, pattern)) = score_window(hist, start, buckets, mean) else {
                continue;
            };
            if best.is_none_or(|(best_score, _)| score > best_score) {
                best = Some((score, pattern));
            }
        }
    }

    match best {
        Some((score, pattern)) => {
            trace!(start = pattern.start, score, "global lunch pattern");
            pattern
        }
        None => GlobalLunchPattern::none(),
    }
}

fn score_window(
    hist: &ActivityHistogram,
    start: f64,
    buckets: usize,
    mean: f64,
) -> Option<(f64, GlobalLunchPattern)> {
    let span = buckets as f64 * BUCKET_HOURS;
    let pre_avg = f64::from(hist.sum_span(start - 1.0, 2)) / 2.0;
    if pre_avg <= 0.0 {
        return None;
    }
    let window_avg = f64::from(hist.sum_span(start, buckets)) / buckets as f64;
    let post_avg = f64::from(hist.sum_span(start + span, 2)) / 2.0;

    let drop = (pre_avg - window_avg) / pre_avg;
    let drop_percent = drop * 100.0;
    let recovers = post_avg > 0.0 && post_avg >= 2.0 * window_avg;
    if !(drop_percent > 25.0 || (drop_percent > 15.0 && recovers)) {
        return None;
    }
    if window_avg > MAX_WINDOW_TO_MEAN * mean {
        return None;
    }

    let quietness = (1.0 - window_avg / mean).clamp(0.0, 1.0);
    let recovery = (post_avg / pre_avg).min(1.0);

    let mut score = drop * (1.0 + quietness) * (1.0 + 0.5 * recovery);
    let mut confidence = 0.6 * drop + 0.3 * quietness + 0.1 * recovery;
    if buckets == 2 {
        score *= 1.2;
        confidence += 0.05;
    }

    Some((
        score,
        GlobalLunchPattern {
            start,
            end: start + span,
            confidence: confidence.clamp(0.0, 1.0),
            drop_percent,
        },
    ))
}
