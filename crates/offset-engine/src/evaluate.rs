//! Offset candidate evaluation.
//!
//! For every integer offset in range, the evaluator localizes the detected
//! landmarks (sleep, lunch, first activity, peak, evening load), adds up the
//! scoring terms from [`crate::scoring`] and [`crate::region`], and keeps the
//! offsets that clear the minimum score. The result is a ranked evidence
//! list, not a verdict.

use serde::Serialize;
use tracing::debug;

use crate::convert::{local_to_utc, utc_to_local};
use crate::global_lunch::{detect_global_lunch, GlobalLunchPattern};
use crate::histogram::ActivityHistogram;
use crate::lunch::{detect_lunch, LunchWindow};
use crate::peak::{detect_peak, PeakWindow};
use crate::region::{population_prior, regional_bonuses};
use crate::scoring::{
    european_morning_veto, evening_activity_score, global_lunch_proximity_score,
    lunch_dip_score, lunch_timing_score, peak_timing_score, sleep_midpoint_score,
    sleep_onset_score, weak_late_lunch_penalty, work_hours_score, work_start_score, Adjustment,
    LunchSignal, Scorecard, ScoringRule, SleepSignal, NO_LUNCH_PENALTY,
};
use crate::sleep::{detect_sleep_with_options, SleepOptions, SleepWindow};

/// An hour needs more than this many events to count as significant activity.
const SIGNIFICANT_HOUR_EVENTS: u32 = 5;

// ── Options ─────────────────────────────────────────────────────────────────

/// Options for [`evaluate_offsets_with_options`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatorOptions {
    /// Lowest offset tested.
    pub min_offset: i32,
    /// Highest offset tested.
    pub max_offset: i32,
    /// Candidates scoring below this are dropped.
    pub min_score: f64,
    /// Sleep search options, applied to every offset.
    pub sleep: SleepOptions,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            min_offset: -12,
            max_offset: 14,
            min_score: 10.0,
            sleep: SleepOptions::default(),
        }
    }
}

// ── Landmarks ───────────────────────────────────────────────────────────────

/// Offset-independent detections, computed once per histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Landmarks {
    pub peak: Option<PeakWindow>,
    pub global_lunch: GlobalLunchPattern,
}

impl Landmarks {
    pub fn detect(hist: &ActivityHistogram) -> Self {
        Self {
            peak: detect_peak(hist),
            global_lunch: detect_global_lunch(hist),
        }
    }
}

// ── Candidate ───────────────────────────────────────────────────────────────

/// One scored offset hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// UTC offset in whole hours.
    pub offset: i32,
    /// Heuristic score used for ranking; not a probability.
    pub confidence: f64,
    /// Sleep window found for this offset (UTC buckets).
    pub sleep: SleepWindow,
    /// Lunch window found for this offset (UTC).
    pub lunch: Option<LunchWindow>,
    /// Busiest bucket of the histogram (UTC).
    pub peak: Option<PeakWindow>,
    /// Local sleep start.
    pub sleep_start_local: Option<f64>,
    /// Local sleep midpoint.
    pub sleep_midpoint_local: Option<f64>,
    /// Local lunch start.
    pub lunch_start_local: Option<f64>,
    /// Local lunch end.
    pub lunch_end_local: Option<f64>,
    /// Local hour of the first UTC hour with significant activity.
    pub work_start_local: Option<f64>,
    /// Local start of the peak bucket.
    pub peak_local: Option<f64>,
    /// Events in local 19:00–23:00.
    pub evening_activity: u32,
    /// Every scoring term applied, in order.
    pub adjustments: Vec<Adjustment>,
}

impl Candidate {
    /// Sum of deltas recorded for `rule`.
    pub fn delta_for(&self, rule: ScoringRule) -> f64 {
        self.adjustments
            .iter()
            .filter(|a| a.rule == rule)
            .map(|a| a.delta)
            .sum()
    }
}

// ── Evaluation ──────────────────────────────────────────────────────────────

/// Evaluate all offsets -12..=+14 with default options.
///
/// # Examples
///
/// ```
/// use offset_engine::{evaluate_offsets, ActivityHistogram};
///
/// assert!(evaluate_offsets(&ActivityHistogram::new()).is_empty());
/// ```
pub fn evaluate_offsets(hist: &ActivityHistogram) -> Vec<Candidate> {
    evaluate_offsets_with_options(hist, &EvaluatorOptions::default())
}

/// Evaluate every offset in `options`' range and rank the survivors.
///
/// # Returns
///
/// Candidates with a score of at least `options.min_score`, sorted by
/// descending score. Equal scores keep ascending offset order. An empty
/// histogram, or one where no offset clears the threshold, yields an empty
/// list.
pub fn evaluate_offsets_with_options(
    hist: &ActivityHistogram,
    options: &EvaluatorOptions,
) -> Vec<Candidate> {
    if hist.is_empty() {
        return Vec::new();
    }

    let landmarks = Landmarks::detect(hist);
    let mut candidates: Vec<Candidate> = (options.min_offset..=options.max_offset)
        .map(|offset| evaluate_offset_with_landmarks(hist, offset, &landmarks, &options.sleep))
        .filter(|c| c.confidence >= options.min_score)
        .collect();

    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    candidates
}

/// Score a single offset, detecting landmarks on the way.
pub fn evaluate_offset(hist: &ActivityHistogram, offset: i32) -> Candidate {
    evaluate_offset_with_landmarks(hist, offset, &Landmarks::detect(hist), &SleepOptions::default())
}

/// Score a single offset against precomputed landmarks.
///
/// The score is floored at zero but not filtered.
pub fn evaluate_offset_with_landmarks(
    hist: &ActivityHistogram,
    offset: i32,
    landmarks: &Landmarks,
    sleep_options: &SleepOptions,
) -> Candidate {
    let total = hist.total();
    let mut card = Scorecard::new();

    // Sleep
    let sleep = detect_sleep_with_options(hist, offset, sleep_options);
    let sleep_signal = sleep.start().zip(sleep.midpoint()).map(|(start, mid)| SleepSignal {
        midpoint_local: utc_to_local(mid, offset),
        onset_local: utc_to_local(start, offset),
    });
    if let Some(signal) = &sleep_signal {
        card.apply(ScoringRule::SleepMidpoint, sleep_midpoint_score(signal));
        card.apply(ScoringRule::SleepOnset, sleep_onset_score(signal));
    }

    // Global lunch anchor
    let global = &landmarks.global_lunch;
    if global.is_found() {
        let local_start = utc_to_local(global.start, offset);
        card.apply(
            ScoringRule::GlobalLunchProximity,
            global_lunch_proximity_score(local_start, global.confidence),
        );
    }

    // Local lunch
    let lunch = detect_lunch(hist, offset);
    match &lunch {
        Some(window) => {
            let start_local = window.local_start(offset);
            let signal = LunchSignal {
                start_local,
                midpoint_local: start_local + window.duration / 2.0,
                drop_ratio: window.drop_ratio,
            };
            let timing = lunch_timing_score(&signal);
            let dip = lunch_dip_score(&signal);
            card.apply(ScoringRule::LunchTiming, timing);
            card.apply(ScoringRule::LunchDipStrength, dip);
            card.apply(ScoringRule::WeakLateLunch, weak_late_lunch_penalty(&signal, timing + dip));
        }
        None => card.apply(ScoringRule::NoLunch, NO_LUNCH_PENALTY),
    }

    // Work start
    let work_start_local = first_significant_hour(hist).map(|h| utc_to_local(h, offset));
    if let Some(local) = work_start_local {
        card.apply(ScoringRule::WorkStart, work_start_score(local));
    }

    // Evening and work-hours load
    let evening_activity = hist.sum_span(local_to_utc(19.0, offset), 8);
    card.apply(
        ScoringRule::EveningActivity,
        evening_activity_score(offset, evening_activity, total),
    );
    let work_hours_events = hist.sum_span(local_to_utc(9.0, offset), 16);
    card.apply(
        ScoringRule::WorkHoursOccupancy,
        work_hours_score(f64::from(work_hours_events) / f64::from(total.max(1))),
    );

    // Peak
    let peak_local = landmarks.peak.map(|p| utc_to_local(p.start, offset));
    if let Some(local) = peak_local {
        card.apply(ScoringRule::PeakTiming, peak_timing_score(local));
    }

    // Regional signatures and prior
    for (rule, bonus) in regional_bonuses(hist, offset) {
        card.apply(rule, bonus);
    }
    card.apply(ScoringRule::PopulationPrior, population_prior(offset));

    // European morning veto
    let morning_events = hist.sum_span(local_to_utc(8.0, offset), 4);
    let veto = european_morning_veto(offset, morning_events, card.score());
    card.apply(ScoringRule::EuropeanMorningVeto, veto);

    card.floor_at_zero();
    let (confidence, adjustments) = card.into_parts();
    debug!(offset, confidence, terms = adjustments.len(), "evaluated offset");

    Candidate {
        offset,
        confidence,
        sleep_start_local: sleep_signal.map(|s| s.onset_local),
        sleep_midpoint_local: sleep_signal.map(|s| s.midpoint_local),
        lunch_start_local: lunch.map(|l| l.local_start(offset)),
        lunch_end_local: lunch.map(|l| utc_to_local(l.end(), offset)),
        work_start_local,
        peak_local,
        evening_activity,
        sleep,
        lunch,
        peak: landmarks.peak,
        adjustments,
    }
}

/// First UTC hour (scanning 00 → 23) with more than 5 events.
fn first_significant_hour(hist: &ActivityHistogram) -> Option<f64> {
    (0..24u32)
        .find(|&h| hist.hour_count(h) > SIGNIFICANT_HOUR_EVENTS)
        .map(f64::from)
}
