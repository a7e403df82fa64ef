//! Individual scoring terms of the offset evaluator.
//!
//! Each term is a pure function of a few localized measurements and returns
//! the points it contributes. The evaluator adds them up and records each
//! non-zero contribution as an [`Adjustment`].

use serde::Serialize;

use crate::convert::{circular_distance, in_window};

/// Name of a scoring term, as recorded in a candidate's trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringRule {
    SleepMidpoint,
    SleepOnset,
    GlobalLunchProximity,
    LunchTiming,
    LunchDipStrength,
    WeakLateLunch,
    NoLunch,
    WorkStart,
    EveningActivity,
    WorkHoursOccupancy,
    PeakTiming,
    PacificPattern,
    MountainPattern,
    EasternPattern,
    SouthAmericaPattern,
    AustraliaPattern,
    EuropePattern,
    PopulationPrior,
    EuropeanMorningVeto,
    ScoreFloor,
}

impl ScoringRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringRule::SleepMidpoint => "sleep_midpoint",
            ScoringRule::SleepOnset => "sleep_onset",
            ScoringRule::GlobalLunchProximity => "global_lunch_proximity",
            ScoringRule::LunchTiming => "lunch_timing",
            ScoringRule::LunchDipStrength => "lunch_dip_strength",
            ScoringRule::WeakLateLunch => "weak_late_lunch",
            ScoringRule::NoLunch => "no_lunch",
            ScoringRule::WorkStart => "work_start",
            ScoringRule::EveningActivity => "evening_activity",
            ScoringRule::WorkHoursOccupancy => "work_hours_occupancy",
            ScoringRule::PeakTiming => "peak_timing",
            ScoringRule::PacificPattern => "pacific_pattern",
            ScoringRule::MountainPattern => "mountain_pattern",
            ScoringRule::EasternPattern => "eastern_pattern",
            ScoringRule::SouthAmericaPattern => "south_america_pattern",
            ScoringRule::AustraliaPattern => "australia_pattern",
            ScoringRule::EuropePattern => "europe_pattern",
            ScoringRule::PopulationPrior => "population_prior",
            ScoringRule::EuropeanMorningVeto => "european_morning_veto",
            ScoringRule::ScoreFloor => "score_floor",
        }
    }
}

impl std::fmt::Display for ScoringRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One applied scoring term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Adjustment {
    pub rule: ScoringRule,
    pub delta: f64,
}

/// Running score plus its trace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scorecard {
    score: f64,
    adjustments: Vec<Adjustment>,
}

impl Scorecard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` under `rule`. Zero deltas leave no trace.
    pub fn apply(&mut self, rule: ScoringRule, delta: f64) {
        if delta != 0.0 {
            self.score += delta;
            self.adjustments.push(Adjustment { rule, delta });
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn adjustments(&self) -> &[Adjustment] {
        &self.adjustments
    }

    /// Clamp the score at zero, recording the lift if one was needed.
    pub fn floor_at_zero(&mut self) {
        if self.score < 0.0 {
            self.apply(ScoringRule::ScoreFloor, -self.score);
        }
    }

    pub fn into_parts(self) -> (f64, Vec<Adjustment>) {
        (self.score, self.adjustments)
    }
}

// ── Sleep ───────────────────────────────────────────────────────────────────

/// Localized sleep window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepSignal {
    pub midpoint_local: f64,
    pub onset_local: f64,
}

fn is_nighttime(hour: f64) -> bool {
    in_window(hour, 22.0, 7.0)
}

/// Points for where the sleep midpoint falls: 10 for 01:00–04:00, 3 for
/// any other nighttime placement, nothing in daytime.
pub fn sleep_midpoint_score(signal: &SleepSignal) -> f64 {
    let m = signal.midpoint_local;
    if (1.0..=4.0).contains(&m) {
        10.0
    } else if is_nighttime(m) {
        3.0
    } else {
        0.0
    }
}

/// Extra points for going to bed 21:00–23:00 with a nighttime midpoint.
pub fn sleep_onset_score(signal: &SleepSignal) -> f64 {
    if is_nighttime(signal.midpoint_local) && (21.0..=23.0).contains(&signal.onset_local) {
        5.0
    } else {
        0.0
    }
}

// ── Lunch ───────────────────────────────────────────────────────────────────

/// Points for the offset-translated global lunch start, scaled by the
/// pattern's confidence.
pub fn global_lunch_proximity_score(local_start: f64, confidence: f64) -> f64 {
    let distance = circular_distance(local_start, 12.0);
    let tier = if distance <= 0.5 {
        10.0
    } else if distance <= 1.0 {
        7.0
    } else if distance <= 1.5 {
        4.0
    } else if distance <= 2.0 {
        2.0
    } else {
        0.0
    };
    tier * confidence
}

/// Localized lunch window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LunchSignal {
    pub start_local: f64,
    pub midpoint_local: f64,
    pub drop_ratio: f64,
}

/// Banded points by local lunch start, best at 11:45–12:15.
pub fn lunch_timing_score(signal: &LunchSignal) -> f64 {
    let s = signal.start_local;
    if (11.75..=12.25).contains(&s) {
        12.0
    } else if (11.5..=12.5).contains(&s) {
        9.0
    } else if (11.0..=13.0).contains(&s) {
        6.0
    } else if (10.5..=13.5).contains(&s) {
        3.0
    } else {
        1.0
    }
}

/// Up to 8 points for the depth of the dip.
pub fn lunch_dip_score(signal: &LunchSignal) -> f64 {
    (signal.drop_ratio * 8.0).clamp(0.0, 8.0)
}

/// Penalty that cuts a weak (drop under 50%) lunch centred past 13:30 down
/// to 30% of its points. `lunch_points` is what timing and dip strength
/// awarded.
pub fn weak_late_lunch_penalty(signal: &LunchSignal, lunch_points: f64) -> f64 {
    if signal.midpoint_local > 13.5 && signal.drop_ratio < 0.5 {
        -lunch_points * 0.7
    } else {
        0.0
    }
}

/// Flat penalty when no lunch dip exists for the offset.
pub const NO_LUNCH_PENALTY: f64 = -5.0;

// ── Work day ────────────────────────────────────────────────────────────────

/// Points for the local hour of the first significant activity.
///
/// 07:00–09:00 is ideal. Anything before 05:00 is penalized 10 points per
/// hour of earliness, down to -50 at midnight.
pub fn work_start_score(local_hour: f64) -> f64 {
    let h = local_hour;
    if h < 5.0 {
        -((5.0 - h) * 10.0).min(50.0)
    } else if (7.0..=9.0).contains(&h) {
        8.0
    } else if (6.0..7.0).contains(&h) || (9.0..10.0).contains(&h) {
        4.0
    } else if (10.0..=12.0).contains(&h) {
        2.0
    } else {
        0.0
    }
}

/// Offsets (US Eastern, standard and daylight) expected to show evening work.
const EASTERN_OFFSETS: std::ops::RangeInclusive<i32> = -5..=-4;

/// Points for the share of activity in local 19:00–23:00.
pub fn evening_activity_score(offset: i32, evening_events: u32, total_events: u32) -> f64 {
    if total_events == 0 {
        return 0.0;
    }
    let share = f64::from(evening_events) / f64::from(total_events);
    if share > 0.3 {
        1.0
    } else if EASTERN_OFFSETS.contains(&offset) && share < 0.1 {
        -2.0
    } else {
        0.0
    }
}

/// Up to 2 points for the share of activity in local 09:00–17:00.
pub fn work_hours_score(share: f64) -> f64 {
    2.0 * share.clamp(0.0, 1.0)
}

/// Points for the local hour of the busiest bucket.
pub fn peak_timing_score(peak_local: f64) -> f64 {
    if (13.0..15.0).contains(&peak_local) {
        5.0
    } else if (10.0..13.0).contains(&peak_local) || (15.0..17.0).contains(&peak_local) {
        2.0
    } else if peak_local >= 19.0 {
        -10.0
    } else {
        0.0
    }
}

// ── Vetoes ──────────────────────────────────────────────────────────────────

/// Offsets treated as European for the morning veto.
pub const EUROPEAN_OFFSETS: std::ops::RangeInclusive<i32> = 0..=3;

/// A European offset with no activity at all 08:00–10:00 local loses most
/// of its accumulated score (at most 15 points).
pub fn european_morning_veto(offset: i32, morning_events: u32, score_so_far: f64) -> f64 {
    if EUROPEAN_OFFSETS.contains(&offset) && morning_events == 0 && score_so_far > 0.0 {
        -(score_so_far * 0.75).min(15.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lunch_at(start: f64, duration: f64, drop_ratio: f64) -> LunchSignal {
        LunchSignal {
            start_local: start,
            midpoint_local: start + duration / 2.0,
            drop_ratio,
        }
    }

    // ── scorecard ───────────────────────────────────────────────────────

    #[test]
    fn test_scorecard_skips_zero_and_floors() {
        let mut card = Scorecard::new();
        card.apply(ScoringRule::PeakTiming, 0.0);
        card.apply(ScoringRule::WorkStart, -20.0);
        card.apply(ScoringRule::PopulationPrior, 4.5);
        assert_eq!(card.adjustments().len(), 2);
        card.floor_at_zero();
        assert_eq!(card.score(), 0.0);
        assert_eq!(card.adjustments().last().unwrap().rule, ScoringRule::ScoreFloor);
        assert_eq!(card.adjustments().last().unwrap().delta, 15.5);
    }

    #[test]
    fn test_rule_names_are_snake_case() {
        assert_eq!(ScoringRule::EuropeanMorningVeto.to_string(), "european_morning_veto");
        let json = serde_json::to_string(&ScoringRule::SouthAmericaPattern).unwrap();
        assert_eq!(json, "\"south_america_pattern\"");
    }

    // ── sleep ───────────────────────────────────────────────────────────

    #[test]
    fn test_sleep_midpoint_bands() {
        let at = |m: f64| SleepSignal {
            midpoint_local: m,
            onset_local: 22.0,
        };
        assert_eq!(sleep_midpoint_score(&at(3.0)), 10.0);
        assert_eq!(sleep_midpoint_score(&at(23.0)), 3.0);
        assert_eq!(sleep_midpoint_score(&at(5.5)), 3.0);
        assert_eq!(sleep_midpoint_score(&at(14.0)), 0.0);
    }

    #[test]
    fn test_sleep_onset_needs_nighttime_midpoint() {
        let good = SleepSignal {
            midpoint_local: 3.0,
            onset_local: 22.0,
        };
        let daytime = SleepSignal {
            midpoint_local: 12.0,
            onset_local: 22.0,
        };
        assert_eq!(sleep_onset_score(&good), 5.0);
        assert_eq!(sleep_onset_score(&daytime), 0.0);
        assert!(sleep_midpoint_score(&good) + sleep_onset_score(&good) <= 15.0);
    }

    // ── lunch ───────────────────────────────────────────────────────────

    #[test]
    fn test_global_lunch_proximity_tiers() {
        assert_eq!(global_lunch_proximity_score(12.0, 1.0), 10.0);
        assert_eq!(global_lunch_proximity_score(11.0, 0.5), 3.5);
        assert_eq!(global_lunch_proximity_score(13.5, 1.0), 4.0);
        assert_eq!(global_lunch_proximity_score(18.0, 1.0), 0.0);
    }

    #[test]
    fn test_lunch_timing_peaks_at_noon() {
        let noon = lunch_timing_score(&lunch_at(12.0, 1.0, 0.5));
        let early = lunch_timing_score(&lunch_at(11.0, 1.0, 0.5));
        let late = lunch_timing_score(&lunch_at(13.5, 1.0, 0.5));
        assert!(noon > early && early > late);
        assert!(noon + lunch_dip_score(&lunch_at(12.0, 1.0, 1.0)) <= 20.0);
    }

    #[test]
    fn test_weak_late_lunch_keeps_thirty_percent() {
        let late = lunch_at(13.0, 1.5, 0.3);
        assert!((weak_late_lunch_penalty(&late, 10.0) + 7.0).abs() < 1e-12);
        let strong = lunch_at(13.0, 1.5, 0.8);
        assert_eq!(weak_late_lunch_penalty(&strong, 10.0), 0.0);
        let on_time = lunch_at(12.0, 1.0, 0.3);
        assert_eq!(weak_late_lunch_penalty(&on_time, 10.0), 0.0);
    }

    // ── work day ────────────────────────────────────────────────────────

    #[test]
    fn test_work_start_penalties_scale() {
        assert_eq!(work_start_score(8.0), 8.0);
        assert_eq!(work_start_score(9.5), 4.0);
        assert_eq!(work_start_score(4.0), -10.0);
        assert_eq!(work_start_score(0.0), -50.0);
        assert_eq!(work_start_score(19.0), 0.0);
    }

    #[test]
    fn test_evening_activity() {
        assert_eq!(evening_activity_score(1, 40, 100), 1.0);
        assert_eq!(evening_activity_score(-5, 5, 100), -2.0);
        assert_eq!(evening_activity_score(1, 5, 100), 0.0);
        assert_eq!(evening_activity_score(-5, 0, 0), 0.0);
    }

    #[test]
    fn test_peak_timing() {
        assert_eq!(peak_timing_score(14.0), 5.0);
        assert_eq!(peak_timing_score(11.0), 2.0);
        assert_eq!(peak_timing_score(21.5), -10.0);
        assert_eq!(peak_timing_score(6.0), 0.0);
    }

    #[test]
    fn test_european_morning_veto() {
        assert_eq!(european_morning_veto(1, 0, 40.0), -15.0);
        assert_eq!(european_morning_veto(1, 0, 8.0), -6.0);
        assert_eq!(european_morning_veto(1, 3, 40.0), 0.0);
        assert_eq!(european_morning_veto(-5, 0, 40.0), 0.0);
    }
}
