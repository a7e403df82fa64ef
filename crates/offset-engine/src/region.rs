//! Regional activity signatures and the population prior.
//!
//! The signature checks look for a compact workday with a silent night at
//! fixed UTC positions typical of a region. Regions overlap in offset (UTC-7
//! is checked as both Pacific daylight and Mountain standard time) and every
//! matching check adds its own bonus.

use crate::convert::local_to_utc;
use crate::histogram::ActivityHistogram;
use crate::scoring::ScoringRule;

/// A UTC-positioned day/night signature.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Signature {
    /// UTC start of the expected 9-hour working block.
    day_start_utc: f64,
    /// UTC start of the expected 6-hour silent block.
    night_start_utc: f64,
    /// Bonus for a strong match.
    strong: f64,
    /// Bonus for a partial match.
    partial: f64,
}

const WORKDAY_HOURS: usize = 9;
const NIGHT_HOURS: usize = 6;

fn share(hist: &ActivityHistogram, start: f64, hours: usize, total: f64) -> f64 {
    f64::from(hist.sum_span(start, hours * 2)) / total
}

impl Signature {
    fn bonus(&self, hist: &ActivityHistogram) -> f64 {
        let total = f64::from(hist.total());
        if total <= 0.0 {
            return 0.0;
        }
        let day = share(hist, self.day_start_utc, WORKDAY_HOURS, total);
        let night = share(hist, self.night_start_utc, NIGHT_HOURS, total);
        if day >= 0.6 && night <= 0.05 {
            self.strong
        } else if day >= 0.45 && night <= 0.1 {
            self.partial
        } else {
            0.0
        }
    }
}

/// US/Canada Pacific: work 16:00–01:00 UTC, silent 07:00–13:00 UTC.
fn pacific_bonus(hist: &ActivityHistogram, offset: i32) -> f64 {
    if offset != -8 && offset != -7 {
        return 0.0;
    }
    Signature {
        day_start_utc: 16.0,
        night_start_utc: 7.0,
        strong: 8.0,
        partial: 4.0,
    }
    .bonus(hist)
}

/// US/Canada Mountain: work 15:00–00:00 UTC, silent 06:00–12:00 UTC.
fn mountain_bonus(hist: &ActivityHistogram, offset: i32) -> f64 {
    if offset != -7 && offset != -6 {
        return 0.0;
    }
    Signature {
        day_start_utc: 15.0,
        night_start_utc: 6.0,
        strong: 6.0,
        partial: 3.0,
    }
    .bonus(hist)
}

/// US/Canada Eastern: work 13:00–22:00 UTC, silent 04:00–10:00 UTC.
fn eastern_bonus(hist: &ActivityHistogram, offset: i32) -> f64 {
    if offset != -5 && offset != -4 {
        return 0.0;
    }
    Signature {
        day_start_utc: 13.0,
        night_start_utc: 4.0,
        strong: 8.0,
        partial: 4.0,
    }
    .bonus(hist)
}

/// Brazil/Argentina: work 12:00–21:00 UTC, silent 03:00–09:00 UTC.
fn south_america_bonus(hist: &ActivityHistogram, offset: i32) -> f64 {
    if offset != -3 {
        return 0.0;
    }
    Signature {
        day_start_utc: 12.0,
        night_start_utc: 3.0,
        strong: 5.0,
        partial: 2.5,
    }
    .bonus(hist)
}

/// Australian east coast: work 22:00–07:00 UTC, silent 13:00–19:00 UTC.
fn australia_bonus(hist: &ActivityHistogram, offset: i32) -> f64 {
    if offset != 10 {
        return 0.0;
    }
    Signature {
        day_start_utc: 22.0,
        night_start_utc: 13.0,
        strong: 6.0,
        partial: 3.0,
    }
    .bonus(hist)
}

/// Europe (UTC+0 to UTC+3): work 08:00–17:00 local, silent 23:00–05:00 local.
fn europe_bonus(hist: &ActivityHistogram, offset: i32) -> f64 {
    if !(0..=3).contains(&offset) {
        return 0.0;
    }
    Signature {
        day_start_utc: local_to_utc(8.0, offset),
        night_start_utc: local_to_utc(23.0, offset),
        strong: 6.0,
        partial: 3.0,
    }
    .bonus(hist)
}

/// Every regional bonus that applies to `offset`, in a fixed order.
pub fn regional_bonuses(hist: &ActivityHistogram, offset: i32) -> [(ScoringRule, f64); 6] {
    [
        (ScoringRule::PacificPattern, pacific_bonus(hist, offset)),
        (ScoringRule::MountainPattern, mountain_bonus(hist, offset)),
        (ScoringRule::EasternPattern, eastern_bonus(hist, offset)),
        (ScoringRule::SouthAmericaPattern, south_america_bonus(hist, offset)),
        (ScoringRule::AustraliaPattern, australia_bonus(hist, offset)),
        (ScoringRule::EuropePattern, europe_bonus(hist, offset)),
    ]
}

/// Prior reflecting the relative density of software developers per offset.
pub fn population_prior(offset: i32) -> f64 {
    match offset {
        -12 => -12.0,
        -11 => -10.0,
        -10 => -6.0,
        -9 => -4.0,
        -8 => 4.0,
        -7 => 2.0,
        -6 => 2.5,
        -5 => 4.5,
        -4 => 3.0,
        -3 => 2.0,
        -2 => -4.0,
        -1 => -5.0,
        0 => 3.0,
        1 => 4.5,
        2 => 3.0,
        3 => 2.0,
        4 => -1.0,
        5 => 1.0,
        6 => -2.0,
        7 => 1.0,
        8 => 3.5,
        9 => 2.5,
        10 => 2.0,
        11 => -3.0,
        12 => -1.0,
        13 => -6.0,
        14 => -8.0,
        _ => -12.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::in_window;
    use crate::histogram::{bucket_start, BUCKETS_PER_DAY};

    fn busy_utc(from: f64, to: f64) -> ActivityHistogram {
        let mut counts = [0u32; BUCKETS_PER_DAY];
        for (i, slot) in counts.iter_mut().enumerate() {
            if in_window(bucket_start(i), from, to) {
                *slot = 10;
            }
        }
        ActivityHistogram::from_counts(counts)
    }

    fn bonus_total(hist: &ActivityHistogram, offset: i32) -> f64 {
        regional_bonuses(hist, offset).iter().map(|(_, b)| b).sum()
    }

    #[test]
    fn test_eastern_signature() {
        let hist = busy_utc(13.0, 22.0);
        assert_eq!(eastern_bonus(&hist, -5), 8.0);
        assert_eq!(eastern_bonus(&hist, -4), 8.0);
        assert_eq!(eastern_bonus(&hist, -6), 0.0);
    }

    #[test]
    fn test_overlapping_regions_stack() {
        // A workday matching both the Pacific and Mountain windows.
        let hist = busy_utc(16.0, 0.0);
        assert_eq!(pacific_bonus(&hist, -7), 8.0);
        assert!(mountain_bonus(&hist, -7) > 0.0);
        assert!(bonus_total(&hist, -7) > pacific_bonus(&hist, -7));
    }

    #[test]
    fn test_europe_signature_follows_offset() {
        let hist = busy_utc(7.0, 16.0); // 08:00–17:00 at UTC+1
        assert_eq!(europe_bonus(&hist, 1), 6.0);
        assert_eq!(europe_bonus(&hist, -5), 0.0);
    }

    #[test]
    fn test_night_activity_blocks_bonus() {
        let hist = busy_utc(0.0, 0.0); // empty window, no events
        assert_eq!(bonus_total(&hist, -5), 0.0);
        let all_day = ActivityHistogram::from_counts([5; BUCKETS_PER_DAY]);
        assert_eq!(bonus_total(&all_day, -5), 0.0);
    }

    #[test]
    fn test_bonuses_bounded() {
        let hist = busy_utc(16.0, 0.0);
        for offset in -12..=14 {
            let total = bonus_total(&hist, offset);
            assert!((0.0..=25.0).contains(&total), "offset {offset}: {total}");
        }
    }

    #[test]
    fn test_population_prior_range() {
        for offset in -12..=14 {
            let prior = population_prior(offset);
            assert!((-12.0..=4.5).contains(&prior), "offset {offset}");
        }
        assert_eq!(population_prior(-5), 4.5);
        assert_eq!(population_prior(1), 4.5);
    }
}
