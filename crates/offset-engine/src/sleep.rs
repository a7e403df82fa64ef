//! Sleep window detection.
//!
//! Looks for the longest stretch of near-silent buckets that sits at night
//! for a given offset hypothesis. The search walks the day starting at local
//! night-start (21:00 by default), so nighttime runs are found first and win
//! ties against equivalent daytime runs.
//!
//! Two density regimes apply:
//!
//! - **Sparse** (< 50 events total): only buckets with zero events are quiet,
//!   and any event ends a run.
//! - **Normal**: buckets with up to 2 events are quiet, a lone bucket of 3–5
//!   events is tolerated, and two elevated buckets in a row end the run.
//!
//! In both regimes a bucket with more than 5 events ends a run at once.

use serde::Serialize;
use tracing::trace;

use crate::convert::{in_window, local_to_utc, normalize_hour, utc_to_local};
use crate::histogram::{
    bucket_index, bucket_start, ActivityHistogram, BUCKETS_PER_DAY, BUCKET_HOURS,
};

/// Below this many total events the histogram is treated as sparse.
pub const SPARSE_TOTAL_EVENTS: u32 = 50;

/// Quiet threshold for normal-density data.
const NORMAL_QUIET_THRESHOLD: u32 = 2;

/// A bucket above this count ends a run immediately.
const HARD_STOP_COUNT: u32 = 5;

/// Shortest run kept during the search (4h).
const MIN_RUN_BUCKETS: usize = 8;

/// Longest run grown (12h).
const MAX_RUN_BUCKETS: usize = 24;

/// Shortest window returned after refinement (3.5h).
pub const MIN_SLEEP_BUCKETS: usize = 7;

/// Length of the local night window in hours (21:00 → 09:00).
const NIGHT_HOURS: f64 = 12.0;

const WORK_START_LOCAL: f64 = 9.0;
const WORK_END_LOCAL: f64 = 17.0;

/// Runs with more than this share of buckets in local work hours score zero.
const MAX_WORK_HOURS_SHARE: f64 = 0.3;

// ── Options ─────────────────────────────────────────────────────────────────

/// Options for [`detect_sleep_with_options`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepOptions {
    /// Local hour at which the night window (and the search) begins.
    pub night_start_local: f64,
}

impl Default for SleepOptions {
    fn default() -> Self {
        Self {
            night_start_local: 21.0,
        }
    }
}

// ── Density ─────────────────────────────────────────────────────────────────

/// Data-density regime of a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Density {
    Sparse,
    Normal,
}

impl Density {
    /// Classify a histogram by its total event count.
    pub fn of(hist: &ActivityHistogram) -> Self {
        if hist.total() < SPARSE_TOTAL_EVENTS {
            Density::Sparse
        } else {
            Density::Normal
        }
    }

    /// Maximum count for a bucket to be quiet.
    pub fn quiet_threshold(self) -> u32 {
        match self {
            Density::Sparse => 0,
            Density::Normal => NORMAL_QUIET_THRESHOLD,
        }
    }
}

// ── SleepWindow ─────────────────────────────────────────────────────────────

/// A contiguous run of quiet UTC buckets, possibly wrapping past midnight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepWindow {
    /// Bucket starts in UTC, in walking order.
    pub buckets: Vec<f64>,
    /// Share of buckets inside the local night window, in `[0, 1]`.
    pub night_score: f64,
}

impl SleepWindow {
    /// The "no sleep found" window.
    pub fn empty() -> Self {
        Self {
            buckets: Vec::new(),
            night_score: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// First bucket start (UTC).
    pub fn start(&self) -> Option<f64> {
        self.buckets.first().copied()
    }

    /// End of the last bucket (UTC), wrapped into `[0, 24)`.
    pub fn end(&self) -> Option<f64> {
        self.buckets
            .last()
            .map(|&last| normalize_hour(last + BUCKET_HOURS))
    }

    pub fn duration_hours(&self) -> f64 {
        self.buckets.len() as f64 * BUCKET_HOURS
    }

    /// Centre of the window (UTC).
    pub fn midpoint(&self) -> Option<f64> {
        self.start()
            .map(|start| normalize_hour(start + self.duration_hours() / 2.0))
    }

    /// Whether the bucket containing `hour` (UTC) is part of the window.
    pub fn contains(&self, hour: f64) -> bool {
        let target = bucket_start(bucket_index(hour));
        self.buckets.iter().any(|&b| b == target)
    }
}

// ── detect_sleep ────────────────────────────────────────────────────────────

/// Detect the sleep window for `offset` with default options.
pub fn detect_sleep(hist: &ActivityHistogram, offset: i32) -> SleepWindow {
    detect_sleep_with_options(hist, offset, &SleepOptions::default())
}

/// Detect the sleep window for `offset`.
///
/// # Arguments
///
/// * `hist` — the UTC activity histogram
/// * `offset` — the UTC offset hypothesis used to place "night"
/// * `options` — the local night-start hour
///
/// # Returns
///
/// The best quiet run, refined to 3.5h–12h, or [`SleepWindow::empty`] when
/// the histogram has no events or no run qualifies.
///
/// # Examples
///
/// ```
/// use offset_engine::{detect_sleep, ActivityHistogram};
///
/// // Busy 08:00–20:00 UTC, silent otherwise.
/// let hist = ActivityHistogram::from_pairs((16..40).map(|i| (i as f64 * 0.5, 10))).unwrap();
/// let sleep = detect_sleep(&hist, 0);
/// assert!(!sleep.is_empty());
/// assert!(sleep.night_score > 0.9);
/// ```
pub fn detect_sleep_with_options(
    hist: &ActivityHistogram,
    offset: i32,
    options: &SleepOptions,
) -> SleepWindow {
    if hist.is_empty() {
        return SleepWindow::empty();
    }

    let density = Density::of(hist);
    let night_start_utc = local_to_utc(options.night_start_local, offset);
    let first = bucket_index(night_start_utc);

    let mut runs: Vec<ScoredRun> = Vec::new();
    for step in 0..BUCKETS_PER_DAY {
        let start = (first + step) % BUCKETS_PER_DAY;
        if let Some(run) = grow_run(hist, start, density) {
            if run.len() >= MIN_RUN_BUCKETS {
                let score = night_score(&run, offset, options.night_start_local);
                runs.push(ScoredRun { run, score });
            }
        }
    }

    let Some(best) = select_run(&runs, density) else {
        return SleepWindow::empty();
    };
    trace!(
        offset,
        start = bucket_start(best.run[0]),
        len = best.run.len(),
        score = best.score,
        "selected quiet run"
    );

    let refined = refine(hist, &best.run);
    if refined.is_empty() {
        return SleepWindow::empty();
    }

    let score = night_fraction(&refined, offset, options.night_start_local);
    SleepWindow {
        buckets: refined.into_iter().map(bucket_start).collect(),
        night_score: score,
    }
}

#[derive(Debug)]
struct ScoredRun {
    run: Vec<usize>,
    score: f64,
}

/// Grow a quiet run forward from bucket index `start`.
///
/// Returns `None` when the start bucket is not quiet, or when a hard stop
/// hits before the run reached the minimum length.
fn grow_run(hist: &ActivityHistogram, start: usize, density: Density) -> Option<Vec<usize>> {
    if hist.count_at(start) > density.quiet_threshold() {
        return None;
    }

    let mut run: Vec<usize> = Vec::with_capacity(MAX_RUN_BUCKETS);
    for step in 0..MAX_RUN_BUCKETS {
        let index = (start + step) % BUCKETS_PER_DAY;
        let count = hist.count_at(index);

        if count > HARD_STOP_COUNT {
            return (run.len() >= MIN_RUN_BUCKETS).then_some(run);
        }

        if let Some(&prev_index) = run.last() {
            let prev = hist.count_at(prev_index);
            match density {
                Density::Normal => {
                    if (prev >= 2 && count >= 3) || (prev >= 3 && count >= 2) {
                        if prev >= 2 {
                            run.pop();
                        }
                        break;
                    }
                }
                Density::Sparse => {
                    if count > 0 {
                        break;
                    }
                }
            }
        }

        run.push(index);
    }
    Some(run)
}

fn night_fraction(run: &[usize], offset: i32, night_start_local: f64) -> f64 {
    if run.is_empty() {
        return 0.0;
    }
    let night_end = night_start_local + NIGHT_HOURS;
    let at_night = run
        .iter()
        .filter(|&&i| {
            in_window(
                utc_to_local(bucket_start(i), offset),
                night_start_local,
                night_end,
            )
        })
        .count();
    at_night as f64 / run.len() as f64
}

fn work_hours_fraction(run: &[usize], offset: i32) -> f64 {
    if run.is_empty() {
        return 0.0;
    }
    let at_work = run
        .iter()
        .filter(|&&i| {
            in_window(
                utc_to_local(bucket_start(i), offset),
                WORK_START_LOCAL,
                WORK_END_LOCAL,
            )
        })
        .count();
    at_work as f64 / run.len() as f64
}

/// Night score of a candidate run; zero when too much of it is in work hours.
fn night_score(run: &[usize], offset: i32, night_start_local: f64) -> f64 {
    if work_hours_fraction(run, offset) > MAX_WORK_HOURS_SHARE {
        return 0.0;
    }
    night_fraction(run, offset, night_start_local)
}

/// Pick the winning run. Earlier runs (in scan order) win ties.
fn select_run(runs: &[ScoredRun], density: Density) -> Option<&ScoredRun> {
    if density == Density::Sparse {
        let mut best: Option<&ScoredRun> = None;
        for candidate in runs.iter().filter(|r| r.score > 0.5) {
            let better = match best {
                None => true,
                Some(b) => {
                    candidate.run.len() > b.run.len()
                        || (candidate.run.len() == b.run.len() && candidate.score > b.score)
                }
            };
            if better {
                best = Some(candidate);
            }
        }
        if best.is_some() {
            return best;
        }
    }

    let mut best: Option<&ScoredRun> = None;
    for candidate in runs {
        let better = match best {
            None => true,
            Some(b) => {
                candidate.score > b.score
                    || (candidate.score == b.score && candidate.run.len() > b.run.len())
            }
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}

/// Trim noisy edges off the winner and keep its longest solid stretch.
fn refine(hist: &ActivityHistogram, run: &[usize]) -> Vec<usize> {
    let mut trimmed: Vec<usize> = run.to_vec();

    while trimmed.last().is_some_and(|&i| hist.count_at(i) >= 3) {
        trimmed.pop();
    }

    let mut lead = 0;
    while lead + 1 < trimmed.len()
        && !(hist.count_at(trimmed[lead]) <= 2 && hist.count_at(trimmed[lead + 1]) <= 2)
    {
        lead += 1;
    }
    if lead + 1 >= trimmed.len() {
        return Vec::new();
    }
    trimmed.drain(..lead);

    let mut best: Vec<usize> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    for &index in &trimmed {
        let continuous = current
            .last()
            .is_none_or(|&prev| (prev + 1) % BUCKETS_PER_DAY == index);
        if !continuous {
            if current.len() >= MIN_SLEEP_BUCKETS && current.len() > best.len() {
                best = std::mem::take(&mut current);
            }
            current.clear();
        }
        current.push(index);
    }
    if current.len() >= MIN_SLEEP_BUCKETS && current.len() > best.len() {
        best = current;
    }
    best
}
