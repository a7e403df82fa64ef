//! # offset-engine
//!
//! Deterministic UTC-offset inference from activity timing.
//!
//! Given a histogram of someone's public activity per UTC half-hour, the
//! engine finds behavioural landmarks (sleep, lunch, peak productivity) and
//! ranks every whole-hour UTC offset by how well those landmarks line up
//! with a typical local day. It performs no I/O and holds no state: every
//! function is a pure computation over a borrowed histogram, safe to call
//! from any number of threads at once.
//!
//! ## Modules
//!
//! - [`histogram`] — the half-hourly UTC [`ActivityHistogram`]
//! - [`convert`] — UTC ↔ local hour arithmetic on the 24-hour circle
//! - [`peak`] — busiest bucket
//! - [`sleep`] — nighttime quiet-window detection
//! - [`lunch`] — per-offset midday dip detection
//! - [`global_lunch`] — offset-independent lunch anchor on the UTC axis
//! - [`scoring`] — individual scoring terms and the adjustment trace
//! - [`region`] — regional activity signatures and the population prior
//! - [`evaluate`] — per-offset scoring and candidate ranking
//! - [`classify`] — bucket predicates for presentation layers
//! - [`error`] — Error types
//!
//! Absence of a signal is never an error: detectors return `None`, an empty
//! window or a zero-confidence sentinel, and the evaluator returns an empty
//! list when no offset clears the minimum score.

pub mod classify;
pub mod convert;
pub mod error;
pub mod evaluate;
pub mod global_lunch;
pub mod histogram;
pub mod lunch;
pub mod peak;
pub mod region;
pub mod scoring;
pub mod sleep;

pub use classify::{classify_bucket, is_lunch_bucket, is_peak_bucket, is_sleep_bucket, BucketRole};
pub use convert::{local_to_utc, utc_to_local};
pub use error::HistogramError;
pub use evaluate::{
    evaluate_offset, evaluate_offset_with_landmarks, evaluate_offsets,
    evaluate_offsets_with_options, Candidate, EvaluatorOptions, Landmarks,
};
pub use global_lunch::{detect_global_lunch, GlobalLunchPattern};
pub use histogram::ActivityHistogram;
pub use lunch::{detect_lunch, LunchWindow};
pub use peak::{detect_peak, PeakWindow};
pub use scoring::{Adjustment, ScoringRule};
pub use sleep::{detect_sleep, detect_sleep_with_options, Density, SleepOptions, SleepWindow};
