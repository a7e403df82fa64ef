//! Bucket classification against a candidate.
//!
//! Presentation code (histogram renderers, prompt builders) uses these to
//! annotate UTC buckets without re-running detection.

use serde::Serialize;

use crate::evaluate::Candidate;
use crate::histogram::{bucket_index, bucket_start};

/// What a bucket means under a given candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketRole {
    Peak,
    Lunch,
    Sleep,
    Other,
}

/// Whether the UTC bucket containing `hour` is in the candidate's sleep window.
pub fn is_sleep_bucket(candidate: &Candidate, hour: f64) -> bool {
    candidate.sleep.contains(hour)
}

/// Whether the UTC bucket containing `hour` is in the candidate's lunch window.
pub fn is_lunch_bucket(candidate: &Candidate, hour: f64) -> bool {
    candidate.lunch.is_some_and(|l| l.contains(hour))
}

/// Whether the UTC bucket containing `hour` is the peak bucket.
pub fn is_peak_bucket(candidate: &Candidate, hour: f64) -> bool {
    candidate
        .peak
        .is_some_and(|p| bucket_start(bucket_index(p.start)) == bucket_start(bucket_index(hour)))
}

/// Role of the UTC bucket containing `hour`. Peak beats lunch beats sleep.
pub fn classify_bucket(candidate: &Candidate, hour: f64) -> BucketRole {
    if is_peak_bucket(candidate, hour) {
        BucketRole::Peak
    } else if is_lunch_bucket(candidate, hour) {
        BucketRole::Lunch
    } else if is_sleep_bucket(candidate, hour) {
        BucketRole::Sleep
    } else {
        BucketRole::Other
    }
}
