use assert_cmd::Command;
use predicates::prelude::*;

fn offset_infer() -> Command {
    Command::cargo_bin("offset-infer").unwrap()
}

/// UTC-5 office worker, keyed by UTC bucket: light start 13:00, busy
/// 14:00–22:30 with a dip at 17:00 and a peak 18:30–19:30, quiet evenings.
fn eastern_worker_json() -> String {
    let mut entries = vec![("13.0".to_string(), 4), ("13.5".to_string(), 6)];
    for i in 28..46 {
        let utc = i as f64 * 0.5;
        let count = match utc {
            h if h == 17.0 => 2,
            h if h == 17.5 => 6,
            h if (18.5..20.0).contains(&h) => 24,
            _ => 18,
        };
        entries.push((format!("{utc:.1}"), count));
    }
    for i in 46..56 {
        let utc = (i % 48) as f64 * 0.5;
        entries.push((format!("{utc:.1}"), 2));
    }
    let body: Vec<String> = entries
        .iter()
        .map(|(k, v)| format!("\"{k}\": {v}"))
        .collect();
    format!("{{{}}}", body.join(", "))
}

// ── evaluate ────────────────────────────────────────────────────────────────

#[test]
fn test_evaluate_empty_histogram_prints_empty_list() {
    let output = offset_infer()
        .arg("evaluate")
        .write_stdin("{}")
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed, serde_json::json!([]));
}

#[test]
fn test_evaluate_ranks_eastern_worker() {
    let output = offset_infer()
        .arg("evaluate")
        .write_stdin(eastern_worker_json())
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let top = parsed[0]["offset"].as_i64().unwrap();
    assert!((-6..=-4).contains(&top), "top offset {top}");
    assert!(parsed[0]["adjustments"].as_array().is_some_and(|a| !a.is_empty()));
}

#[test]
fn test_evaluate_top_truncates() {
    let output = offset_infer()
        .args(["evaluate", "--top", "1"])
        .write_stdin(eastern_worker_json())
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 1);
}

#[test]
fn test_evaluate_rejects_bad_json() {
    offset_infer()
        .arg("evaluate")
        .write_stdin("not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse histogram JSON"));
}

#[test]
fn test_evaluate_rejects_off_grid_bucket() {
    offset_infer()
        .arg("evaluate")
        .write_stdin(r#"{"12.25": 4}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid bucket"));
}

#[test]
fn test_evaluate_missing_file() {
    offset_infer()
        .args(["evaluate", "/nonexistent/histogram.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

// ── bucket ──────────────────────────────────────────────────────────────────

#[test]
fn test_bucket_from_stdin() {
    let output = offset_infer()
        .arg("bucket")
        .write_stdin("2026-03-02T14:10:00Z\n2026-03-02T14:20:00-05:00\n\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed, serde_json::json!({"14.0": 1, "19.0": 1}));
}

#[test]
fn test_bucket_invalid_timestamp() {
    offset_infer()
        .arg("bucket")
        .write_stdin("tuesday\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timestamp on line 1"));
}

// ── landmarks ───────────────────────────────────────────────────────────────

#[test]
fn test_landmarks_for_offset() {
    let output = offset_infer()
        .args(["landmarks", "--offset", "-5"])
        .write_stdin(eastern_worker_json())
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["offset"], -5);
    assert_eq!(parsed["lunch"]["start"], 17.0);
    assert_eq!(parsed["peak"]["start"], 18.5);
    assert!(!parsed["sleep"]["buckets"].as_array().unwrap().is_empty());
}

#[test]
fn test_help_lists_commands() {
    offset_infer()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("evaluate"))
        .stdout(predicate::str::contains("bucket"))
        .stdout(predicate::str::contains("landmarks"));
}
