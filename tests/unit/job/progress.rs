use super::*;

#[test]
fn phase_percents_match_checkpoints() {
    let percents: Vec<u8> = std::iter::once(Phase::Queued)
        .chain(Phase::WORK)
        .map(Phase::percent)
        .collect();
    assert_eq!(percents, vec![0, 5, 15, 30, 50, 75, 90]);
}

#[test]
fn start_reports_queued_and_rejects_duplicates() {
    let t = ProgressTracker::new();
    let s = t.start("a").unwrap();
    assert_eq!(s.percent, 0);
    assert_eq!(s.status, JobStatus::Processing);
    assert_eq!(s.step_label, Phase::Queued.label());
    assert!(t.start("a").is_err());
}

#[test]
fn advance_is_monotonic() {
    let t = ProgressTracker::new();
    t.start("a").unwrap();
    assert!(t.advance("a", Phase::Frames));
    assert!(!t.advance("a", Phase::Analyzing));
    assert_eq!(t.get("a").unwrap().percent, 30);
    assert!(t.advance("a", Phase::Frames));
    assert!(t.advance("a", Phase::Finalizing));
    assert_eq!(t.get("a").unwrap().percent, 90);
}

#[test]
fn exactly_one_terminal_transition() {
    let t = ProgressTracker::new();
    t.start("a").unwrap();
    t.advance("a", Phase::Rendering);
    assert!(t.complete("a"));
    assert!(!t.fail("a", "late"));
    assert!(!t.complete("a"));
    assert!(!t.advance("a", Phase::Finalizing));

    let s = t.get("a").unwrap();
    assert_eq!(s.status, JobStatus::Completed);
    assert_eq!(s.percent, 100);
    assert_eq!(s.step_label, COMPLETED_LABEL);
    assert!(s.error.is_none());
}

#[test]
fn failure_resets_percent_and_keeps_message() {
    let t = ProgressTracker::new();
    t.start("a").unwrap();
    t.advance("a", Phase::Effects);
    assert!(t.fail("a", "encoder crashed"));
    assert!(!t.complete("a"));

    let s = t.get("a").unwrap();
    assert_eq!(s.status, JobStatus::Error);
    assert_eq!(s.percent, 0);
    assert_eq!(s.phase, Phase::Effects);
    assert_eq!(s.error.as_deref(), Some("encoder crashed"));
}

#[test]
fn unknown_ids_are_absent_or_not_found() {
    let t = ProgressTracker::new();
    assert!(t.get("nope").is_none());
    assert!(matches!(t.require("nope"), Err(ClipError::JobNotFound(_))));
    assert!(!t.advance("nope", Phase::Analyzing));
    assert!(!t.complete("nope"));
    assert!(!t.fail("nope", "x"));
}

#[test]
fn removed_jobs_ignore_later_updates() {
    let t = ProgressTracker::new();
    t.start("a").unwrap();
    assert!(t.remove("a").is_some());
    assert!(t.remove("a").is_none());
    assert!(!t.advance("a", Phase::Analyzing));
    assert!(!t.complete("a"));
    assert!(!t.contains("a"));
}

#[test]
fn consume_only_reaps_terminal_jobs() {
    let t = ProgressTracker::new();
    t.start("a").unwrap();
    assert!(t.consume("a").is_none());
    t.complete("a");
    assert_eq!(t.consume("a").unwrap().percent, 100);
    assert!(t.get("a").is_none());
}

#[test]
fn events_mirror_state_changes() {
    let t = ProgressTracker::new();
    let mut rx = t.subscribe();
    t.start("a").unwrap();
    t.advance("a", Phase::Analyzing);
    t.complete("a");

    let seen: Vec<(u8, JobStatus)> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|s| (s.percent, s.status))
        .collect();
    assert_eq!(
        seen,
        vec![
            (0, JobStatus::Processing),
            (5, JobStatus::Processing),
            (100, JobStatus::Completed)
        ]
    );
}

#[test]
fn state_serializes_camel_case() {
    let t = ProgressTracker::new();
    let s = t.start("a").unwrap();
    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(v["jobId"], "a");
    assert_eq!(v["stepLabel"], Phase::Queued.label());
    assert_eq!(v["phase"], "queued");
}
