use super::*;

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
        .unwrap()
        .with_timezone(&Utc)
}

#[test]
fn blank_fields_get_fallbacks() {
    let req = GenerationRequest {
        title: "  ".to_string(),
        description: None,
        style: " trendy ".to_string(),
        prompt: String::new(),
        duration: None,
    };
    let job = VideoJob::from_request("id-1", &req, now());
    assert_eq!(job.title, FALLBACK_TITLE);
    assert_eq!(job.prompt, FALLBACK_TITLE);
    assert_eq!(job.description, FALLBACK_TITLE);
    assert_eq!(job.duration, DEFAULT_DURATION_SECS);
    assert_eq!(job.style, "trendy");
    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!((job.views, job.likes, job.shares), (0, 0, 0));
}

#[test]
fn description_defaults_to_prompt() {
    let job = VideoJob::from_request("a", &GenerationRequest::new("Hello world", 10.0, "trendy"), now());
    assert_eq!(job.description, "Hello world");
    assert_eq!(job.title, "Hello world");
    assert_eq!(job.duration, 10);
}

#[test]
fn duration_is_clamped() {
    assert_eq!(normalize_duration(Some(0.4)), 1);
    assert_eq!(normalize_duration(Some(10.0)), 10);
    assert_eq!(normalize_duration(Some(600.0)), 60);
    assert_eq!(normalize_duration(Some(-3.0)), DEFAULT_DURATION_SECS);
    assert_eq!(normalize_duration(Some(f64::NAN)), DEFAULT_DURATION_SECS);
    assert_eq!(normalize_duration(Some(f64::INFINITY)), DEFAULT_DURATION_SECS);
}

#[test]
fn status_moves_forward_only() {
    let mut job = VideoJob::from_request("a", &GenerationRequest::new("x", 5.0, ""), now());
    job.mark_completed().unwrap();
    assert!(job.mark_failed().is_err());
    assert!(job.mark_completed().is_err());
    assert_eq!(job.status, JobStatus::Completed);

    let mut job = VideoJob::from_request("b", &GenerationRequest::new("x", 5.0, ""), now());
    job.mark_failed().unwrap();
    assert!(job.mark_completed().is_err());
    assert_eq!(job.status, JobStatus::Error);
}

#[test]
fn serializes_with_camel_case_fields() {
    let job = VideoJob::from_request("a", &GenerationRequest::new("x", 5.0, "funny"), now());
    let v = serde_json::to_value(&job).unwrap();
    assert_eq!(v["createdAt"], "2026-01-02T03:04:05Z");
    assert_eq!(v["status"], "processing");
    assert!(v.get("cloudStorageUrl").is_none());

    let back: VideoJob = serde_json::from_value(v).unwrap();
    assert_eq!(back, job);
}

#[test]
fn tolerates_records_without_counters() {
    let raw = r#"{"id":"x","title":"t","duration":15,"createdAt":"2026-01-02T03:04:05Z","status":"completed"}"#;
    let job: VideoJob = serde_json::from_str(raw).unwrap();
    assert_eq!(job.shares, 0);
    assert_eq!(job.description, "");
}

#[test]
fn cloud_location_fills_urls() {
    let mut job = VideoJob::from_request("a", &GenerationRequest::new("x", 5.0, ""), now());
    job.attach_cloud(CloudLocation {
        id: "videos/a".to_string(),
        url: "https://example.invalid/a".to_string(),
        download_url: "https://example.invalid/a?dl".to_string(),
        streaming_url: "https://example.invalid/a?stream".to_string(),
        size: 42,
    });
    assert_eq!(job.cloud_storage_id.as_deref(), Some("videos/a"));
    assert_eq!(job.thumbnail, "https://example.invalid/a");
    assert_eq!(job.storage_size, Some(42));
}

#[test]
fn patch_changes_only_given_fields() {
    let mut job = VideoJob::from_request("a", &GenerationRequest::new("x", 5.0, "funny"), now());
    let patch = JobPatch {
        title: Some("New".to_string()),
        ..JobPatch::default()
    };
    assert!(!patch.is_empty());
    patch.apply(&mut job);
    assert_eq!(job.title, "New");
    assert_eq!(job.style, "funny");
}

#[test]
fn status_parses_case_insensitively() {
    assert_eq!("Completed".parse::<JobStatus>().unwrap(), JobStatus::Completed);
    assert!("draft".parse::<JobStatus>().is_err());
}
