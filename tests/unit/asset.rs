use super::*;

#[test]
fn sanitize_replaces_everything_outside_lowercase_alnum() {
    assert_eq!(sanitize_title("Hello World!"), "hello-world-");
    assert_eq!(sanitize_title("Top 10 Tips"), "top-10-tips");
    assert_eq!(sanitize_title("café"), "caf-");
    assert_eq!(sanitize_title(""), "");
}

#[test]
fn filename_carries_timestamp_and_extension() {
    assert_eq!(
        asset_filename("My Clip", 1_700_000_000_123, "mp4"),
        "my-clip-1700000000123.mp4"
    );
}

#[test]
fn video_flag_follows_mime() {
    let mut asset = RenderedAsset {
        bytes: vec![1, 2, 3],
        mime: "video/mp4".to_string(),
        filename: "x.mp4".to_string(),
        frames_captured: 3,
        truncated: false,
    };
    assert!(asset.is_video());
    assert_eq!(asset.len(), 3);

    asset.mime = "image/png".to_string();
    assert!(!asset.is_video());
}
