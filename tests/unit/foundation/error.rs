use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ClipError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ClipError::unsupported("x")
            .to_string()
            .contains("environment unsupported:")
    );
    assert!(ClipError::layout("x").to_string().contains("layout error:"));
    assert!(
        ClipError::corrupt("x")
            .to_string()
            .contains("storage corrupt:")
    );
    assert!(ClipError::upload("x").to_string().contains("upload failed:"));
    assert!(
        ClipError::not_found("abc")
            .to_string()
            .contains("job not found: abc")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ClipError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn serde_errors_convert() {
    let err: ClipError = serde_json::from_str::<Vec<u32>>("{nope")
        .unwrap_err()
        .into();
    assert!(matches!(err, ClipError::Serde(_)));
}

#[test]
fn environment_unsupported_is_detectable() {
    assert!(ClipError::unsupported("no ffmpeg").is_environment_unsupported());
    assert!(!ClipError::capture("broken pipe").is_environment_unsupported());
}
