use super::*;
use crate::foundation::core::Rgba8;

fn cfg(width: u32, height: u32) -> RecorderConfig {
    RecorderConfig {
        width,
        height,
        fps: Fps::default(),
        background: Rgba8::BLACK,
    }
}

#[test]
fn odd_dimensions_are_rejected_before_spawning() {
    let mut rec = FfmpegRecorder::new();
    let err = rec.begin(cfg(15, 16)).unwrap_err();
    assert!(matches!(err, ClipError::Validation(_)));
}

#[test]
fn push_before_begin_fails() {
    let mut rec = FfmpegRecorder::new();
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 16],
        premultiplied: true,
    };
    assert!(rec.push_frame(FrameIndex(0), &frame).is_err());
    assert!(rec.finish().is_err());
}

#[test]
fn abort_without_session_is_a_no_op() {
    let mut rec = FfmpegRecorder::new();
    rec.abort();
    rec.abort();
}

#[test]
fn encodes_a_short_clip_when_ffmpeg_is_available() {
    if !is_ffmpeg_on_path() {
        let err = FfmpegRecorder::new().begin(cfg(16, 16)).unwrap_err();
        assert!(err.is_environment_unsupported());
        return;
    }

    let mut rec = FfmpegRecorder::new();
    rec.begin(cfg(16, 16)).unwrap();
    for i in 0..5u8 {
        let frame = FrameRGBA {
            width: 16,
            height: 16,
            data: [i * 40, 0, 0, 255].repeat(16 * 16),
            premultiplied: true,
        };
        rec.push_frame(FrameIndex(u64::from(i)), &frame).unwrap();
    }
    let clip = rec.finish().unwrap();
    assert_eq!(clip.mime, MP4_MIME);
    assert!(!clip.bytes.is_empty());
}
