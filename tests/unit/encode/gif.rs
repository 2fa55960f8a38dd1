use super::*;
use crate::foundation::core::{Fps, Rgba8};

fn cfg() -> RecorderConfig {
    RecorderConfig {
        width: 4,
        height: 4,
        fps: Fps::new(10, 1).unwrap(),
        background: Rgba8::BLACK,
    }
}

fn solid(r: u8) -> FrameRGBA {
    FrameRGBA {
        width: 4,
        height: 4,
        data: [r, 0, 0, 255].repeat(16),
        premultiplied: true,
    }
}

#[test]
fn encodes_an_animated_gif() {
    let mut rec = GifRecorder::new();
    rec.begin(cfg()).unwrap();
    rec.push_frame(FrameIndex(0), &solid(0)).unwrap();
    rec.push_frame(FrameIndex(1), &solid(200)).unwrap();
    let clip = rec.finish().unwrap();

    assert_eq!(clip.mime, GIF_MIME);
    assert_eq!(clip.extension, "gif");
    assert_eq!(&clip.bytes[..6], b"GIF89a");
    assert_eq!(clip.bytes.last(), Some(&0x3b));
}

#[test]
fn out_of_order_frames_are_rejected() {
    let mut rec = GifRecorder::new();
    rec.begin(cfg()).unwrap();
    rec.push_frame(FrameIndex(3), &solid(0)).unwrap();
    assert!(rec.push_frame(FrameIndex(3), &solid(0)).is_err());
    rec.abort();
}

#[test]
fn abort_discards_and_allows_restart() {
    let mut rec = GifRecorder::new();
    rec.begin(cfg()).unwrap();
    rec.push_frame(FrameIndex(0), &solid(10)).unwrap();
    rec.abort();
    assert!(rec.finish().is_err());

    rec.begin(cfg()).unwrap();
    rec.push_frame(FrameIndex(0), &solid(10)).unwrap();
    assert!(rec.finish().is_ok());
}

#[test]
fn wrong_frame_size_is_rejected() {
    let mut rec = GifRecorder::new();
    rec.begin(cfg()).unwrap();
    let mut frame = solid(0);
    frame.data.truncate(4);
    assert!(rec.push_frame(FrameIndex(0), &frame).is_err());
}
