use super::*;
use crate::encode::sink::{EncodedClip, InMemoryRecorder};

#[derive(Default)]
struct CountingRecorder {
    begun: usize,
    pushed: usize,
    finished: usize,
    aborted: usize,
    fail_begin: bool,
}

impl Recorder for CountingRecorder {
    fn begin(&mut self, _cfg: RecorderConfig) -> ClipResult<()> {
        self.begun += 1;
        if self.fail_begin {
            return Err(ClipError::unsupported("no recorder on this host"));
        }
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, _frame: &FrameRGBA) -> ClipResult<()> {
        self.pushed += 1;
        Ok(())
    }

    fn finish(&mut self) -> ClipResult<EncodedClip> {
        self.finished += 1;
        Ok(EncodedClip {
            bytes: vec![1, 2, 3],
            mime: "video/test",
            extension: "bin",
        })
    }

    fn abort(&mut self) {
        self.aborted += 1;
    }
}

fn tiny() -> CapturePipeline {
    CapturePipeline::new(
        Canvas {
            width: 2,
            height: 2,
        },
        Fps::new(10, 1).unwrap(),
    )
}

fn blank(_: FrameIndex) -> ClipResult<FrameRGBA> {
    Ok(FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0, 0, 0, 255].repeat(4),
        premultiplied: true,
    })
}

#[test]
fn frame_budget_follows_duration_and_fps() {
    let p = tiny();
    assert_eq!(p.frame_budget(1.5), 15);
    assert_eq!(p.frame_budget(0.0), 1);
    assert_eq!(p.frame_budget(f64::NAN), 1);
}

#[test]
fn records_every_frame_in_order() {
    let mut rec = InMemoryRecorder::new();
    let asset = tiny()
        .capture(&mut rec, &mut blank, 1.0, "Hello World")
        .unwrap();

    assert_eq!(asset.frames_captured, 10);
    assert!(!asset.truncated);
    assert_eq!(asset.bytes.len(), 10 * 16);
    assert!(asset.filename.starts_with("hello-world-"));
    assert!(asset.filename.ends_with(".rgba"));

    let idx: Vec<u64> = rec.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, (0..10).collect::<Vec<_>>());
}

#[test]
fn unsupported_recorder_is_reported_and_released() {
    let mut recorder = CountingRecorder {
        fail_begin: true,
        ..CountingRecorder::default()
    };
    let err = tiny()
        .capture(&mut recorder, &mut blank, 1.0, "x")
        .unwrap_err();
    assert!(err.is_environment_unsupported());
    assert_eq!(recorder.pushed, 0);
    assert_eq!(recorder.aborted, 1);
}

#[test]
fn frame_errors_abort_the_session() {
    let mut recorder = CountingRecorder::default();
    let mut failing = |idx: FrameIndex| {
        if idx.0 == 3 {
            Err(ClipError::layout("boom"))
        } else {
            blank(idx)
        }
    };
    let err = tiny()
        .capture(&mut recorder, &mut failing, 1.0, "x")
        .unwrap_err();
    assert!(matches!(err, ClipError::Layout(_)));
    assert_eq!(recorder.pushed, 3);
    assert_eq!(recorder.finished, 0);
    assert_eq!(recorder.aborted, 1);
}

#[test]
fn successful_capture_finishes_without_abort() {
    let mut recorder = CountingRecorder::default();
    let asset = tiny().capture(&mut recorder, &mut blank, 0.5, "x").unwrap();
    assert_eq!(asset.mime, "video/test");
    assert_eq!(recorder.finished, 1);
    assert_eq!(recorder.aborted, 0);
}

#[test]
fn safety_cap_truncates_instead_of_failing() {
    let mut recorder = CountingRecorder::default();
    let mut slow = |idx: FrameIndex| {
        std::thread::sleep(Duration::from_millis(20));
        blank(idx)
    };
    let asset = tiny()
        .with_safety_cap(Duration::from_millis(60))
        .capture(&mut recorder, &mut slow, 60.0, "x")
        .unwrap();
    assert!(asset.truncated);
    assert!(asset.frames_captured >= 1);
    assert!(asset.frames_captured < 600);
    assert_eq!(recorder.finished, 1);
}
