//! ClipNova turns a short text prompt into a short vertical video clip.
//!
//! The public surface is service-oriented:
//!
//! - Build a [`VideoService`] (usually from a [`ClipnovaConfig`])
//! - Submit a [`GenerationRequest`] and receive a job id immediately
//! - Follow the job through [`ProgressState`] snapshots until it completes or fails
//! - Browse, patch, share and delete finished clips through the local [`VideoLibrary`]
//!
//! The rendering half (style resolution, wrapping, frame planning, capture) is usable on its
//! own through [`FrameRenderer`] and [`CapturePipeline`].
#![forbid(unsafe_code)]

mod foundation;
pub(crate) mod text;

/// Rendered clip blobs and their file names.
pub mod asset;
/// Frame capture into a recorder.
pub mod capture;
/// File and environment configuration.
pub mod config;
/// Recorders (MP4 through `ffmpeg`, GIF, in-memory).
pub mod encode;
/// Job records, ids, progress and phase drivers.
pub mod job;
/// Frame rendering.
pub mod render;
/// Generation orchestration.
pub mod service;
/// Local persistence.
pub mod store;
/// Named visual presets.
pub mod style;
/// Upload port and the simulated media cloud.
pub mod upload;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Rgba8};
pub use crate::foundation::error::{ClipError, ClipResult};
pub use crate::text::font::{FontBook, FontBytes};
pub use crate::text::measure::{FixedAdvance, TextMeasure};
pub use crate::text::wrap::wrap_lines;

pub use crate::asset::RenderedAsset;
pub use crate::capture::CapturePipeline;
pub use crate::config::{ClipnovaConfig, PhaseMode};
pub use crate::encode::RecorderKind;
pub use crate::encode::sink::{EncodedClip, InMemoryRecorder, Recorder, RecorderConfig, RecorderFactory};
pub use crate::job::driver::{FailingDriver, InstantDriver, PhaseDelays, PhaseDriver, SimulatedDriver};
pub use crate::job::model::{GenerationRequest, JobPatch, JobStatus, VideoJob};
pub use crate::job::progress::{Phase, ProgressState, ProgressTracker};
pub use crate::render::backend::FrameRGBA;
pub use crate::render::cpu::{FramePlan, FrameRenderer, plan_frame};
pub use crate::service::{ClipRenderer, ServiceSettings, VideoService};
pub use crate::store::kv::{FileStore, KvStore, MemoryStore};
pub use crate::store::library::{Bucket, LibraryQuery, SortOrder, VideoLibrary};
pub use crate::style::{AnimationKind, StyleConfig, resolve_style};
pub use crate::upload::{SAMPLE_VIDEO_URL, SimulatedCloud, UploadPort, UploadReceipt};
