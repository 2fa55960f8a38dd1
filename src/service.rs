//! Generation orchestration: request in, tracked background job out.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::asset::{RenderedAsset, asset_filename};
use crate::capture::CapturePipeline;
use crate::config::ClipnovaConfig;
use crate::encode::sink::RecorderFactory;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ClipError, ClipResult};
use crate::job::driver::{PhaseDriver, SimulatedDriver};
use crate::job::id::new_job_id;
use crate::job::model::{CloudLocation, GenerationRequest, JobPatch, JobStatus, VideoJob};
use crate::job::progress::{Phase, ProgressState, ProgressTracker};
use crate::render::cpu::FrameRenderer;
use crate::render::placeholder::{PLACEHOLDER_EXT, PLACEHOLDER_MIME, placeholder_png};
use crate::store::kv::{FileStore, KvStore};
use crate::store::library::{Bucket, LibraryQuery, VideoLibrary};
use crate::style::resolve_style;
use crate::text::font::FontBook;
use crate::upload::{SAMPLE_VIDEO_URL, SimulatedCloud, UploadPort};

const ID_ATTEMPTS: usize = 8;

/// Renders one clip synchronously: style, wrap, capture, placeholder fallback.
#[derive(Clone)]
pub struct ClipRenderer {
    pub canvas: Canvas,
    pub fps: Fps,
    pub safety_cap: Duration,
    fonts: Arc<FontBook>,
    recorders: Arc<dyn RecorderFactory>,
}

impl ClipRenderer {
    pub fn new(
        canvas: Canvas,
        fps: Fps,
        safety_cap: Duration,
        fonts: Arc<FontBook>,
        recorders: Arc<dyn RecorderFactory>,
    ) -> Self {
        Self {
            canvas,
            fps,
            safety_cap,
            fonts,
            recorders,
        }
    }

    /// A renderer set up for `style_token`, plus the wrapped prompt lines.
    pub fn prepare(
        &self,
        prompt: &str,
        style_token: &str,
    ) -> ClipResult<(FrameRenderer, Vec<String>)> {
        let style = resolve_style(style_token);
        let font = self.fonts.resolve(style.font_family);
        let mut renderer = FrameRenderer::new(self.canvas, self.fps, font)?;
        let lines = renderer.wrap(prompt)?;
        Ok((renderer, lines))
    }

    /// Record the clip. Capture failures (including a missing recorder) fall back to a PNG
    /// still of the final frame; only failures of that fallback are returned.
    #[tracing::instrument(level = "debug", skip(self, prompt))]
    pub fn render(
        &self,
        title: &str,
        prompt: &str,
        style_token: &str,
        duration_secs: u32,
    ) -> ClipResult<RenderedAsset> {
        let style = resolve_style(style_token);
        let (mut renderer, lines) = self.prepare(prompt, style_token)?;
        let pipeline = CapturePipeline::new(self.canvas, self.fps)
            .with_safety_cap(self.safety_cap)
            .with_background(style.background);
        let duration = f64::from(duration_secs);
        let total = pipeline.frame_budget(duration);

        let captured = match self.recorders.open() {
            Ok(mut recorder) => {
                let mut frame_fn = |idx| renderer.render_frame(idx, total, &style, &lines);
                pipeline.capture(recorder.as_mut(), &mut frame_fn, duration, title)
            }
            Err(e) => Err(e),
        };

        match captured {
            Ok(asset) => Ok(asset),
            Err(e) => {
                if e.is_environment_unsupported() {
                    tracing::info!(error = %e, "capture unavailable; producing placeholder still");
                } else {
                    tracing::warn!(error = %e, "capture failed; producing placeholder still");
                }
                let png = placeholder_png(&mut renderer, total, &style, &lines)?;
                Ok(RenderedAsset {
                    bytes: png,
                    mime: PLACEHOLDER_MIME.to_string(),
                    filename: asset_filename(
                        title,
                        chrono::Utc::now().timestamp_millis(),
                        PLACEHOLDER_EXT,
                    ),
                    frames_captured: 1,
                    truncated: false,
                })
            }
        }
    }
}

impl std::fmt::Debug for ClipRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipRenderer")
            .field("canvas", &self.canvas)
            .field("fps", &self.fps)
            .field("safety_cap", &self.safety_cap)
            .finish_non_exhaustive()
    }
}

/// Timing and placement knobs of [`VideoService`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Used when a request names no duration.
    pub default_duration_secs: u32,
    pub generation_timeout: Duration,
    pub poll_interval: Duration,
    pub upload_folder: String,
    /// Also write every rendered asset here when set.
    pub output_dir: Option<PathBuf>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_config(&ClipnovaConfig::default())
    }
}

impl ServiceSettings {
    pub fn from_config(cfg: &ClipnovaConfig) -> Self {
        Self {
            default_duration_secs: cfg.default_duration_secs,
            generation_timeout: cfg.generation_timeout(),
            poll_interval: cfg.poll_interval(),
            upload_folder: cfg.upload_folder.clone(),
            output_dir: None,
        }
    }
}

/// Starts generations, tracks them and manages the local library.
///
/// Cheap to clone; clones share the tracker, library and collaborators. Must be used from
/// within a Tokio runtime.
#[derive(Clone)]
pub struct VideoService {
    tracker: Arc<ProgressTracker>,
    library: Arc<VideoLibrary>,
    uploader: Arc<dyn UploadPort>,
    driver: Arc<dyn PhaseDriver>,
    renderer: ClipRenderer,
    settings: Arc<ServiceSettings>,
}

impl VideoService {
    pub fn new(
        library: Arc<VideoLibrary>,
        uploader: Arc<dyn UploadPort>,
        renderer: ClipRenderer,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            tracker: Arc::new(ProgressTracker::new()),
            library,
            uploader,
            driver: Arc::new(SimulatedDriver::default()),
            renderer,
            settings: Arc::new(settings),
        }
    }

    pub fn with_driver(mut self, driver: Arc<dyn PhaseDriver>) -> Self {
        self.driver = driver;
        self
    }

    /// Wire a service from configuration: file-backed store, simulated cloud, discovered fonts.
    pub fn from_config(cfg: &ClipnovaConfig) -> ClipResult<Self> {
        cfg.validate()?;
        let kv: Arc<dyn KvStore> = Arc::new(FileStore::open(&cfg.store_dir)?);
        let library = Arc::new(VideoLibrary::new(kv.clone()));
        let uploader = Arc::new(SimulatedCloud::new(cfg.cloud_name.clone(), kv));
        let fonts = Arc::new(FontBook::discover(cfg.font_path.as_deref())?);
        let renderer = ClipRenderer::new(
            cfg.canvas(),
            cfg.fps(),
            cfg.safety_cap(),
            fonts,
            Arc::new(cfg.capture_backend),
        );
        let settings = ServiceSettings {
            output_dir: Some(cfg.output_dir.clone()),
            ..ServiceSettings::from_config(cfg)
        };
        Ok(Self::new(library, uploader, renderer, settings).with_driver(cfg.phase_driver()))
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn library(&self) -> &VideoLibrary {
        &self.library
    }

    pub fn renderer(&self) -> &ClipRenderer {
        &self.renderer
    }

    /// Start a generation and return its job id immediately.
    ///
    /// Phases, rendering, upload and persistence run in a background task.
    #[tracing::instrument(level = "info", skip(self, req), fields(style = %req.style))]
    pub async fn generate(&self, mut req: GenerationRequest) -> ClipResult<String> {
        if req.duration.is_none() {
            req.duration = Some(f64::from(self.settings.default_duration_secs));
        }
        let id = self.claim_id()?;
        let job = VideoJob::from_request(id.clone(), &req, chrono::Utc::now());
        tracing::info!(job_id = %id, duration = job.duration, "generation queued");

        let svc = self.clone();
        tokio::spawn(async move { svc.run_job(job).await });
        Ok(id)
    }

    fn claim_id(&self) -> ClipResult<String> {
        for _ in 0..ID_ATTEMPTS {
            let id = new_job_id();
            if self.tracker.start(&id).is_ok() {
                return Ok(id);
            }
            tracing::debug!(job_id = %id, "job id collision; retrying");
        }
        Err(ClipError::validation("could not allocate a unique job id"))
    }

    async fn run_job(self, mut job: VideoJob) {
        let id = job.id.clone();
        let limit = self.settings.generation_timeout;

        self.persist(&job).await;
        let outcome = tokio::time::timeout(limit, self.drive(&mut job)).await;

        match outcome {
            Ok(Ok(true)) => self.complete_job(&mut job).await,
            Ok(Ok(false)) => {
                tracing::debug!(job_id = %id, "job no longer live; flow abandoned");
                // Failed by a waiter's deadline, or deleted.
                self.record_failure(&id).await;
                self.tracker.consume(&id);
            }
            Ok(Err(e)) => self.fail_job(&mut job, e.to_string()).await,
            Err(_) => {
                let msg = ClipError::timeout(format!(
                    "generation did not finish within {}s",
                    limit.as_secs_f64()
                ))
                .to_string();
                self.fail_job(&mut job, msg).await;
            }
        }
    }

    /// Phases with the render inside `Rendering`, then upload. `Ok(false)` when the job was
    /// removed or failed from outside mid-flight.
    async fn drive(&self, job: &mut VideoJob) -> ClipResult<bool> {
        let mut rendered = None;
        for phase in Phase::WORK {
            if !self.tracker.advance(&job.id, phase) {
                return Ok(false);
            }
            self.driver.run_phase(job, phase).await?;
            if phase == Phase::Rendering {
                rendered = Some(self.render_blocking(job).await?);
            }
        }
        if !self.is_live(&job.id) {
            return Ok(false);
        }
        let asset = rendered.ok_or_else(|| ClipError::capture("rendering phase never ran"))?;
        self.save_locally(&asset).await;

        match self.uploader.upload(&asset, &self.settings.upload_folder).await {
            Ok(receipt) => job.attach_cloud(CloudLocation {
                download_url: self.uploader.download_url(&receipt.id),
                streaming_url: self.uploader.streaming_url(&receipt.id),
                id: receipt.id,
                url: receipt.url,
                size: asset.len() as u64,
            }),
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "upload failed; keeping local result");
            }
        }
        Ok(true)
    }

    /// Tracked and still processing.
    fn is_live(&self, job_id: &str) -> bool {
        self.tracker.get(job_id).is_some_and(|s| !s.is_terminal())
    }

    async fn render_blocking(&self, job: &VideoJob) -> ClipResult<RenderedAsset> {
        let renderer = self.renderer.clone();
        let (title, prompt, style, duration) = (
            job.title.clone(),
            job.prompt.clone(),
            job.style.clone(),
            job.duration,
        );
        tokio::task::spawn_blocking(move || renderer.render(&title, &prompt, &style, duration))
            .await
            .map_err(|e| ClipError::capture(format!("render task failed: {e}")))?
            .inspect(|asset| {
                tracing::info!(
                    job_id = %job.id,
                    mime = %asset.mime,
                    bytes = asset.len(),
                    frames = asset.frames_captured,
                    truncated = asset.truncated,
                    "asset ready"
                );
            })
    }

    async fn save_locally(&self, asset: &RenderedAsset) {
        let Some(dir) = self.settings.output_dir.clone() else {
            return;
        };
        let path = dir.join(&asset.filename);
        let bytes = asset.bytes.clone();
        let res = tokio::task::spawn_blocking(move || -> ClipResult<PathBuf> {
            crate::encode::sink::ensure_parent_dir(&path)?;
            std::fs::write(&path, bytes)
                .map_err(|e| ClipError::storage(format!("write '{}': {e}", path.display())))?;
            Ok(path)
        })
        .await;
        match res {
            Ok(Ok(path)) => tracing::info!(path = %path.display(), "asset written"),
            Ok(Err(e)) => tracing::warn!(error = %e, "could not write asset"),
            Err(e) => tracing::warn!(error = %e, "asset writer task failed"),
        }
    }

    /// Record the finished job, then claim the terminal state. A job failed or deleted while
    /// the record was written keeps the tracker's verdict.
    async fn complete_job(&self, job: &mut VideoJob) {
        if let Err(e) = job.mark_completed() {
            tracing::warn!(job_id = %job.id, error = %e, "unexpected job state");
        }
        if self.is_live(&job.id) {
            self.persist(job).await;
        }
        if !self.tracker.complete(&job.id) {
            tracing::debug!(job_id = %job.id, "job ended elsewhere before completion");
            self.record_failure(&job.id).await;
            self.tracker.consume(&job.id);
        }
    }

    /// Mark the stored record failed in every bucket. Records already removed stay removed.
    async fn record_failure(&self, job_id: &str) {
        let library = self.library.clone();
        let id = job_id.to_string();
        let res = tokio::task::spawn_blocking(move || {
            library.update(&id, |j| j.status = JobStatus::Error)
        })
        .await;
        match res {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!(job_id, error = %e, "library write failed"),
            Err(e) => tracing::warn!(job_id, error = %e, "library writer task failed"),
        }
    }

    async fn fail_job(&self, job: &mut VideoJob, message: String) {
        tracing::error!(job_id = %job.id, error = %message, "generation failed");
        if job.mark_failed().is_ok() {
            self.persist(job).await;
        }
        self.tracker.fail(&job.id, message);
    }

    /// Upsert into every bucket, unless the job was deleted. Failures are logged.
    async fn persist(&self, job: &VideoJob) {
        if !self.tracker.contains(&job.id) {
            return;
        }
        let library = self.library.clone();
        let tracker = self.tracker.clone();
        let job = job.clone();
        let res = tokio::task::spawn_blocking(move || -> ClipResult<()> {
            library.upsert_into_all_buckets(&job)?;
            // Deleted while writing: undo so the delete wins.
            if !tracker.contains(&job.id) {
                library.remove_from_all_buckets(&job.id)?;
            }
            Ok(())
        })
        .await;
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "library write failed"),
            Err(e) => tracing::warn!(error = %e, "library writer task failed"),
        }
    }

    /// Latest progress of a job; `None` if unknown or reaped.
    pub fn get_progress(&self, job_id: &str) -> Option<ProgressState> {
        self.tracker.get(job_id)
    }

    /// Every progress change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressState> {
        self.tracker.subscribe()
    }

    /// Poll until `job_id` is terminal and hand back that final state, which stops tracking
    /// the job. On timeout the job is failed everywhere and `Timeout` returned.
    pub async fn wait_for_terminal(
        &self,
        job_id: &str,
        timeout: Duration,
    ) -> ClipResult<ProgressState> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let state = self.tracker.require(job_id)?;
            if state.is_terminal() {
                return Ok(self.tracker.consume(job_id).unwrap_or(state));
            }
            if tokio::time::Instant::now() >= deadline {
                let msg = format!("no terminal state after {}s", timeout.as_secs_f64());
                if self.tracker.fail(job_id, msg.clone()) {
                    self.record_failure(job_id).await;
                }
                return Err(ClipError::timeout(msg));
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    /// Forget a job everywhere.
    ///
    /// Progress tracking stops before this returns; library removal and the cloud delete
    /// run in the returned background task, which logs instead of failing.
    pub fn delete(&self, job_id: &str) -> JoinHandle<()> {
        self.tracker.remove(job_id);
        let library = self.library.clone();
        let uploader = self.uploader.clone();
        let id = job_id.to_string();
        tokio::spawn(async move {
            let lib = library.clone();
            let lookup = id.clone();
            let removed =
                match tokio::task::spawn_blocking(move || lib.remove_from_all_buckets(&lookup))
                    .await
                {
                    Ok(Ok(removed)) => removed,
                    Ok(Err(e)) => {
                        tracing::warn!(job_id = %id, error = %e, "library removal failed");
                        None
                    }
                    Err(e) => {
                        tracing::warn!(job_id = %id, error = %e, "library removal task failed");
                        None
                    }
                };
            let Some(cloud_id) = removed.and_then(|j| j.cloud_storage_id) else {
                return;
            };
            if let Err(e) = uploader.delete(&cloud_id).await {
                tracing::warn!(job_id = %id, cloud_id = %cloud_id, error = %e, "cloud delete failed");
            }
        })
    }

    /// Filtered view of the library.
    pub fn list(&self, query: &LibraryQuery) -> Vec<VideoJob> {
        self.library.query(query)
    }

    pub fn list_bucket(&self, bucket: Bucket) -> Vec<VideoJob> {
        self.library.list(bucket)
    }

    /// Patch library metadata of a job in every bucket.
    pub fn update(&self, job_id: &str, patch: &JobPatch) -> ClipResult<VideoJob> {
        self.library
            .update(job_id, |job| patch.apply(job))?
            .ok_or_else(|| ClipError::not_found(job_id))
    }

    /// Streaming URL to share, bumping the share counter in the background.
    pub fn share(&self, job_id: &str) -> ClipResult<String> {
        let job = self
            .library
            .find(job_id)
            .ok_or_else(|| ClipError::not_found(job_id))?;
        let url = match &job.cloud_storage_id {
            Some(cloud_id) => self.uploader.streaming_url(cloud_id),
            None => SAMPLE_VIDEO_URL.to_string(),
        };

        let library = self.library.clone();
        let id = job.id;
        tokio::task::spawn_blocking(move || {
            if let Err(e) = library.update(&id, |j| j.shares += 1) {
                tracing::warn!(job_id = %id, error = %e, "share counter update failed");
            }
        });
        Ok(url)
    }

    /// Download URL of a job's cloud copy, or the sample clip if it has none.
    pub fn download_url(&self, job_id: &str) -> ClipResult<String> {
        let job = self
            .library
            .find(job_id)
            .ok_or_else(|| ClipError::not_found(job_id))?;
        Ok(match &job.cloud_storage_id {
            Some(cloud_id) => self.uploader.download_url(cloud_id),
            None => SAMPLE_VIDEO_URL.to_string(),
        })
    }
}

impl std::fmt::Debug for VideoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoService")
            .field("tracker", &self.tracker)
            .field("library", &self.library)
            .field("renderer", &self.renderer)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/unit/service.rs"]
mod tests;
