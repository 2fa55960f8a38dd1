//! Engine configuration: JSON file, then `CLIPNOVA_*` environment overrides.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::encode::RecorderKind;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ClipError, ClipResult};
use crate::job::driver::{InstantDriver, PhaseDelays, PhaseDriver, SimulatedDriver};
use crate::job::model::{MAX_DURATION_SECS, MIN_DURATION_SECS};

pub const ENV_STORE_DIR: &str = "CLIPNOVA_STORE_DIR";
pub const ENV_OUTPUT_DIR: &str = "CLIPNOVA_OUTPUT_DIR";
pub const ENV_FONT: &str = "CLIPNOVA_FONT";
pub const ENV_CAPTURE_BACKEND: &str = "CLIPNOVA_CAPTURE_BACKEND";
pub const ENV_PHASE_MODE: &str = "CLIPNOVA_PHASE_MODE";
pub const ENV_CLOUD_NAME: &str = "CLIPNOVA_CLOUD_NAME";

/// How phase delays are produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseMode {
    /// Random sleeps within [`ClipnovaConfig::phase_delays`].
    #[default]
    Simulated,
    /// No waiting between phases.
    Instant,
}

impl std::str::FromStr for PhaseMode {
    type Err = ClipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulated" => Ok(Self::Simulated),
            "instant" => Ok(Self::Instant),
            other => Err(ClipError::validation(format!(
                "unknown phase mode '{other}' (expected simulated or instant)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClipnovaConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Clip length used when a request gives none.
    pub default_duration_secs: u32,
    pub capture_backend: RecorderKind,
    /// Wall-clock ceiling for one capture.
    pub capture_safety_cap_secs: u64,
    /// A generation that is not terminal after this long is failed.
    pub generation_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub phase_mode: PhaseMode,
    pub phase_delays: PhaseDelays,
    /// Font file for text; system fonts are searched when unset.
    pub font_path: Option<PathBuf>,
    pub store_dir: PathBuf,
    pub output_dir: PathBuf,
    pub cloud_name: String,
    pub upload_folder: String,
}

impl Default for ClipnovaConfig {
    fn default() -> Self {
        Self {
            width: Canvas::PORTRAIT.width,
            height: Canvas::PORTRAIT.height,
            fps: 30,
            default_duration_secs: 15,
            capture_backend: RecorderKind::default(),
            capture_safety_cap_secs: 30,
            generation_timeout_secs: 300,
            poll_interval_ms: 250,
            phase_mode: PhaseMode::default(),
            phase_delays: PhaseDelays::default(),
            font_path: None,
            store_dir: PathBuf::from(".clipnova/store"),
            output_dir: PathBuf::from("clips"),
            cloud_name: "dmdjtvjvc".to_string(),
            upload_folder: "tiktok_videos".to_string(),
        }
    }
}

impl ClipnovaConfig {
    pub fn from_json_str(s: &str) -> ClipResult<Self> {
        serde_json::from_str(s).map_err(|e| ClipError::validation(format!("config JSON: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> ClipResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ClipError::validation(format!("open config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// File (or defaults), then process environment, then validation.
    pub fn load(path: Option<&Path>) -> ClipResult<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_path(p)?,
            None => Self::default(),
        };
        cfg.apply_env_from(|k| std::env::var(k).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `CLIPNOVA_*` overrides read through `lookup`.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ClipResult<()> {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(ENV_STORE_DIR) {
            self.store_dir = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_FONT) {
            self.font_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get(ENV_CAPTURE_BACKEND) {
            self.capture_backend = v.parse()?;
        }
        if let Some(v) = get(ENV_PHASE_MODE) {
            self.phase_mode = v.parse()?;
        }
        if let Some(v) = get(ENV_CLOUD_NAME) {
            self.cloud_name = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> ClipResult<()> {
        if self.fps == 0 {
            return Err(ClipError::validation("fps must be > 0"));
        }
        self.canvas().validate()?;
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(ClipError::validation("canvas width/height must be even"));
        }
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&self.default_duration_secs) {
            return Err(ClipError::validation(format!(
                "default_duration_secs must be in {MIN_DURATION_SECS}..={MAX_DURATION_SECS}"
            )));
        }
        if self.capture_safety_cap_secs == 0 {
            return Err(ClipError::validation("capture_safety_cap_secs must be > 0"));
        }
        if self.generation_timeout_secs == 0 {
            return Err(ClipError::validation("generation_timeout_secs must be > 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ClipError::validation("poll_interval_ms must be > 0"));
        }
        if self.cloud_name.trim().is_empty() {
            return Err(ClipError::validation("cloud_name must not be empty"));
        }
        Ok(())
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    pub fn fps(&self) -> Fps {
        Fps {
            num: self.fps,
            den: 1,
        }
    }

    pub fn safety_cap(&self) -> Duration {
        Duration::from_secs(self.capture_safety_cap_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Phase driver selected by [`ClipnovaConfig::phase_mode`].
    pub fn phase_driver(&self) -> Arc<dyn PhaseDriver> {
        match self.phase_mode {
            PhaseMode::Simulated => Arc::new(SimulatedDriver::new(self.phase_delays)),
            PhaseMode::Instant => Arc::new(InstantDriver),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
