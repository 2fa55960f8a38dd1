use chrono::{DateTime, Utc};

use crate::foundation::error::{ClipError, ClipResult};

/// Title and prompt used when a request leaves them blank.
pub const FALLBACK_TITLE: &str = "TikTok Video";
/// Clip length when a request does not give a usable duration.
pub const DEFAULT_DURATION_SECS: u32 = 15;
pub const MIN_DURATION_SECS: u32 = 1;
pub const MAX_DURATION_SECS: u32 = 60;
/// Thumbnail until a real one exists.
pub const PLACEHOLDER_THUMBNAIL: &str = "/placeholder.svg";

/// Lifecycle status of a job. Moves only `processing -> completed | error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Processing)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = ClipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            other => Err(ClipError::validation(format!("unknown job status '{other}'"))),
        }
    }
}

/// What a caller asks for when starting a generation.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationRequest {
    pub title: String,
    pub description: Option<String>,
    pub style: String,
    pub prompt: String,
    /// Requested clip length in seconds.
    pub duration: Option<f64>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, duration: f64, style: impl Into<String>) -> Self {
        let prompt = prompt.into();
        Self {
            title: prompt.clone(),
            description: None,
            style: style.into(),
            prompt,
            duration: Some(duration),
        }
    }
}

/// Clamp a requested duration into `[1, 60]` whole seconds; unusable values become the default.
pub fn normalize_duration(requested: Option<f64>) -> u32 {
    match requested {
        Some(d) if d.is_finite() && d > 0.0 => {
            (d.round() as u32).clamp(MIN_DURATION_SECS, MAX_DURATION_SECS)
        }
        _ => DEFAULT_DURATION_SECS,
    }
}

/// Cloud location of an uploaded asset.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudLocation {
    pub id: String,
    pub url: String,
    pub download_url: String,
    pub streaming_url: String,
    pub size: u64,
}

/// One generated video and its library metadata.
///
/// Serialized with the camelCase field names the persisted buckets use.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoJob {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    /// Seconds, within `[1, 60]`.
    pub duration: u32,
    pub created_at: DateTime<Utc>,
    pub status: JobStatus,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_storage_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_storage_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming_url: Option<String>,
}

impl VideoJob {
    /// A new `processing` job from a request, with blank fields filled in.
    pub fn from_request(id: impl Into<String>, req: &GenerationRequest, now: DateTime<Utc>) -> Self {
        let prompt = non_blank(&req.prompt).unwrap_or(FALLBACK_TITLE).to_string();
        let title = non_blank(&req.title).unwrap_or(FALLBACK_TITLE).to_string();
        let description = req
            .description
            .as_deref()
            .and_then(non_blank)
            .unwrap_or(&prompt)
            .to_string();
        Self {
            id: id.into(),
            title,
            description,
            thumbnail: PLACEHOLDER_THUMBNAIL.to_string(),
            duration: normalize_duration(req.duration),
            created_at: now,
            status: JobStatus::Processing,
            views: 0,
            likes: 0,
            shares: 0,
            style: req.style.trim().to_string(),
            prompt,
            cloud_storage_url: None,
            cloud_storage_id: None,
            storage_size: None,
            download_url: None,
            streaming_url: None,
        }
    }

    fn transition(&mut self, to: JobStatus) -> ClipResult<()> {
        if self.status != JobStatus::Processing {
            return Err(ClipError::validation(format!(
                "job {} cannot move from {} to {}",
                self.id, self.status, to
            )));
        }
        self.status = to;
        Ok(())
    }

    /// `processing -> completed`.
    pub fn mark_completed(&mut self) -> ClipResult<()> {
        self.transition(JobStatus::Completed)
    }

    /// `processing -> error`.
    pub fn mark_failed(&mut self) -> ClipResult<()> {
        self.transition(JobStatus::Error)
    }

    pub fn attach_cloud(&mut self, loc: CloudLocation) {
        self.thumbnail = loc.url.clone();
        self.cloud_storage_url = Some(loc.url);
        self.cloud_storage_id = Some(loc.id);
        self.storage_size = Some(loc.size);
        self.download_url = Some(loc.download_url);
        self.streaming_url = Some(loc.streaming_url);
    }

    /// `true` when `needle` (already lowercased) occurs in the title or description.
    pub(crate) fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.description.to_lowercase().contains(needle)
    }
}

/// Editable library metadata; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub style: Option<String>,
}

impl JobPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.thumbnail.is_none()
            && self.style.is_none()
    }

    pub fn apply(&self, job: &mut VideoJob) {
        if let Some(t) = &self.title {
            job.title = t.clone();
        }
        if let Some(d) = &self.description {
            job.description = d.clone();
        }
        if let Some(t) = &self.thumbnail {
            job.thumbnail = t.clone();
        }
        if let Some(s) = &self.style {
            job.style = s.clone();
        }
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let t = s.trim();
    (!t.is_empty()).then_some(t)
}

#[cfg(test)]
#[path = "../../tests/unit/job/model.rs"]
mod tests;
