pub type ClipResult<T> = Result<T, ClipError>;

#[derive(thiserror::Error, Debug)]
pub enum ClipError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("environment unsupported: {0}")]
    EnvironmentUnsupported(String),

    #[error("layout error: {0}")]
    Layout(String),

    #[error("capture error: {0}")]
    Capture(String),

    #[error("storage corrupt: {0}")]
    StorageCorrupt(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClipError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::EnvironmentUnsupported(msg.into())
    }

    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::StorageCorrupt(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn upload(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::JobNotFound(id.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for failures that mean "this host cannot record video at all".
    pub fn is_environment_unsupported(&self) -> bool {
        matches!(self, Self::EnvironmentUnsupported(_))
    }
}

impl From<serde_json::Error> for ClipError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
