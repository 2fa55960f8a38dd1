//! Upload collaborator port and a local stand-in for a media cloud.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::asset::RenderedAsset;
use crate::foundation::error::{ClipError, ClipResult};
use crate::store::kv::KvStore;

/// Public URL served when a job has no cloud copy.
pub const SAMPLE_VIDEO_URL: &str =
    "https://sample-videos.com/video123/mp4/720/big_buck_bunny_720p_1mb.mp4";

/// Where an uploaded asset landed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Provider id (public id) of the resource.
    pub id: String,
    pub url: String,
}

/// The narrow contract the engine needs from a storage provider.
#[async_trait]
pub trait UploadPort: Send + Sync {
    async fn upload(&self, asset: &RenderedAsset, folder: &str) -> ClipResult<UploadReceipt>;
    /// Deleting an unknown id is not an error.
    async fn delete(&self, id: &str) -> ClipResult<()>;
    fn download_url(&self, id: &str) -> String;
    fn streaming_url(&self, id: &str) -> String;
}

/// Key under which [`SimulatedCloud`] keeps resource metadata.
pub const RESOURCES_KEY: &str = "cloudinaryResources";

/// Metadata of one simulated upload.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CloudResource {
    pub public_id: String,
    pub secure_url: String,
    pub format: String,
    pub resource_type: String,
    pub created_at: String,
    pub bytes: u64,
    #[serde(default)]
    pub original_filename: String,
}

/// Upload port that keeps resource metadata in a [`KvStore`] and mints provider-shaped URLs.
///
/// No bytes leave the process.
pub struct SimulatedCloud {
    cloud_name: String,
    kv: Arc<dyn KvStore>,
    write_lock: Mutex<()>,
}

impl SimulatedCloud {
    pub fn new(cloud_name: impl Into<String>, kv: Arc<dyn KvStore>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            kv,
            write_lock: Mutex::new(()),
        }
    }

    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    /// Stored resources; corrupt metadata reads as empty.
    pub fn resources(&self) -> Vec<CloudResource> {
        let raw = match self.kv.get(RESOURCES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "cloud metadata unreadable");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "cloud metadata corrupt; treating as empty");
            Vec::new()
        })
    }

    fn modify(&self, edit: impl FnOnce(&mut Vec<CloudResource>)) -> ClipResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut resources = self.resources();
        edit(&mut resources);
        self.kv.set(RESOURCES_KEY, &serde_json::to_string(&resources)?)
    }

    /// Embeddable player page for `id`.
    pub fn player_url(&self, id: &str) -> String {
        format!(
            "https://player.cloudinary.com/embed/?public_id={}&cloud_name={}&player[fluid]=true&player[controls]=true",
            encode_component(id),
            self.cloud_name
        )
    }
}

#[async_trait]
impl UploadPort for SimulatedCloud {
    #[tracing::instrument(level = "debug", skip(self, asset), fields(filename = %asset.filename, bytes = asset.len()))]
    async fn upload(&self, asset: &RenderedAsset, folder: &str) -> ClipResult<UploadReceipt> {
        if asset.is_empty() {
            return Err(ClipError::upload("refusing to upload an empty asset"));
        }
        let folder = folder.trim_matches('/');
        let folder = if folder.is_empty() { "tiktok_videos" } else { folder };
        let stem = asset
            .filename
            .rsplit_once('.')
            .map_or(asset.filename.as_str(), |(stem, _)| stem);
        let stem = if stem.is_empty() { "upload" } else { stem };
        let public_id = format!("{folder}/{stem}");

        let resource_type = if asset.mime.starts_with("video/") {
            "video"
        } else if asset.mime.starts_with("image/") {
            "image"
        } else {
            "raw"
        };
        let url = format!(
            "https://res.cloudinary.com/{}/{resource_type}/upload/{public_id}",
            self.cloud_name
        );
        let resource = CloudResource {
            public_id: public_id.clone(),
            secure_url: url.clone(),
            format: asset
                .mime
                .split_once('/')
                .map_or("raw", |(_, sub)| sub)
                .to_string(),
            resource_type: resource_type.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            bytes: asset.len() as u64,
            original_filename: asset.filename.clone(),
        };
        self.modify(|resources| {
            resources.retain(|r| r.public_id != public_id);
            resources.push(resource);
        })
        .map_err(|e| ClipError::upload(format!("could not record upload: {e}")))?;

        tracing::info!(public_id = %public_id, "simulated upload stored");
        Ok(UploadReceipt { id: public_id, url })
    }

    async fn delete(&self, id: &str) -> ClipResult<()> {
        self.modify(|resources| resources.retain(|r| r.public_id != id))
            .map_err(|e| ClipError::upload(format!("could not delete '{id}': {e}")))
    }

    fn download_url(&self, id: &str) -> String {
        format!(
            "https://res.cloudinary.com/{}/video/upload/fl_attachment,q_auto/{id}.mp4",
            self.cloud_name
        )
    }

    fn streaming_url(&self, id: &str) -> String {
        format!(
            "https://res.cloudinary.com/{}/video/upload/q_auto,f_auto/{id}.mp4",
            self.cloud_name
        )
    }
}

impl std::fmt::Debug for SimulatedCloud {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedCloud")
            .field("cloud_name", &self.cloud_name)
            .finish_non_exhaustive()
    }
}

/// Percent-encode everything outside the URI unreserved set.
fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

#[cfg(test)]
#[path = "../tests/unit/upload.rs"]
mod tests;
