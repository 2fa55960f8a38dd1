use std::sync::{Arc, Mutex, PoisonError};

use crate::foundation::error::{ClipError, ClipResult};
use crate::job::model::{JobStatus, VideoJob};
use crate::store::kv::KvStore;

/// The three denormalized job lists. Every job lives in all of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Recent,
    Mine,
    All,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Recent, Bucket::Mine, Bucket::All];

    /// Storage key of the bucket.
    pub fn key(self) -> &'static str {
        match self {
            Self::Recent => "userVideos",
            Self::Mine => "myVideos",
            Self::All => "allVideos",
        }
    }
}

impl std::str::FromStr for Bucket {
    type Err = ClipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recent" | "uservideos" => Ok(Self::Recent),
            "mine" | "myvideos" => Ok(Self::Mine),
            "all" | "allvideos" => Ok(Self::All),
            other => Err(ClipError::validation(format!(
                "unknown bucket '{other}' (expected recent, mine or all)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Newest,
    Oldest,
}

/// Filters for [`VideoLibrary::query`]. The default returns the bucket as stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LibraryQuery {
    pub status: Option<JobStatus>,
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
    pub sort: Option<SortOrder>,
}

/// Job lists persisted as JSON arrays in a [`KvStore`].
///
/// Reads are lenient: a missing or corrupt bucket reads as empty. Writes re-read each bucket
/// under one lock and replace the whole array, so concurrent jobs never lose each other's
/// records; a bucket that cannot be read at all is never overwritten.
pub struct VideoLibrary {
    kv: Arc<dyn KvStore>,
    write_lock: Mutex<()>,
}

impl VideoLibrary {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }

    /// Strict read: corrupt JSON is a `StorageCorrupt` error.
    pub fn read(&self, bucket: Bucket) -> ClipResult<Vec<VideoJob>> {
        let Some(raw) = self.kv.get(bucket.key())? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw)
            .map_err(|e| ClipError::corrupt(format!("bucket '{}': {e}", bucket.key())))
    }

    /// Jobs in `bucket`, newest first. Absent, unreadable or corrupt data reads as empty.
    pub fn list(&self, bucket: Bucket) -> Vec<VideoJob> {
        match self.read(bucket) {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::warn!(bucket = bucket.key(), error = %e, "treating bucket as empty");
                Vec::new()
            }
        }
    }

    fn write(&self, bucket: Bucket, jobs: &[VideoJob]) -> ClipResult<()> {
        let json = serde_json::to_string(jobs)?;
        self.kv.set(bucket.key(), &json)
    }

    /// Apply `edit` to every bucket under the write lock, writing back the ones it changed.
    ///
    /// Only corrupt JSON is rewritten from scratch; a failed read aborts before anything is
    /// written.
    fn modify_all(
        &self,
        mut edit: impl FnMut(Bucket, &mut Vec<VideoJob>) -> bool,
    ) -> ClipResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        for bucket in Bucket::ALL {
            let mut jobs = match self.read(bucket) {
                Ok(jobs) => jobs,
                Err(ClipError::StorageCorrupt(msg)) => {
                    tracing::warn!(bucket = bucket.key(), error = %msg, "replacing corrupt bucket");
                    Vec::new()
                }
                Err(e) => return Err(e),
            };
            if edit(bucket, &mut jobs) {
                self.write(bucket, &jobs)?;
            }
        }
        Ok(())
    }

    /// Put `job` at the front of every bucket, replacing any older record with the same id.
    #[tracing::instrument(level = "debug", skip(self, job), fields(job_id = %job.id))]
    pub fn upsert_into_all_buckets(&self, job: &VideoJob) -> ClipResult<()> {
        self.modify_all(|_, jobs| {
            jobs.retain(|j| j.id != job.id);
            jobs.insert(0, job.clone());
            true
        })
    }

    /// Drop `job_id` from every bucket. Returns the removed record, if any bucket had one.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn remove_from_all_buckets(&self, job_id: &str) -> ClipResult<Option<VideoJob>> {
        let mut removed = None;
        self.modify_all(|_, jobs| {
            let Some(pos) = jobs.iter().position(|j| j.id == job_id) else {
                return false;
            };
            let job = jobs.remove(pos);
            jobs.retain(|j| j.id != job_id);
            removed.get_or_insert(job);
            true
        })?;
        Ok(removed)
    }

    /// Edit the record for `job_id` in every bucket that holds it.
    ///
    /// Returns the edited record from the `all` bucket (or the first bucket that had it), or
    /// `None` if no bucket holds the id.
    pub fn update(
        &self,
        job_id: &str,
        mut edit: impl FnMut(&mut VideoJob),
    ) -> ClipResult<Option<VideoJob>> {
        let mut updated: Option<(Bucket, VideoJob)> = None;
        self.modify_all(|bucket, jobs| {
            let mut touched = false;
            for job in jobs.iter_mut().filter(|j| j.id == job_id) {
                edit(job);
                touched = true;
                if updated.is_none() || bucket == Bucket::All {
                    updated = Some((bucket, job.clone()));
                }
            }
            touched
        })?;
        Ok(updated.map(|(_, job)| job))
    }

    /// Find a job by id, preferring the `all` bucket.
    pub fn find(&self, job_id: &str) -> Option<VideoJob> {
        [Bucket::All, Bucket::Mine, Bucket::Recent]
            .into_iter()
            .find_map(|b| self.list(b).into_iter().find(|j| j.id == job_id))
    }

    /// Filter and sort the `recent` bucket.
    pub fn query(&self, q: &LibraryQuery) -> Vec<VideoJob> {
        let needle = q
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let mut jobs: Vec<VideoJob> = self
            .list(Bucket::Recent)
            .into_iter()
            .filter(|j| q.status.is_none_or(|s| j.status == s))
            .filter(|j| needle.as_deref().is_none_or(|n| j.matches_search(n)))
            .collect();
        match q.sort {
            Some(SortOrder::Newest) => jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            Some(SortOrder::Oldest) => jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            None => {}
        }
        jobs
    }
}

impl std::fmt::Debug for VideoLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoLibrary").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/library.rs"]
mod tests;
