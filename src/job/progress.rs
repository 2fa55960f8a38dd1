use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use crate::foundation::error::{ClipError, ClipResult};
use crate::job::model::JobStatus;

/// Named generation checkpoints, in order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Queued,
    Analyzing,
    Concept,
    Frames,
    Rendering,
    Effects,
    Finalizing,
}

impl Phase {
    /// Phases a job works through after it is queued.
    pub const WORK: [Phase; 6] = [
        Phase::Analyzing,
        Phase::Concept,
        Phase::Frames,
        Phase::Rendering,
        Phase::Effects,
        Phase::Finalizing,
    ];

    /// Percent reported while the phase is current.
    pub fn percent(self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Analyzing => 5,
            Self::Concept => 15,
            Self::Frames => 30,
            Self::Rendering => 50,
            Self::Effects => 75,
            Self::Finalizing => 90,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Queued => "Initializing generation process...",
            Self::Analyzing => "Analyzing prompt...",
            Self::Concept => "Generating video concept...",
            Self::Frames => "Creating video frames...",
            Self::Rendering => "Rendering video...",
            Self::Effects => "Applying effects and style...",
            Self::Finalizing => "Finalizing video...",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Analyzing => "analyzing",
            Self::Concept => "concept",
            Self::Frames => "frames",
            Self::Rendering => "rendering",
            Self::Effects => "effects",
            Self::Finalizing => "finalizing",
        }
    }
}

pub const COMPLETED_LABEL: &str = "Video generation completed!";
pub const FAILED_LABEL: &str = "Generation failed";

/// Latest known progress of one job.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub job_id: String,
    /// 0..=100, non-decreasing while processing.
    pub percent: u8,
    pub step_label: String,
    pub status: JobStatus,
    /// Current phase while processing; the last phase reached once terminal.
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressState {
    fn queued(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            percent: Phase::Queued.percent(),
            step_label: Phase::Queued.label().to_string(),
            status: JobStatus::Processing,
            phase: Phase::Queued,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

const EVENT_CAPACITY: usize = 256;

/// Live per-job progress map.
///
/// Reads never block on job work. Every change is also broadcast as a [`ProgressState`]
/// snapshot; lagging subscribers lose events, never the map state.
pub struct ProgressTracker {
    entries: Mutex<HashMap<String, ProgressState>>,
    events: broadcast::Sender<ProgressState>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: Mutex::new(HashMap::new()),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ProgressState>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &ProgressState) {
        // No subscribers is fine.
        let _ = self.events.send(state.clone());
    }

    /// Observe every state change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressState> {
        self.events.subscribe()
    }

    /// Track a new job at 0%. Fails if `job_id` is already tracked.
    pub fn start(&self, job_id: &str) -> ClipResult<ProgressState> {
        let mut entries = self.lock();
        if entries.contains_key(job_id) {
            return Err(ClipError::validation(format!(
                "job id '{job_id}' is already tracked"
            )));
        }
        let state = ProgressState::queued(job_id);
        entries.insert(job_id.to_string(), state.clone());
        self.publish(&state);
        Ok(state)
    }

    /// Move a processing job to `phase`.
    ///
    /// Returns `false` (and changes nothing) when the job is gone, terminal, or `phase` is
    /// behind the current one.
    pub fn advance(&self, job_id: &str, phase: Phase) -> bool {
        let mut entries = self.lock();
        let Some(state) = entries.get_mut(job_id) else {
            return false;
        };
        if state.is_terminal() || phase < state.phase {
            return false;
        }
        state.phase = phase;
        state.percent = phase.percent();
        state.step_label = phase.label().to_string();
        let snapshot = state.clone();
        drop(entries);
        tracing::debug!(job_id, phase = phase.as_str(), percent = snapshot.percent, "progress");
        self.publish(&snapshot);
        true
    }

    /// Terminal success at 100%. `false` if the job is gone or already terminal.
    pub fn complete(&self, job_id: &str) -> bool {
        self.finish(job_id, |state| {
            state.status = JobStatus::Completed;
            state.percent = 100;
            state.step_label = COMPLETED_LABEL.to_string();
        })
    }

    /// Terminal failure carrying `message`; percent resets to 0.
    pub fn fail(&self, job_id: &str, message: impl Into<String>) -> bool {
        let message = message.into();
        self.finish(job_id, move |state| {
            state.status = JobStatus::Error;
            state.percent = 0;
            state.step_label = FAILED_LABEL.to_string();
            state.error = Some(message);
        })
    }

    fn finish(&self, job_id: &str, apply: impl FnOnce(&mut ProgressState)) -> bool {
        let mut entries = self.lock();
        let Some(state) = entries.get_mut(job_id) else {
            return false;
        };
        if state.is_terminal() {
            return false;
        }
        apply(state);
        let snapshot = state.clone();
        drop(entries);
        tracing::info!(job_id, status = %snapshot.status, "job finished");
        self.publish(&snapshot);
        true
    }

    /// Latest state, or `None` if never started or already reaped.
    pub fn get(&self, job_id: &str) -> Option<ProgressState> {
        self.lock().get(job_id).cloned()
    }

    /// Like [`ProgressTracker::get`], but unknown ids are a `JobNotFound` error.
    pub fn require(&self, job_id: &str) -> ClipResult<ProgressState> {
        self.get(job_id).ok_or_else(|| ClipError::not_found(job_id))
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.lock().contains_key(job_id)
    }

    /// Stop tracking `job_id` regardless of state.
    pub fn remove(&self, job_id: &str) -> Option<ProgressState> {
        self.lock().remove(job_id)
    }

    /// Reap a terminal job, returning its final state. Processing jobs are left in place.
    pub fn consume(&self, job_id: &str) -> Option<ProgressState> {
        let mut entries = self.lock();
        if entries.get(job_id).is_some_and(ProgressState::is_terminal) {
            return entries.remove(job_id);
        }
        None
    }

    /// Ids currently tracked, sorted.
    pub fn tracked_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("tracked", &self.lock().len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/progress.rs"]
mod tests;
