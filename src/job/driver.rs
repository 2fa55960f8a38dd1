use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::foundation::error::{ClipError, ClipResult};
use crate::job::model::VideoJob;
use crate::job::progress::Phase;

/// Work performed while a job sits in one phase.
///
/// The tracker reports the phase before `run_phase` is awaited; drivers only do (or simulate)
/// the work. Implementations must be safe to run for many jobs at once.
#[async_trait]
pub trait PhaseDriver: Send + Sync {
    async fn run_phase(&self, job: &VideoJob, phase: Phase) -> ClipResult<()>;
}

/// Inclusive millisecond range for one phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> Duration {
        let (lo, hi) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        Duration::from_millis(rng.gen_range(lo..=hi))
    }
}

/// Per-phase delay ranges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PhaseDelays {
    pub analyzing: DelayRange,
    pub concept: DelayRange,
    pub frames: DelayRange,
    pub rendering: DelayRange,
    pub effects: DelayRange,
    pub finalizing: DelayRange,
}

impl Default for PhaseDelays {
    fn default() -> Self {
        Self {
            analyzing: DelayRange::new(1000, 2000),
            concept: DelayRange::new(1000, 3000),
            frames: DelayRange::new(2000, 4000),
            rendering: DelayRange::new(3000, 5000),
            effects: DelayRange::new(2000, 3000),
            finalizing: DelayRange::new(1000, 2000),
        }
    }
}

impl PhaseDelays {
    pub fn for_phase(&self, phase: Phase) -> DelayRange {
        match phase {
            Phase::Queued => DelayRange::new(0, 0),
            Phase::Analyzing => self.analyzing,
            Phase::Concept => self.concept,
            Phase::Frames => self.frames,
            Phase::Rendering => self.rendering,
            Phase::Effects => self.effects,
            Phase::Finalizing => self.finalizing,
        }
    }

    /// Every range multiplied by `factor` (clamped to `>= 0`).
    pub fn scaled(&self, factor: f64) -> Self {
        let f = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
        let s = |r: DelayRange| {
            DelayRange::new(
                (r.min_ms as f64 * f).round() as u64,
                (r.max_ms as f64 * f).round() as u64,
            )
        };
        Self {
            analyzing: s(self.analyzing),
            concept: s(self.concept),
            frames: s(self.frames),
            rendering: s(self.rendering),
            effects: s(self.effects),
            finalizing: s(self.finalizing),
        }
    }
}

/// Sleeps a random time within each phase's range.
#[derive(Clone, Debug, Default)]
pub struct SimulatedDriver {
    pub delays: PhaseDelays,
}

impl SimulatedDriver {
    pub fn new(delays: PhaseDelays) -> Self {
        Self { delays }
    }
}

#[async_trait]
impl PhaseDriver for SimulatedDriver {
    async fn run_phase(&self, job: &VideoJob, phase: Phase) -> ClipResult<()> {
        let wait = self.delays.for_phase(phase).sample(&mut rand::thread_rng());
        tracing::trace!(job_id = %job.id, phase = phase.as_str(), wait_ms = wait.as_millis() as u64, "simulated phase");
        tokio::time::sleep(wait).await;
        Ok(())
    }
}

/// Completes every phase immediately, yielding once so other tasks interleave.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstantDriver;

#[async_trait]
impl PhaseDriver for InstantDriver {
    async fn run_phase(&self, _job: &VideoJob, _phase: Phase) -> ClipResult<()> {
        tokio::task::yield_now().await;
        Ok(())
    }
}

/// Fails when the job reaches a given phase; every other phase is instant.
#[derive(Clone, Debug)]
pub struct FailingDriver {
    pub fail_at: Phase,
    pub message: String,
}

#[async_trait]
impl PhaseDriver for FailingDriver {
    async fn run_phase(&self, _job: &VideoJob, phase: Phase) -> ClipResult<()> {
        tokio::task::yield_now().await;
        if phase == self.fail_at {
            return Err(ClipError::capture(self.message.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/driver.rs"]
mod tests;
