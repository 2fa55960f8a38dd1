use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;
use crate::job::model::GenerationRequest;

fn job() -> VideoJob {
    VideoJob::from_request("j", &GenerationRequest::new("hi", 5.0, "trendy"), chrono::Utc::now())
}

#[test]
fn default_delays_cover_every_work_phase() {
    let d = PhaseDelays::default();
    assert_eq!(d.for_phase(Phase::Analyzing), DelayRange::new(1000, 2000));
    assert_eq!(d.for_phase(Phase::Rendering), DelayRange::new(3000, 5000));
    assert_eq!(d.for_phase(Phase::Queued), DelayRange::new(0, 0));
    for phase in Phase::WORK {
        let r = d.for_phase(phase);
        assert!(r.min_ms <= r.max_ms, "{phase:?}");
    }
}

#[test]
fn samples_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(3);
    let r = DelayRange::new(10, 20);
    for _ in 0..200 {
        let d = r.sample(&mut rng);
        assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(20));
    }
    // reversed bounds are tolerated
    let d = DelayRange::new(5, 1).sample(&mut rng);
    assert!(d <= Duration::from_millis(5));
}

#[test]
fn scaling_shrinks_ranges() {
    let d = PhaseDelays::default().scaled(0.01);
    assert_eq!(d.frames, DelayRange::new(20, 40));
    assert_eq!(PhaseDelays::default().scaled(f64::NAN).effects, DelayRange::new(0, 0));
}

#[tokio::test]
async fn simulated_driver_waits_within_range() {
    let driver = SimulatedDriver::new(PhaseDelays::default().scaled(0.005));
    let started = Instant::now();
    driver.run_phase(&job(), Phase::Analyzing).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(5));
}

#[tokio::test]
async fn failing_driver_fails_only_at_its_phase() {
    let driver = FailingDriver {
        fail_at: Phase::Effects,
        message: "no effects today".to_string(),
    };
    driver.run_phase(&job(), Phase::Rendering).await.unwrap();
    let err = driver.run_phase(&job(), Phase::Effects).await.unwrap_err();
    assert!(err.to_string().contains("no effects today"));
    InstantDriver.run_phase(&job(), Phase::Effects).await.unwrap();
}
