use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;

#[test]
fn base36_matches_known_values() {
    assert_eq!(base36(0), "0");
    assert_eq!(base36(35), "z");
    assert_eq!(base36(36), "10");
    assert_eq!(base36(1_700_000_000_000), "loyw3v28");
}

#[test]
fn id_has_five_segments_with_version_marker() {
    let mut rng = StdRng::seed_from_u64(7);
    let id = job_id_at(1_700_000_000_000, &mut rng);
    let parts: Vec<&str> = id.split('-').collect();
    assert_eq!(parts.len(), 5);
    assert_eq!(parts[0], "loyw3v28");
    assert_eq!(parts[1].len(), 4);
    assert!(parts[2].starts_with('4'));
    assert_eq!(parts[2].len(), 4);
    assert_eq!(parts[3].len(), 4);
    assert_eq!(parts[4], "loyw3v28");
    assert!(id.chars().all(|c| c == '-' || c.is_ascii_alphanumeric()));
}

#[test]
fn ids_at_the_same_instant_differ() {
    let mut rng = StdRng::seed_from_u64(1);
    let ids: HashSet<String> = (0..1000)
        .map(|_| job_id_at(1_700_000_000_000, &mut rng))
        .collect();
    assert_eq!(ids.len(), 1000);
}

#[test]
fn fresh_ids_are_well_formed() {
    assert_eq!(new_job_id().split('-').count(), 5);
}
