use rand::Rng;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Lowercase base-36 rendering of `n`.
pub fn base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

fn random_segment<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// Time-plus-random job id shaped like `<ts36>-xxxx-4xxx-xxxx-<ts36>`.
///
/// Collision resistance comes from the random segments only; callers that need uniqueness
/// check against the ids they already track.
pub fn job_id_at<R: Rng + ?Sized>(unix_millis: u64, rng: &mut R) -> String {
    let ts = base36(unix_millis);
    let head: String = ts.chars().take(12).collect();
    format!(
        "{ts}-{}-4{}-{}-{head}",
        random_segment(rng, 4),
        random_segment(rng, 3),
        random_segment(rng, 4),
    )
}

/// New job id for the current time.
pub fn new_job_id() -> String {
    let millis = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
    job_id_at(millis, &mut rand::thread_rng())
}

#[cfg(test)]
#[path = "../../tests/unit/job/id.rs"]
mod tests;
