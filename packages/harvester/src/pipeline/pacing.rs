//! Randomized pauses between requests.

use std::time::Duration;

use crate::types::PauseRange;

/// A uniformly random duration within `range`.
pub fn jitter(range: PauseRange) -> Duration {
    let min = range.min.as_millis() as u64;
    let max = range.max.as_millis() as u64;
    if max <= min {
        return range.min;
    }
    Duration::from_millis(fastrand::u64(min..=max))
}

/// Sleep for a random duration within `range` to break up request bursts.
pub async fn pause(range: PauseRange) {
    let delay = jitter(range);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_stays_in_range() {
        let range = PauseRange::default();
        for _ in 0..200 {
            let d = jitter(range);
            assert!(d >= Duration::from_millis(150) && d <= Duration::from_millis(400));
        }
        assert_eq!(jitter(PauseRange::none()), Duration::ZERO);
    }
}
