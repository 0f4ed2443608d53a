use std::time::Duration;

use crate::TrackHost;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// How long to wait for the engine to populate the track list. The engine gives no
/// signal when it is done, so the count is polled `attempts` times with `interval` in
/// between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub attempts: u32,
}

impl WaitPolicy {
    pub const fn new(interval: Duration, attempts: u32) -> Self {
        Self { interval, attempts }
    }

    /// Check once, don't wait.
    pub const fn once() -> Self {
        Self::new(Duration::ZERO, 1)
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_MAX_ATTEMPTS)
    }
}

/// Polls until the track list is non-empty and returns its length. Gives up after the
/// last attempt and returns 0, the caller is expected to go on anyway.
pub async fn wait_for_tracks<H>(host: &mut H, policy: &WaitPolicy) -> usize
where
    H: TrackHost + ?Sized,
{
    for attempt in 1..=policy.attempts {
        match host.track_count().await {
            Ok(0) => log::trace!("Track list empty on poll {attempt}"),
            Ok(count) => {
                log::debug!("Found {count} tracks after {attempt} polls");
                return count;
            }
            Err(e) => log::debug!("Polling the track count failed: {e}"),
        }

        if attempt < policy.attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    log::warn!(
        "The track list is still empty after {} polls, continuing anyway",
        policy.attempts
    );
    0
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{fake::FakeHost, Track, TrackKind};

    const FAST: WaitPolicy = WaitPolicy::new(Duration::from_millis(1), 5);

    fn one_track() -> FakeHost {
        FakeHost::new(vec![Track::new(0, 1, TrackKind::Audio)])
    }

    #[tokio::test]
    async fn immediately_ready() {
        let mut host = one_track();
        assert_eq!(1, wait_for_tracks(&mut host, &FAST).await);
        assert_eq!(1, host.count_polls);
    }

    #[tokio::test]
    async fn ready_after_a_while() {
        let mut host = one_track().empty_for(3);
        assert_eq!(1, wait_for_tracks(&mut host, &FAST).await);
        assert_eq!(4, host.count_polls);
    }

    #[tokio::test]
    async fn gives_up() {
        let mut host = one_track().empty_for(100);
        assert_eq!(0, wait_for_tracks(&mut host, &FAST).await);
        assert_eq!(5, host.count_polls);
    }

    #[tokio::test]
    async fn failing_polls_count_as_empty() {
        let mut host = one_track().failing_count_for(2);
        assert_eq!(1, wait_for_tracks(&mut host, &FAST).await);
        assert_eq!(3, host.count_polls);
    }

    #[tokio::test]
    async fn zero_attempts() {
        let mut host = one_track();
        let policy = WaitPolicy::new(Duration::ZERO, 0);
        assert_eq!(0, wait_for_tracks(&mut host, &policy).await);
        assert_eq!(0, host.count_polls);
    }
}
