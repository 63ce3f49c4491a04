use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Source of wall-clock time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds.
    fn now_ms(&self) -> u64;
}

/// [`Clock`] backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock advanced by hand from tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl ManualClock {
    /// Clock frozen at `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: std::sync::atomic::AtomicU64::new(start_ms),
        }
    }

    /// Move forward by whole seconds.
    pub fn advance_secs(&self, seconds: u64) {
        self.advance_ms(seconds * 1000);
    }

    /// Move forward by milliseconds.
    pub fn advance_ms(&self, millis: u64) {
        self.now
            .fetch_add(millis, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// Countdown attached to the active question.
///
/// While running, the authoritative remaining time is derived from `started_at` and the wall
/// clock rather than from `time_left` alone, so the value stays correct after a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    /// Countdown is advancing.
    pub running: bool,
    /// Countdown was paused by the host or by a reveal.
    pub paused: bool,
    /// Countdown uses the pass-on duration.
    pub pass_mode: bool,
    /// Seconds left when the countdown was last anchored.
    pub time_left: Option<u32>,
    /// Anchor of the running countdown, in milliseconds since the epoch.
    pub started_at: Option<u64>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            running: false,
            paused: true,
            pass_mode: false,
            time_left: None,
            started_at: None,
        }
    }
}

impl TimerState {
    /// Stopped countdown holding `seconds`.
    pub fn stopped_at(seconds: u32) -> Self {
        Self {
            time_left: Some(seconds),
            ..Self::default()
        }
    }

    /// Remaining whole seconds at `now_ms`.
    pub fn remaining(&self, fallback: u32, now_ms: u64) -> u32 {
        let base = self.time_left.unwrap_or(fallback);
        match (self.running, self.started_at) {
            (true, Some(started_at)) => {
                let elapsed = now_ms.saturating_sub(started_at) / 1000;
                base.saturating_sub(u32::try_from(elapsed).unwrap_or(u32::MAX))
            }
            _ => base,
        }
    }

    /// Whether the countdown should be ticking.
    pub fn is_ticking(&self) -> bool {
        self.running && !self.paused
    }

    /// Reset to a stopped countdown of `seconds`, leaving pass mode.
    pub fn reset(&mut self, seconds: u32) {
        *self = Self::stopped_at(seconds);
    }

    /// Start (or resume) counting down from the stored value, anchored at `now_ms`.
    pub fn resume(&mut self, fallback: u32, now_ms: u64) {
        let left = self.time_left.unwrap_or(fallback);
        if left == 0 {
            return;
        }
        self.time_left = Some(left);
        self.running = true;
        self.paused = false;
        self.started_at = Some(now_ms);
    }

    /// Freeze the countdown at its remaining value. Pausing a paused timer changes nothing.
    pub fn pause(&mut self, fallback: u32, now_ms: u64) {
        if self.running {
            self.time_left = Some(self.remaining(fallback, now_ms));
        }
        self.running = false;
        self.paused = true;
        self.started_at = None;
    }

    /// Switch to the pass-on countdown of `seconds`, running from `now_ms`.
    pub fn start_pass(&mut self, seconds: u32, now_ms: u64) {
        *self = Self {
            running: true,
            paused: false,
            pass_mode: true,
            time_left: Some(seconds),
            started_at: Some(now_ms),
        };
    }

    /// Advance a running countdown to `now_ms`.
    ///
    /// Whole elapsed seconds are folded into `time_left` and the anchor moves forward by the
    /// same amount. Reaching zero stops the countdown. Returns whether anything changed.
    pub fn tick(&mut self, fallback: u32, now_ms: u64) -> bool {
        if !self.is_ticking() {
            return false;
        }
        let Some(started_at) = self.started_at else {
            self.started_at = Some(now_ms);
            return false;
        };
        let elapsed = now_ms.saturating_sub(started_at) / 1000;
        let left = self.remaining(fallback, now_ms);
        if elapsed == 0 && left > 0 {
            return false;
        }
        self.time_left = Some(left);
        if left == 0 {
            self.running = false;
            self.started_at = None;
        } else {
            self.started_at = Some(started_at + elapsed * 1000);
        }
        true
    }

    /// Copy suitable for a snapshot: paused at the remaining value with no anchor.
    pub fn normalized(&self, fallback: u32, now_ms: u64) -> Self {
        Self {
            running: false,
            paused: true,
            pass_mode: self.pass_mode,
            time_left: Some(self.remaining(fallback, now_ms)),
            started_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000_000;

    fn running(time_left: u32) -> TimerState {
        let mut timer = TimerState::stopped_at(time_left);
        timer.resume(time_left, T0);
        timer
    }

    #[test]
    fn remaining_subtracts_whole_elapsed_seconds() {
        let timer = running(30);
        assert_eq!(timer.remaining(30, T0 + 12_000), 18);
        assert_eq!(timer.remaining(30, T0 + 12_999), 18);
        assert_eq!(timer.remaining(30, T0 + 45_000), 0);
    }

    #[test]
    fn remaining_of_stopped_timer_uses_stored_value_or_fallback() {
        assert_eq!(TimerState::stopped_at(7).remaining(30, T0), 7);
        assert_eq!(TimerState::default().remaining(30, T0), 30);
    }

    #[test]
    fn pause_freezes_remaining_and_second_pause_is_noop() {
        let mut timer = running(30);
        timer.pause(30, T0 + 12_000);
        assert_eq!(timer.time_left, Some(18));
        assert!(!timer.running);
        assert!(timer.paused);
        assert_eq!(timer.started_at, None);

        let frozen = timer;
        timer.pause(30, T0 + 40_000);
        assert_eq!(timer, frozen);
    }

    #[test]
    fn tick_reanchors_and_stops_at_zero() {
        let mut timer = running(2);
        assert!(!timer.tick(2, T0 + 500));
        assert!(timer.tick(2, T0 + 1_000));
        assert_eq!(timer.time_left, Some(1));
        assert_eq!(timer.started_at, Some(T0 + 1_000));

        assert!(timer.tick(2, T0 + 2_100));
        assert_eq!(timer.time_left, Some(0));
        assert!(!timer.running);
        assert_eq!(timer.started_at, None);

        assert!(!timer.tick(2, T0 + 3_000));
        assert_eq!(timer.time_left, Some(0));
    }

    #[test]
    fn resume_keeps_remaining_after_pause() {
        let mut timer = running(30);
        timer.pause(30, T0 + 10_000);
        timer.resume(30, T0 + 60_000);
        assert_eq!(timer.remaining(30, T0 + 65_000), 15);
    }

    #[test]
    fn resume_does_not_restart_an_elapsed_countdown() {
        let mut timer = TimerState::stopped_at(0);
        timer.resume(30, T0);
        assert!(!timer.running);
    }

    #[test]
    fn normalized_copy_is_paused_without_anchor() {
        let timer = running(30);
        let normalized = timer.normalized(30, T0 + 4_000);
        assert_eq!(normalized.time_left, Some(26));
        assert!(normalized.paused);
        assert!(!normalized.running);
        assert_eq!(normalized.started_at, None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn remaining_never_exceeds_base(base in 0u32..600, elapsed in 0u64..1_000_000) {
                let mut timer = TimerState::stopped_at(base);
                timer.resume(base, T0);
                let left = timer.remaining(base, T0 + elapsed);
                prop_assert!(left <= base);
                prop_assert_eq!(left, base.saturating_sub((elapsed / 1000) as u32));
            }

            #[test]
            fn ticking_every_second_counts_down_to_zero(base in 1u32..120) {
                let mut timer = TimerState::stopped_at(base);
                timer.resume(base, T0);
                for second in 1..=u64::from(base) {
                    prop_assert!(timer.tick(base, T0 + second * 1000));
                    prop_assert_eq!(timer.time_left, Some(base - second as u32));
                }
                prop_assert!(!timer.running);
            }
        }
    }
}
