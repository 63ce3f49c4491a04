use std::{future::Future, sync::Mutex, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

/// Period of the countdown tick.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Cancellable recurring task driving the countdown.
///
/// At most one task runs at a time: arming replaces the running task, disarming aborts it.
/// Disarming an idle ticker is a no-op.
#[derive(Default)]
pub struct Ticker {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Ticker {
    /// Idle ticker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `on_tick` every `period`, starting one period from now, until it returns `false` or
    /// the ticker is disarmed.
    pub fn arm<F, Fut>(&self, period: Duration, mut on_tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticks.tick().await;
            loop {
                ticks.tick().await;
                if !on_tick().await {
                    break;
                }
            }
        });
        if let Some(previous) = self.swap(Some(handle)) {
            previous.abort();
        }
    }

    /// Abort the running task, if any.
    pub fn disarm(&self) {
        if let Some(previous) = self.swap(None) {
            previous.abort();
        }
    }

    /// Whether a task is scheduled and has not finished yet.
    pub fn is_armed(&self) -> bool {
        match self.task.lock() {
            Ok(guard) => guard.as_ref().is_some_and(|handle| !handle.is_finished()),
            Err(poisoned) => poisoned
                .into_inner()
                .as_ref()
                .is_some_and(|handle| !handle.is_finished()),
        }
    }

    fn swap(&self, next: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        let mut guard = match self.task.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    fn counting(ticker: &Ticker, limit: u32) -> Arc<AtomicU32> {
        let count = Arc::new(AtomicU32::new(0));
        let counter = count.clone();
        ticker.arm(TICK_PERIOD, move || {
            let counter = counter.clone();
            async move { counter.fetch_add(1, Ordering::SeqCst) + 1 < limit }
        });
        count
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period_until_the_callback_stops() {
        let ticker = Ticker::new();
        let count = counting(&ticker, 3);
        assert!(ticker.is_armed());

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!ticker.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_is_idempotent_and_stops_ticking() {
        let ticker = Ticker::new();
        ticker.disarm();
        let count = counting(&ticker, u32::MAX);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        ticker.disarm();
        ticker.disarm();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!ticker.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_running_task() {
        let ticker = Ticker::new();
        let first = counting(&ticker, u32::MAX);
        tokio::time::sleep(Duration::from_millis(500)).await;
        let second = counting(&ticker, u32::MAX);

        tokio::time::sleep(Duration::from_millis(1_200)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
