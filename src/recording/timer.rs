//! Elapsed-time counter for a recording in progress.
//!
//! A one-second-resolution ticker implemented as an explicit tokio task so
//! every exit transition of the recorder can cancel it. The count is shared
//! through an atomic so the recording screen can read it without locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Cancellable one-second ticker.
#[derive(Debug, Default)]
pub struct ElapsedTimer {
    seconds: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl ElapsedTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the count to zero and starts ticking. Restarting an already
    /// running timer replaces the previous ticker task.
    pub fn start(&mut self) {
        self.abort_task();
        self.seconds.store(0, Ordering::Relaxed);

        let seconds = Arc::clone(&self.seconds);
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick fires immediately; skip it so second 1 lands
            // after one second of recording.
            interval.tick().await;
            loop {
                interval.tick().await;
                seconds.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }

    /// Stops ticking, keeping the elapsed count (recording finalized).
    pub fn stop(&mut self) {
        self.abort_task();
    }

    /// Stops ticking and clears the count (recording cancelled).
    pub fn reset(&mut self) {
        self.abort_task();
        self.seconds.store(0, Ordering::Relaxed);
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.seconds.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ElapsedTimer {
    fn drop(&mut self) {
        self.abort_task();
    }
}

/// Formats seconds as `M:SS` for the recording screen.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_padded_seconds() {
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(9), "0:09");
        assert_eq!(format_elapsed(61), "1:01");
        assert_eq!(format_elapsed(600), "10:00");
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_second_until_stopped() {
        let mut timer = ElapsedTimer::new();
        timer.start();
        assert!(timer.is_running());

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let elapsed = timer.elapsed_secs();
        assert!((2..=4).contains(&elapsed), "elapsed was {elapsed}");

        timer.stop();
        assert!(!timer.is_running());
        let frozen = timer.elapsed_secs();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(timer.elapsed_secs(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears_the_count() {
        let mut timer = ElapsedTimer::new();
        timer.start();
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert!(timer.elapsed_secs() > 0);

        timer.reset();
        assert_eq!(timer.elapsed_secs(), 0);
        assert!(!timer.is_running());
    }
}
