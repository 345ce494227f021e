//! Fixed-interval retry timer for resources stuck in the failed state.
//!
//! A [`RetryScheduler`] owns at most one timer task. The task sleeps for the
//! interval, then calls the supplied `tick` closure; it keeps going for as
//! long as `tick` returns `true`. Arming an already-armed scheduler does
//! nothing, so repeated failures never stack timers.
//!
//! The timer is aborted by [`RetryScheduler::cancel`] and when the scheduler
//! is dropped, so it cannot outlive its owner.

use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct RetryScheduler {
    timer: Option<JoinHandle<()>>,
}

impl RetryScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the timer unless one is already live.
    ///
    /// Returns `true` if a new timer was started.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn arm<F>(&mut self, interval: Duration, mut tick: F) -> bool
    where
        F: FnMut() -> bool + Send + 'static,
    {
        if self.is_armed() {
            return false;
        }

        let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(interval_ms, "retry timer armed");
        self.timer = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                tracing::debug!(interval_ms, "retry timer fired");
                if !tick() {
                    break;
                }
            }
        }));
        true
    }

    /// Aborts the live timer, if any. Returns `true` if one was running.
    pub fn cancel(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) if !timer.is_finished() => {
                timer.abort();
                tracing::debug!("retry timer cancelled");
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
