//! Run/pause/stop switches shared between the UI and the producer loop.
use std::{
    sync::{
        Condvar, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

/// Owned by the composition root and handed out by reference (or [`std::sync::Arc`]).
///
/// Pause and resume are plain flag flips. Stop is one-way and also wakes anyone sleeping in
/// [`RunController::sleep`].
#[derive(Debug)]
pub struct RunController {
    running: AtomicBool,
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl Default for RunController {
    fn default() -> Self {
        Self {
            running: AtomicBool::new(true),
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        }
    }
}

impl RunController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.running.store(true, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Ask the producer to exit, waking it if it's asleep
    pub fn stop(&self) {
        // Only a bool behind it, so a poisoned lock is still meaningful
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.wake.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `duration` unless stopped first. Returns false if woken by [`RunController::stop`].
    pub fn sleep(&self, duration: Duration) -> bool {
        let guard = self.stopped.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .wake
            .wait_timeout_while(guard, duration, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        !*guard
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        thread,
        time::{Duration, Instant},
    };

    use super::*;

    #[test]
    fn test_pause_is_idempotent() {
        let control = RunController::new();
        assert!(control.is_running());
        control.pause();
        control.pause();
        assert!(!control.is_running());
        control.resume();
        assert!(control.is_running());
    }

    #[test]
    fn test_sleep_runs_full_duration() {
        let control = RunController::new();
        let start = Instant::now();
        assert!(control.sleep(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_stop_wakes_sleeper() {
        let control = Arc::new(RunController::new());
        let sleeper = {
            let control = control.clone();
            thread::spawn(move || {
                let start = Instant::now();
                let finished = control.sleep(Duration::from_secs(30));
                (finished, start.elapsed())
            })
        };
        thread::sleep(Duration::from_millis(20));
        control.stop();
        let (finished, slept) = sleeper.join().unwrap();
        assert!(!finished);
        assert!(slept < Duration::from_secs(5));
        assert!(control.is_stopped());
    }

    #[test]
    fn test_sleep_after_stop_returns_immediately() {
        let control = RunController::new();
        control.stop();
        let start = Instant::now();
        assert!(!control.sleep(Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
