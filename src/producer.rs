//! The sample-generating thread.
//!
//! Ticks the [`SampleGenerator`] once per sample period on a self-correcting schedule: each wakeup
//! is planned from the previous *deadline*, not from when the last tick finished, so the long-run
//! rate holds even when individual sleeps overshoot.
use std::{
    sync::{Arc, mpsc},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use derive_new::new;
use tracing::{error, info, warn};

use crate::{
    control::RunController,
    event::Event,
    scope::{SampleGenerator, ScopeError},
};

/// How often a paused or throttled loop checks back in
pub const IDLE_INTERVAL: Duration = Duration::from_millis(10);
/// Falling further behind than this resets the schedule instead of bursting to catch up
const MAX_LAG: Duration = Duration::from_millis(50);
const JOIN_POLL: Duration = Duration::from_millis(1);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProducerEvent {
    /// The loop hit an error it can't continue past and has exited
    Halted(String),
}

#[derive(new)]
struct ProducerLoop {
    generator: SampleGenerator,
    control: Arc<RunController>,
}

impl ProducerLoop {
    fn run(self) -> Result<(), ScopeError> {
        info!("producer loop starting");
        let mut next = Instant::now();
        let mut throttled = false;

        while !self.control.is_stopped() {
            if !self.control.is_running() {
                self.control.sleep(IDLE_INTERVAL);
                next = Instant::now();
                continue;
            }

            // Renderer hasn't drained yet. Hold off rather than lose samples.
            if self.generator.is_saturated()? {
                if !throttled {
                    warn!("transfer buffer full, producer throttling until the renderer catches up");
                    throttled = true;
                }
                self.control.sleep(IDLE_INTERVAL);
                next = Instant::now();
                continue;
            }
            throttled = false;

            self.generator.tick()?;

            next += self.generator.period()?;
            let now = Instant::now();
            match next.checked_duration_since(now) {
                Some(wait) => {
                    self.control.sleep(wait);
                }
                None if now - next > MAX_LAG => next = now,
                None => {}
            }
        }

        info!("producer loop exiting");
        Ok(())
    }
}

/// Handle on a running producer thread
pub struct ProducerThread {
    control: Arc<RunController>,
    handle: JoinHandle<()>,
}

/// Start ticking `generator` on a new thread. Errors end the loop and are reported on `event_tx`.
pub fn spawn(
    generator: SampleGenerator,
    control: Arc<RunController>,
    event_tx: mpsc::Sender<Event>,
) -> ProducerThread {
    let worker = ProducerLoop::new(generator, control.clone());
    let handle = thread::spawn(move || {
        if let Err(e) = worker.run() {
            error!("producer halted: {e}");
            // Nobody listening just means the app is already gone
            let _ = event_tx.send(Event::Producer(ProducerEvent::Halted(e.to_string())));
        }
    });
    ProducerThread { control, handle }
}

impl ProducerThread {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the loop and wait up to `timeout` for it to exit. Returns false if it had to be
    /// abandoned instead.
    pub fn shutdown(self, timeout: Duration) -> bool {
        self.control.stop();
        let deadline = Instant::now() + timeout;
        while !self.is_finished() {
            if Instant::now() >= deadline {
                warn!("producer didn't stop within {timeout:?}, abandoning it");
                return false;
            }
            thread::sleep(JOIN_POLL);
        }
        if self.handle.join().is_err() {
            error!("producer thread panicked");
        }
        info!("producer joined");
        true
    }
}
