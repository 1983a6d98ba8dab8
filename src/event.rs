use crate::{app::AppEvent, producer::ProducerEvent};
use color_eyre::eyre::WrapErr;
use crossterm::event::{self, Event as CrosstermEvent};
use std::thread;
use std::{
    sync::mpsc,
    time::{Duration, Instant},
};
use tracing::{info, trace};

#[derive(Clone, Debug)]
pub enum Event {
    Crossterm(CrosstermEvent),
    /// Time to drain and redraw the scope
    Tick,
    App(AppEvent),
    Producer(ProducerEvent),
}

/// Terminal event handler.
pub struct EventHandler {
    sender: mpsc::Sender<Event>,
    receiver: mpsc::Receiver<Event>,
}

impl EventHandler {
    /// Constructs a new instance of [`EventHandler`] and spawns a new thread to handle events,
    /// ticking `frame_rate` times a second.
    pub fn new(frame_rate: u32) -> Self {
        let (sender, receiver) = mpsc::channel();
        let actor = EventThread::new(sender.clone(), frame_rate);
        thread::spawn(|| actor.run());
        Self { sender, receiver }
    }

    /// Receives an event from the sender.
    ///
    /// This function blocks until an event is received.
    ///
    /// # Errors
    ///
    /// This function returns an error if the sender channel is disconnected. This can happen if an
    /// error occurs in the event thread. In practice, this should not happen unless there is a
    /// problem with the underlying terminal.
    pub fn next(&self) -> color_eyre::Result<Event> {
        Ok(self.receiver.recv()?)
    }

    /// Get a sender, intended for other threads that wish to send events to the
    /// [`crate::app::App`]
    pub fn get_sender(&self) -> mpsc::Sender<Event> {
        self.sender.clone()
    }

    /// Queue an event the app raised for itself
    pub fn enqueue_app_event(&self, event: AppEvent) {
        trace!("event handler enqueueing app event: {:?}", event);
        let _ = self.sender.send(Event::App(event));
    }
}

/// A thread that handles reading crossterm events and emitting tick events on a regular schedule.
struct EventThread {
    sender: mpsc::Sender<Event>,
    frame_period: Duration,
}

impl EventThread {
    fn new(sender: mpsc::Sender<Event>, frame_rate: u32) -> Self {
        Self {
            sender,
            frame_period: Duration::from_secs(1) / frame_rate.max(1),
        }
    }

    /// Runs the event thread.
    ///
    /// Polls for crossterm events until the next frame is due, then emits a tick.
    fn run(self) -> color_eyre::Result<()> {
        info!("event thread loop starting");
        let mut next_tick = Instant::now() + self.frame_period;
        loop {
            let timeout = next_tick.saturating_duration_since(Instant::now());
            if event::poll(timeout).wrap_err("failed to poll for crossterm events")? {
                let event = event::read().wrap_err("failed to read crossterm event")?;
                trace!("event thread recieved crossterm event: {:?}", event);
                self.send(Event::Crossterm(event));
            }

            let now = Instant::now();
            if now >= next_tick {
                self.send(Event::Tick);
                next_tick += self.frame_period;
                // Don't fire a burst of ticks after being starved (e.g. suspended terminal)
                if next_tick < now {
                    next_tick = now + self.frame_period;
                }
            }
        }
    }

    fn send(&self, event: Event) {
        // Ignores the result because shutting down the app drops the receiver, which causes the send
        // operation to fail. This is expected behavior and should not panic.
        let _ = self.sender.send(event);
    }
}
