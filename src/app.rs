use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use tracing::{info, trace, warn};

use crate::{
    control::RunController,
    event::{Event, EventHandler},
    producer::ProducerEvent,
    scope::{Scope, ScopeError, scale::ScaleConfig},
};

mod surface;
mod ui;

#[derive(Debug, Clone)]
/// Returned from [`App::handle_key_event`]; only these events mutate state directly.
pub enum AppEvent {
    Quit,
    /// Pause Signal
    Pause,
    /// Resume Signal
    Resume,
    Adjust(Adjustment),
}

/// One notch on one of the control panel sliders
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// In steps of [`TRACE_LENGTH_STEP`]
    TraceLength(i32),
    Rows(i32),
    Cols(i32),
    YMin(i32),
    YMax(i32),
}

pub const TRACE_LENGTH_STEP: i64 = 1000;
const TRACE_LENGTH_RANGE: (i64, i64) = (1000, 10000);
const GRID_RANGE: (i64, i64) = (2, 10);
const Y_MIN_RANGE: (f64, f64) = (-10.0, 0.0);
const Y_MAX_RANGE: (f64, f64) = (0.0, 10.0);

fn nudge(value: u32, delta: i64, (lo, hi): (i64, i64)) -> u32 {
    (value as i64 + delta).clamp(lo, hi) as u32
}

impl Adjustment {
    /// Slider ranges deliberately let y min and y max meet at 0, which `configure` then refuses.
    pub fn apply(self, config: ScaleConfig) -> ScaleConfig {
        match self {
            Adjustment::TraceLength(d) => ScaleConfig {
                trace_length: nudge(
                    config.trace_length,
                    d as i64 * TRACE_LENGTH_STEP,
                    TRACE_LENGTH_RANGE,
                ),
                ..config
            },
            Adjustment::Rows(d) => ScaleConfig {
                rows: nudge(config.rows, d as i64, GRID_RANGE),
                ..config
            },
            Adjustment::Cols(d) => ScaleConfig {
                cols: nudge(config.cols, d as i64, GRID_RANGE),
                ..config
            },
            Adjustment::YMin(d) => ScaleConfig {
                y_min: (config.y_min + d as f64).clamp(Y_MIN_RANGE.0, Y_MIN_RANGE.1),
                ..config
            },
            Adjustment::YMax(d) => ScaleConfig {
                y_max: (config.y_max + d as f64).clamp(Y_MAX_RANGE.0, Y_MAX_RANGE.1),
                ..config
            },
        }
    }
}

pub struct App {
    running: bool,
    events: EventHandler,
    scope: Scope,
    control: Arc<RunController>,
    /// Set once the producer reports it has given up
    producer_halted: Option<String>,
    /// Pixel size of the trace area as of the last draw
    viewport_hint: Option<(u32, u32)>,
}

impl App {
    pub fn new(events: EventHandler, scope: Scope, control: Arc<RunController>) -> Self {
        Self {
            running: true,
            events,
            scope,
            control,
            producer_halted: None,
            viewport_hint: None,
        }
    }

    /// Hands the scope back on a clean exit so it can be torn down.
    pub fn run(mut self, mut term: DefaultTerminal) -> Result<Scope> {
        while self.running {
            term.draw(|frame| frame.render_widget(&mut self, frame.area()))?;
            self.update()?;
        }
        Ok(self.scope)
    }

    fn update(&mut self) -> Result<()> {
        let response_event: Option<AppEvent> = match self.events.next()? {
            Event::App(event) => {
                match event {
                    AppEvent::Quit => self.quit(),
                    AppEvent::Pause => {
                        info!("signal paused");
                        self.control.pause();
                    }
                    AppEvent::Resume => {
                        info!("signal resumed");
                        self.control.resume();
                    }
                    AppEvent::Adjust(adjustment) => {
                        let config = adjustment.apply(self.scope.params().config());
                        self.rescale(config)?;
                    }
                }
                None
            }
            Event::Crossterm(event) => match event {
                crossterm::event::Event::Key(event) if event.kind == KeyEventKind::Press => {
                    trace!("app handling crossterm event: {:?}", event);
                    self.handle_key_event(event)
                }
                _ => None,
            },
            Event::Tick => {
                self.follow_viewport()?;
                self.scope.drain_and_render()?;
                None
            }
            Event::Producer(ProducerEvent::Halted(reason)) => {
                self.producer_halted = Some(reason);
                None
            }
        };

        if let Some(event) = response_event {
            self.events.enqueue_app_event(event);
        }
        Ok(())
    }

    fn handle_key_event(&mut self, event: KeyEvent) -> Option<AppEvent> {
        let adjust = |a| Some(AppEvent::Adjust(a));
        match event.code {
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(AppEvent::Quit)
            }
            KeyCode::Char('q') | KeyCode::Esc => Some(AppEvent::Quit),
            KeyCode::Char('p') => Some(AppEvent::Pause),
            KeyCode::Char('r') => Some(AppEvent::Resume),
            KeyCode::Left => adjust(Adjustment::TraceLength(-1)),
            KeyCode::Right => adjust(Adjustment::TraceLength(1)),
            KeyCode::Char('-') => adjust(Adjustment::Rows(-1)),
            KeyCode::Char('+') | KeyCode::Char('=') => adjust(Adjustment::Rows(1)),
            KeyCode::Char('<') | KeyCode::Char(',') => adjust(Adjustment::Cols(-1)),
            KeyCode::Char('>') | KeyCode::Char('.') => adjust(Adjustment::Cols(1)),
            KeyCode::Char('y') => adjust(Adjustment::YMin(-1)),
            KeyCode::Char('Y') => adjust(Adjustment::YMin(1)),
            KeyCode::Char('u') => adjust(Adjustment::YMax(-1)),
            KeyCode::Char('U') => adjust(Adjustment::YMax(1)),
            _ => None,
        }
    }

    /// Apply a new configuration, or log why not and carry on with the old one.
    fn rescale(&mut self, config: ScaleConfig) -> Result<()> {
        if config == self.scope.params().config() {
            return Ok(());
        }
        match self.scope.configure(config) {
            Ok(()) => info!(
                "rescaled: {} samples/sweep, {}x{} grid, y {}..{}",
                config.trace_length, config.rows, config.cols, config.y_min, config.y_max
            ),
            Err(ScopeError::InvalidConfiguration(e)) => {
                warn!("keeping previous scale, new one rejected: {e}")
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Reallocate the canvas if the trace area changed size since we last drew.
    fn follow_viewport(&mut self) -> Result<()> {
        let Some((width, height)) = self.viewport_hint else {
            return Ok(());
        };
        let params = self.scope.params();
        if (width, height) == (params.width(), params.height()) || width == 0 || height == 0 {
            return Ok(());
        }
        info!("trace area is now {width}x{height} pixels");
        self.scope.resize(width, height)?;
        Ok(())
    }

    /// Causes break and clean exit on next [`App::run`] loop
    fn quit(&mut self) {
        trace!("app quit requested");
        self.running = false;
    }
}
