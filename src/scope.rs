//! The waveform pipeline: a producer ticks synthetic samples into a shared, bounded transfer
//! buffer, and the render side drains it onto a persistent canvas that gets presented every frame.
//!
//! [`Scope`] is the consumer-side handle and owns the canvas. [`SampleGenerator`] is the
//! producer-side handle and is meant to be moved onto its own thread. Both point at one
//! [`Mutex`]-guarded [`state::SharedState`].
use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use derive_new::new;
use thiserror::Error;
use tracing::{debug, info};

pub mod accumulator;
pub mod canvas;
mod generator;
pub mod present;
pub mod scale;
mod state;

use accumulator::CanvasAccumulator;
use present::Surface;
use scale::{InvalidConfiguration, ScaleConfig, ScaleParameters};
use state::SharedState;

pub const MAX_CHANNELS: usize = 8;

/// A position in canvas space. Fractional, the raster rounds when it draws.
#[derive(new, Debug, Default, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Everything one tick produced: a point per channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Batch {
    pub points: [Point; MAX_CHANNELS],
    /// Set on the last sample of a sweep; the canvas is cleared once this batch is drawn
    pub ends_sweep: bool,
}

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("drawing surface unavailable: {0}")]
    InitializationFailure(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] InvalidConfiguration),
    #[error("transfer buffer overrun: all {capacity} batches pending")]
    BufferOverrun { capacity: usize },
    #[error("write cursor {cursor} is outside a {trace_length} sample trace")]
    CursorOutOfRange { cursor: usize, trace_length: usize },
    #[error("scope state poisoned by a panicked thread")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for ScopeError {
    fn from(_: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

/// Render-side handle. Reconfiguration goes through here too, so the canvas is always rebuilt on
/// the same thread that draws on it.
pub struct Scope {
    shared: Arc<Mutex<SharedState>>,
    /// Our copy of what's in `shared`. Only we ever replace it.
    params: ScaleParameters,
    accumulator: CanvasAccumulator,
    frame_rate: u32,
    /// Reused between drains so the render tick doesn't allocate
    drained: Vec<Batch>,
}

impl Scope {
    /// Set up a canvas for a `width` x `height` pixel viewport, running the default
    /// [`ScaleConfig`] until told otherwise.
    ///
    /// `frame_rate` is how often [`Scope::drain_and_render`] is expected to run; the transfer
    /// buffer is sized from it.
    pub fn initialize(width: u32, height: u32, frame_rate: u32) -> Result<Self, ScopeError> {
        if width == 0 || height == 0 {
            return Err(ScopeError::InitializationFailure(format!(
                "viewport {width}x{height} has no area"
            )));
        }
        let params = ScaleParameters::derive(ScaleConfig::default(), width, height, frame_rate)?;
        info!("scope initialized with a {width}x{height} canvas at {frame_rate} fps");

        Ok(Self {
            shared: Arc::new(Mutex::new(SharedState::new(params))),
            params,
            accumulator: CanvasAccumulator::new(&params),
            frame_rate,
            drained: Vec::with_capacity(params.capacity()),
        })
    }

    /// Validate and apply a new configuration, starting a fresh sweep on a fresh canvas.
    /// On error nothing changes.
    pub fn configure(&mut self, config: ScaleConfig) -> Result<(), ScopeError> {
        let params = ScaleParameters::derive(
            config,
            self.params.width(),
            self.params.height(),
            self.frame_rate,
        )?;
        self.apply(params)
    }

    /// Follow a new viewport size, keeping the current configuration.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), ScopeError> {
        if width == 0 || height == 0 {
            return Err(ScopeError::InitializationFailure(format!(
                "viewport {width}x{height} has no area"
            )));
        }
        let params =
            ScaleParameters::derive(self.params.config(), width, height, self.frame_rate)?;
        self.apply(params)
    }

    fn apply(&mut self, params: ScaleParameters) -> Result<(), ScopeError> {
        self.shared.lock()?.reconfigure(params);
        self.params = params;
        self.accumulator.reallocate(&params);
        self.drained.reserve(params.capacity());
        debug!(
            "scope reconfigured: {:?} on {}x{}, buffer holds {} batches",
            params.config(),
            params.width(),
            params.height(),
            params.capacity()
        );
        Ok(())
    }

    /// Take everything the producer has made and draw it. The lock is only held for the take.
    ///
    /// Returns how many line segments were drawn.
    pub fn drain_and_render(&mut self) -> Result<usize, ScopeError> {
        self.shared.lock()?.transfer.drain_into(&mut self.drained);
        let segments = self.accumulator.render(&self.drained);
        self.drained.clear();
        Ok(segments)
    }

    /// Blit the latest finished frame onto `surface`
    pub fn present<S: Surface + ?Sized>(&self, surface: &mut S) {
        self.accumulator.presenter().present(surface)
    }

    /// A producer-side handle on the same state
    pub fn generator(&self) -> SampleGenerator {
        SampleGenerator {
            shared: self.shared.clone(),
        }
    }

    pub fn params(&self) -> &ScaleParameters {
        &self.params
    }

    /// Batches produced but not yet drawn
    pub fn pending(&self) -> Result<usize, ScopeError> {
        Ok(self.shared.lock()?.transfer.len())
    }

    /// Release the canvas. Any [`SampleGenerator`] still alive keeps the shared state (but not the
    /// canvas) around until it is dropped.
    pub fn teardown(self) {
        info!("scope torn down");
    }
}

/// Producer-side handle. Every call takes the shared lock for just that call.
#[derive(Clone)]
pub struct SampleGenerator {
    shared: Arc<Mutex<SharedState>>,
}

impl SampleGenerator {
    /// Generate one sample per channel and queue it for the renderer.
    pub fn tick(&self) -> Result<(), ScopeError> {
        self.shared.lock()?.tick()
    }

    /// Time between ticks at the current sampling rate
    pub fn period(&self) -> Result<Duration, ScopeError> {
        Ok(self.shared.lock()?.params.period())
    }

    /// True when the next tick would overrun the transfer buffer
    pub fn is_saturated(&self) -> Result<bool, ScopeError> {
        Ok(self.shared.lock()?.transfer.is_full())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use canvas::{BACKGROUND, Canvas, GRID};

    fn scope(config: ScaleConfig) -> Scope {
        let mut scope = Scope::initialize(40, 20, 60).unwrap();
        scope.configure(config).unwrap();
        scope
    }

    fn take_pending(scope: &Scope) -> Vec<Batch> {
        let mut out = vec![];
        scope.shared.lock().unwrap().transfer.drain_into(&mut out);
        out
    }

    fn trace_pixels(canvas: &Canvas) -> usize {
        let mut n = 0;
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                let px = canvas.pixel(x, y);
                if px != Some(BACKGROUND) && px != Some(GRID) {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn test_initialize_needs_a_surface() {
        assert!(matches!(
            Scope::initialize(0, 600, 60),
            Err(ScopeError::InitializationFailure(_))
        ));
        let scope = Scope::initialize(1280, 720, 60).unwrap();
        assert_eq!(scope.params().config(), ScaleConfig::default());
        assert_eq!(scope.accumulator.presenter().snapshot().width(), 1280);
    }

    #[test]
    fn test_wrap_clears_before_new_sweep() {
        let mut scope = scope(ScaleConfig {
            trace_length: 4,
            ..Default::default()
        });
        let generator = scope.generator();

        for _ in 0..4 {
            generator.tick().unwrap();
        }
        assert_eq!(scope.shared.lock().unwrap().cursor, 0);
        // 3 segments per channel got drawn, then wiped by the wrap
        assert_eq!(scope.drain_and_render().unwrap(), 3 * MAX_CHANNELS);
        assert_eq!(scope.accumulator.last_points(), &[None; MAX_CHANNELS]);
        assert_eq!(trace_pixels(&scope.accumulator.presenter().snapshot()), 0);

        // First sample of the new sweep connects to nothing
        generator.tick().unwrap();
        assert_eq!(scope.drain_and_render().unwrap(), 0);
        assert_eq!(trace_pixels(&scope.accumulator.presenter().snapshot()), 0);

        // Second one only spans the first step (x 0 -> 10)
        generator.tick().unwrap();
        assert_eq!(scope.drain_and_render().unwrap(), MAX_CHANNELS);
        let frame = scope.accumulator.presenter().snapshot();
        for y in 0..frame.height() {
            for x in 11..frame.width() {
                let px = frame.pixel(x, y);
                assert!(px == Some(BACKGROUND) || px == Some(GRID), "stray pixel at {x},{y}");
            }
        }
    }

    #[test]
    fn test_reconfigure_resets_continuity() {
        let mut scope = scope(ScaleConfig::default());
        let generator = scope.generator();
        for _ in 0..10 {
            generator.tick().unwrap();
        }
        scope.drain_and_render().unwrap();
        generator.tick().unwrap();

        scope
            .configure(ScaleConfig {
                rows: 4,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(scope.accumulator.last_points(), &[None; MAX_CHANNELS]);
        // Pre-configure batch was discarded with the old sweep
        assert_eq!(scope.pending().unwrap(), 0);

        generator.tick().unwrap();
        assert_eq!(scope.drain_and_render().unwrap(), 0);
        let state = scope.shared.lock().unwrap();
        assert_eq!(state.cursor, 1);
        assert_eq!(
            state.channels[0].phase,
            super::generator::advance_phase(0.0, 0, 0.001)
        );
    }

    #[test]
    fn test_drain_is_fifo_and_exact() {
        let config = ScaleConfig {
            trace_length: 7,
            ..Default::default()
        };
        let scope = scope(config);
        let generator = scope.generator();
        let mut reference = SharedState::new(*scope.params());

        for _ in 0..20 {
            generator.tick().unwrap();
            reference.tick().unwrap();
        }
        let mut expected = vec![];
        reference.transfer.drain_into(&mut expected);
        assert_eq!(take_pending(&scope), expected);
    }

    #[test]
    fn test_rejected_configure_keeps_old_state() {
        let good = ScaleConfig::default();
        let mut scope = Scope::initialize(1280, 720, 60).unwrap();
        scope.configure(good).unwrap();
        let generator = scope.generator();
        let mut reference = SharedState::new(*scope.params());
        for _ in 0..3 {
            generator.tick().unwrap();
            reference.tick().unwrap();
        }

        let bad = ScaleConfig {
            y_min: 5.0,
            y_max: 5.0,
            ..good
        };
        assert!(matches!(
            scope.configure(bad),
            Err(ScopeError::InvalidConfiguration(
                InvalidConfiguration::YRange { .. }
            ))
        ));
        assert_eq!(scope.params().config(), good);

        // Mid-sweep state survived: the next sample is what the old configuration would make
        generator.tick().unwrap();
        reference.tick().unwrap();
        let mut expected = vec![];
        reference.transfer.drain_into(&mut expected);
        assert_eq!(take_pending(&scope), expected);
    }

    #[test]
    fn test_huge_sampling_rate_is_rejected() {
        let mut scope = Scope::initialize(160, 96, 60).unwrap();
        let huge = ScaleConfig {
            sampling_rate: u32::MAX,
            ..Default::default()
        };
        assert!(matches!(
            scope.configure(huge),
            Err(ScopeError::InvalidConfiguration(
                InvalidConfiguration::Capacity { .. }
            ))
        ));
        assert_eq!(scope.params().config(), ScaleConfig::default());
        assert_eq!(scope.pending().unwrap(), 0);
    }

    #[test]
    fn test_resize_keeps_config() {
        let config = ScaleConfig {
            cols: 4,
            ..Default::default()
        };
        let mut scope = scope(config);
        scope.resize(80, 30).unwrap();
        assert_eq!(scope.params().config(), config);
        assert_eq!((scope.params().width(), scope.params().height()), (80, 30));
        assert!(matches!(
            scope.resize(80, 0),
            Err(ScopeError::InitializationFailure(_))
        ));
        assert_eq!(scope.params().height(), 30);
    }

    #[test]
    fn test_concurrent_producer_loses_nothing() {
        const TICKS: usize = 500;
        let mut scope = scope(ScaleConfig::default());
        let generator = scope.generator();

        let producer = thread::spawn(move || {
            let mut produced = 0;
            while produced < TICKS {
                match generator.tick() {
                    Ok(()) => produced += 1,
                    // Consumer is behind, wait for it like the real loop does
                    Err(ScopeError::BufferOverrun { .. }) => thread::yield_now(),
                    Err(e) => panic!("{e}"),
                }
            }
        });

        let mut segments = 0;
        while !producer.is_finished() || scope.pending().unwrap() > 0 {
            segments += scope.drain_and_render().unwrap();
            thread::yield_now();
        }
        producer.join().unwrap();
        segments += scope.drain_and_render().unwrap();
        // One sweep is 1000 samples, so no wrap: every sample after the first joins up
        assert_eq!(segments, (TICKS - 1) * MAX_CHANNELS);
    }
}
