//! Scale configuration and the geometry derived from it.
//!
//! Everything the generator and the accumulator need to turn a raw signal value into a canvas
//! coordinate lives here, recomputed in one go whenever any input changes.
use std::time::Duration;

use thiserror::Error;

/// How many render frames' worth of batches the transfer buffer holds before the producer throttles
pub const FRAME_HEADROOM: usize = 8;

/// Most batches the transfer buffer may hold. It is allocated up front, so this also bounds the
/// sampling rate a given frame rate can keep up with.
pub const MAX_CAPACITY: usize = 1 << 16;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidConfiguration {
    #[error("sampling rate must be at least 1 Hz")]
    SamplingRate,
    #[error("trace length must be at least 1 sample")]
    TraceLength,
    #[error("need at least 2 rows, got {0}")]
    Rows(u32),
    #[error("need at least 2 cols, got {0}")]
    Cols(u32),
    #[error("y max ({max}) must be greater than y min ({min})")]
    YRange { min: f64, max: f64 },
    #[error("viewport {width}x{height} has no area")]
    Viewport { width: u32, height: u32 },
    #[error("frame rate must be at least 1 Hz")]
    FrameRate,
    #[error("{sampling_rate} Hz at {frame_rate} fps needs {capacity} batches, limit is {max}", max = MAX_CAPACITY)]
    Capacity {
        sampling_rate: u32,
        frame_rate: u32,
        capacity: usize,
    },
}

/// The knobs a caller can turn. Defaults match the classic 1 kHz / 10x10 / ±6 setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleConfig {
    pub sampling_rate: u32,
    pub trace_length: u32,
    pub rows: u32,
    pub cols: u32,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 1000,
            trace_length: 1000,
            rows: 10,
            cols: 10,
            y_min: -6.0,
            y_max: 6.0,
        }
    }
}

impl ScaleConfig {
    pub fn validate(&self) -> Result<(), InvalidConfiguration> {
        if self.sampling_rate < 1 {
            return Err(InvalidConfiguration::SamplingRate);
        }
        if self.trace_length < 1 {
            return Err(InvalidConfiguration::TraceLength);
        }
        if self.rows < 2 {
            return Err(InvalidConfiguration::Rows(self.rows));
        }
        if self.cols < 2 {
            return Err(InvalidConfiguration::Cols(self.cols));
        }
        // Also catches NaN, which fails every comparison
        if !(self.y_max > self.y_min) || !self.y_min.is_finite() || !self.y_max.is_finite() {
            return Err(InvalidConfiguration::YRange {
                min: self.y_min,
                max: self.y_max,
            });
        }
        Ok(())
    }
}

/// A validated [`ScaleConfig`] bound to a concrete canvas size, with every derived field filled in.
///
/// Only constructible through [`ScaleParameters::derive`], so holding one means the invariants hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParameters {
    config: ScaleConfig,
    width: u32,
    height: u32,
    time_step: f64,
    pixels_per_sample: f32,
    x_step: f32,
    y_step: f32,
    capacity: usize,
}

impl ScaleParameters {
    pub fn derive(
        config: ScaleConfig,
        width: u32,
        height: u32,
        frame_rate: u32,
    ) -> Result<Self, InvalidConfiguration> {
        config.validate()?;
        if width == 0 || height == 0 {
            return Err(InvalidConfiguration::Viewport { width, height });
        }
        if frame_rate < 1 {
            return Err(InvalidConfiguration::FrameRate);
        }

        let per_frame = config.sampling_rate.div_ceil(frame_rate) as usize;
        let capacity = per_frame.saturating_mul(FRAME_HEADROOM);
        if capacity > MAX_CAPACITY {
            return Err(InvalidConfiguration::Capacity {
                sampling_rate: config.sampling_rate,
                frame_rate,
                capacity,
            });
        }

        Ok(Self {
            config,
            width,
            height,
            time_step: 1.0 / config.sampling_rate as f64,
            pixels_per_sample: width as f32 / config.trace_length as f32,
            x_step: width as f32 / config.cols as f32,
            y_step: height as f32 / config.rows as f32,
            capacity,
        })
    }

    pub fn config(&self) -> ScaleConfig {
        self.config
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn trace_length(&self) -> usize {
        self.config.trace_length as usize
    }

    /// Seconds between two samples
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Wall-clock period of the producer loop
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(self.time_step)
    }

    pub fn pixels_per_sample(&self) -> f32 {
        self.pixels_per_sample
    }

    pub fn x_step(&self) -> f32 {
        self.x_step
    }

    pub fn y_step(&self) -> f32 {
        self.y_step
    }

    /// Transfer buffer capacity in batches
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Map a raw signal value into canvas Y. Values outside `[y_min, y_max]` pin to the edges;
    /// larger values sit higher on screen.
    pub fn to_canvas_y(&self, raw: f64) -> f32 {
        let ScaleConfig { y_min, y_max, .. } = self.config;
        let norm = ((raw - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
        ((1.0 - norm) * self.height as f64) as f32
    }

    /// Canvas X for a write cursor position
    pub fn to_canvas_x(&self, cursor: usize) -> f32 {
        self.pixels_per_sample() * cursor as f32
    }
}
