//! The synthetic signal source: one sinusoid per channel, sampled on every tick.
//!
//! Channel `i` runs at `1.0 + 0.5·i` Hz with amplitude `(i + 1) / 2`, so higher channels are both
//! faster and louder. All channels share the one write cursor, which means they sweep and wrap
//! together no matter their frequency.
use std::f64::consts::TAU;

use super::{Batch, MAX_CHANNELS, Point, ScopeError, state::SharedState};

/// Oscillator frequency of a channel, in Hz
pub fn frequency(channel: usize) -> f64 {
    1.0 + 0.5 * channel as f64
}

/// Peak value of a channel's signal
pub fn amplitude(channel: usize) -> f64 {
    (channel + 1) as f64 / 2.0
}

/// Advance a phase by one sample of `channel`, keeping it in `[0, 2π)` so long runs don't lose
/// precision.
pub fn advance_phase(phase: f64, channel: usize, time_step: f64) -> f64 {
    (phase + TAU * frequency(channel) * time_step).rem_euclid(TAU)
}

impl SharedState {
    /// Produce one batch and advance the sweep.
    ///
    /// Fails without touching anything if the cursor is corrupt or there's no room for the batch.
    pub fn tick(&mut self) -> Result<(), ScopeError> {
        let trace_length = self.params.trace_length();
        if self.cursor >= trace_length {
            return Err(ScopeError::CursorOutOfRange {
                cursor: self.cursor,
                trace_length,
            });
        }
        if self.transfer.is_full() {
            return Err(ScopeError::BufferOverrun {
                capacity: self.transfer.capacity(),
            });
        }

        let x = self.params.to_canvas_x(self.cursor);
        let mut points = [Point::default(); MAX_CHANNELS];
        for (i, (channel, point)) in self.channels.iter_mut().zip(&mut points).enumerate() {
            channel.phase = advance_phase(channel.phase, i, self.params.time_step());
            let raw = channel.phase.sin() * amplitude(i);
            *point = Point::new(x, self.params.to_canvas_y(raw));
        }

        self.cursor += 1;
        let ends_sweep = self.cursor == trace_length;
        if ends_sweep {
            // Canvas clear is the consumer's job, we just mark where it goes
            self.cursor = 0;
        }
        self.transfer.push(Batch { points, ends_sweep })
    }
}
