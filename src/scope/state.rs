//! The mutex-guarded aggregate both threads share.
use std::collections::VecDeque;

use super::{
    Batch, MAX_CHANNELS, ScopeError,
    scale::ScaleParameters,
};

/// Oscillator state for one channel. Continuity (the last plotted point) lives with the
/// accumulator, since nothing else reads it.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ChannelState {
    /// Always in `[0, 2π)`
    pub phase: f64,
}

/// Bounded FIFO of per-tick batches between producer and consumer.
#[derive(Debug)]
pub struct TransferBuffer {
    batches: VecDeque<Batch>,
    capacity: usize,
}

impl TransferBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            batches: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Refuses rather than evicting when full; dropping a batch would break channel continuity.
    pub fn push(&mut self, batch: Batch) -> Result<(), ScopeError> {
        if self.is_full() {
            return Err(ScopeError::BufferOverrun {
                capacity: self.capacity,
            });
        }
        self.batches.push_back(batch);
        Ok(())
    }

    /// Move every pending batch, oldest first, onto the end of `out`.
    pub fn drain_into(&mut self, out: &mut Vec<Batch>) {
        if self.is_empty() {
            return;
        }
        out.extend(self.batches.drain(..));
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.batches.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop everything and adopt a new capacity.
    pub fn reset(&mut self, capacity: usize) {
        self.batches.clear();
        self.batches.reserve(capacity);
        self.capacity = capacity;
    }
}

#[derive(Debug)]
pub struct SharedState {
    pub params: ScaleParameters,
    pub channels: [ChannelState; MAX_CHANNELS],
    /// X position of the next sample, in `[0, trace_length)`
    pub cursor: usize,
    pub transfer: TransferBuffer,
}

impl SharedState {
    pub fn new(params: ScaleParameters) -> Self {
        Self {
            params,
            channels: [ChannelState::default(); MAX_CHANNELS],
            cursor: 0,
            transfer: TransferBuffer::with_capacity(params.capacity()),
        }
    }

    /// Swap in new parameters and start a fresh sweep. Anything still pending belongs to the old
    /// geometry, so it goes too.
    pub fn reconfigure(&mut self, params: ScaleParameters) {
        self.params = params;
        self.channels = [ChannelState::default(); MAX_CHANNELS];
        self.cursor = 0;
        self.transfer.reset(params.capacity());
    }
}
