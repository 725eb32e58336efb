//! Playback render unit
//!
//! Consumes blocks delivered by the network side and writes at most one of
//! them into the output quantum per render call. Delivery goes through a
//! [`PlaybackHandle`], which may live on any thread.

use crossbeam::queue::ArrayQueue;
use std::sync::Arc;

use crate::audio::block::AudioBlock;
use crate::audio::buffer::{EnqueueOutcome, InboundQueue, OverflowPolicy, QueueStats};
use crate::config::PlaybackConfig;

pub use crate::audio::block::FillPolicy;

/// Playback unit driven once per render quantum
pub struct PlaybackUnit {
    inbound: Arc<InboundQueue>,
    spent: Arc<ArrayQueue<AudioBlock>>,
    fill: FillPolicy,
}

impl PlaybackUnit {
    /// Name the unit registers under with the host engine
    pub const PROCESSOR_NAME: &'static str = "audioOutputProcess";

    /// Create a unit and the handle that feeds it
    pub fn new(
        capacity: usize,
        overflow: OverflowPolicy,
        fill: FillPolicy,
    ) -> (Self, PlaybackHandle) {
        let inbound = Arc::new(InboundQueue::new(capacity, overflow));
        let spent = Arc::new(ArrayQueue::new(inbound.capacity()));

        let handle = PlaybackHandle {
            inbound: inbound.clone(),
            spent: spent.clone(),
        };
        (Self { inbound, spent, fill }, handle)
    }

    /// Create a unit from the playback section of the config
    pub fn from_config(config: &PlaybackConfig) -> (Self, PlaybackHandle) {
        Self::new(config.queue_capacity, config.overflow, config.fill)
    }

    /// Append a block to the inbound queue
    pub fn enqueue(&self, block: AudioBlock) -> EnqueueOutcome {
        self.inbound.push(block)
    }

    /// Render one output quantum
    ///
    /// With an empty queue `output` is left untouched. Otherwise the head
    /// block is copied in, truncated to the smaller channel count and
    /// length, and the rest of `output` is treated per the fill policy.
    /// Always returns `true`.
    pub fn render_quantum(&mut self, output: &mut AudioBlock) -> bool {
        let Some(block) = self.inbound.pop() else {
            return true;
        };

        block.copy_into(output, self.fill);

        // Hand the allocation back to the delivery side; drop it here only
        // when nobody is reclaiming.
        let _ = self.spent.push(block);
        true
    }

    /// Get the policy for uncovered output samples
    pub fn fill_policy(&self) -> FillPolicy {
        self.fill
    }

    /// Get number of blocks waiting to play
    pub fn queued(&self) -> usize {
        self.inbound.len()
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        self.inbound.stats()
    }
}

/// Delivery side of a [`PlaybackUnit`]
#[derive(Clone)]
pub struct PlaybackHandle {
    inbound: Arc<InboundQueue>,
    spent: Arc<ArrayQueue<AudioBlock>>,
}

impl PlaybackHandle {
    /// Append a block to the tail of the inbound queue; never blocks
    pub fn enqueue(&self, block: AudioBlock) -> EnqueueOutcome {
        self.inbound.push(block)
    }

    /// Take back a block the render thread has finished with
    pub fn reclaim(&self) -> Option<AudioBlock> {
        self.spent.pop()
    }

    /// Get number of queued blocks
    pub fn len(&self) -> usize {
        self.inbound.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.inbound.is_empty()
    }

    /// Get queue fill level as a fraction of capacity
    pub fn fill_level(&self) -> f32 {
        self.inbound.fill_level()
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        self.inbound.stats()
    }
}
