//! Lock-free inbound queue for playback blocks
//!
//! Fixed-capacity FIFO shared between the delivery path (producer) and the
//! render thread (consumer). Neither side ever blocks. When the producer
//! outruns the consumer the configured [`OverflowPolicy`] decides which
//! block is lost.

use crossbeam::queue::ArrayQueue;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::audio::block::AudioBlock;

/// Which block to lose when the queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the head of the queue; keeps playback latency bounded
    #[default]
    DropOldest,
    /// Reject the incoming block
    DropNewest,
}

/// Result of pushing into a full or non-full queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    /// Queued after evicting the oldest block
    DisplacedOldest,
    /// Not queued; the queue was full
    Rejected,
}

/// Bounded FIFO of audio blocks
pub struct InboundQueue {
    queue: ArrayQueue<AudioBlock>,
    policy: OverflowPolicy,
    enqueued: AtomicUsize,
    overflow_count: AtomicUsize,
    underrun_count: AtomicUsize,
}

impl InboundQueue {
    /// Create a new queue; a capacity of 0 is raised to 1
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            queue: ArrayQueue::new(capacity.max(1)),
            policy,
            enqueued: AtomicUsize::new(0),
            overflow_count: AtomicUsize::new(0),
            underrun_count: AtomicUsize::new(0),
        }
    }

    /// Append a block to the tail
    pub fn push(&self, block: AudioBlock) -> EnqueueOutcome {
        let outcome = match self.policy {
            OverflowPolicy::DropOldest => match self.queue.force_push(block) {
                None => EnqueueOutcome::Queued,
                Some(_evicted) => EnqueueOutcome::DisplacedOldest,
            },
            OverflowPolicy::DropNewest => match self.queue.push(block) {
                Ok(()) => EnqueueOutcome::Queued,
                Err(_) => EnqueueOutcome::Rejected,
            },
        };

        if outcome != EnqueueOutcome::Rejected {
            self.enqueued.fetch_add(1, Ordering::Relaxed);
        }
        if outcome != EnqueueOutcome::Queued {
            self.overflow_count.fetch_add(1, Ordering::Relaxed);
        }
        outcome
    }

    /// Pop the head block
    /// Returns None if the queue is empty (underrun)
    pub fn pop(&self) -> Option<AudioBlock> {
        match self.queue.pop() {
            Some(block) => Some(block),
            None => {
                self.underrun_count.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Try to pop without counting underrun
    pub fn try_pop(&self) -> Option<AudioBlock> {
        self.queue.pop()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Check if the queue is full
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    /// Get number of queued blocks
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Get queue capacity
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Get the overflow policy
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Get fill level as a fraction of capacity
    pub fn fill_level(&self) -> f32 {
        self.len() as f32 / self.capacity() as f32
    }

    /// Get statistics
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            level: self.len(),
            capacity: self.capacity(),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            overflows: self.overflow_count.load(Ordering::Relaxed),
            underruns: self.underrun_count.load(Ordering::Relaxed),
        }
    }

    /// Reset statistics
    pub fn reset_stats(&self) {
        self.enqueued.store(0, Ordering::Relaxed);
        self.overflow_count.store(0, Ordering::Relaxed);
        self.underrun_count.store(0, Ordering::Relaxed);
    }
}

/// Inbound queue statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub level: usize,
    pub capacity: usize,
    pub enqueued: usize,
    pub overflows: usize,
    pub underruns: usize,
}
