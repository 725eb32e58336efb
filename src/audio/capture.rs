//! Capture render unit
//!
//! Forwards each captured quantum to an outbound channel while the capture
//! flag is set. The flag is flipped from any thread through a
//! [`CaptureControl`]; the render thread only ever loads it.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::audio::block::AudioBlock;

/// State shared between the unit and its control handles
#[derive(Default)]
struct CaptureShared {
    active: AtomicBool,
    emitted: AtomicU64,
    rejected: AtomicU64,
}

/// Capture unit driven once per render quantum
pub struct CaptureUnit {
    shared: Arc<CaptureShared>,
    outbound: Sender<AudioBlock>,
}

impl CaptureUnit {
    /// Name the unit registers under with the host engine
    pub const PROCESSOR_NAME: &'static str = "audioInputProcess";

    /// Create a unit emitting into `outbound`; capture starts inactive
    pub fn new(outbound: Sender<AudioBlock>) -> Self {
        Self {
            shared: Arc::new(CaptureShared::default()),
            outbound,
        }
    }

    /// Create a unit together with a bounded outbound channel
    pub fn channel(capacity: usize) -> (Self, Receiver<AudioBlock>) {
        let (tx, rx) = bounded(capacity);
        (Self::new(tx), rx)
    }

    /// Handle for flipping the capture flag from another thread
    pub fn control(&self) -> CaptureControl {
        CaptureControl {
            shared: self.shared.clone(),
        }
    }

    /// Set the capture flag
    pub fn set_active(&self, enabled: bool) {
        self.shared.active.store(enabled, Ordering::Release);
    }

    /// Check if capture is on
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    /// Process one captured quantum
    ///
    /// Emits `block` unchanged when active. Never blocks: a full or closed
    /// outbound channel loses the block and bumps the rejected counter.
    /// Always returns `true`.
    pub fn render_quantum(&mut self, block: AudioBlock) -> bool {
        if !self.shared.active.load(Ordering::Acquire) {
            return true;
        }

        match self.outbound.try_send(block) {
            Ok(()) => {
                self.shared.emitted.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.shared.rejected.fetch_add(1, Ordering::Relaxed);
            }
        }
        true
    }

    /// Blocks handed to the outbound channel
    pub fn emitted(&self) -> u64 {
        self.shared.emitted.load(Ordering::Relaxed)
    }

    /// Blocks the outbound channel refused
    pub fn rejected(&self) -> u64 {
        self.shared.rejected.load(Ordering::Relaxed)
    }
}

/// Cloneable control handle for a [`CaptureUnit`]
#[derive(Clone)]
pub struct CaptureControl {
    shared: Arc<CaptureShared>,
}

impl CaptureControl {
    /// Set the capture flag; last write wins
    pub fn set_active(&self, enabled: bool) {
        self.shared.active.store(enabled, Ordering::Release);
    }

    /// Check if capture is on
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    /// Apply a control message payload
    ///
    /// Only a JSON boolean changes the flag. Anything else is ignored and
    /// the previous value persists.
    pub fn handle_message(&self, payload: &serde_json::Value) {
        match payload.as_bool() {
            Some(enabled) => {
                tracing::debug!("Capture {}", if enabled { "enabled" } else { "disabled" });
                self.set_active(enabled);
            }
            None => {
                tracing::warn!("Ignoring malformed capture control message: {}", payload);
            }
        }
    }

    /// Blocks handed to the outbound channel
    pub fn emitted(&self) -> u64 {
        self.shared.emitted.load(Ordering::Relaxed)
    }

    /// Blocks the outbound channel refused
    pub fn rejected(&self) -> u64 {
        self.shared.rejected.load(Ordering::Relaxed)
    }
}
