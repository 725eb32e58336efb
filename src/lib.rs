//! # wsvoip-audio
//!
//! Real-time render units for a two-party voice link.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────── LOCAL PEER ───────────────────────────────┐
//! │                                                                            │
//! │  control: on/off ──► CaptureControl ──(AtomicBool)──┐                      │
//! │                                                     ▼                      │
//! │  ┌────────────┐  quantum  ┌──────────────────┐   AudioBlock   ┌─────────┐  │
//! │  │ Microphone │ ────────► │ CaptureUnit      │ ─────────────► │ network │──┼──► peer
//! │  └────────────┘           │ (render thread)  │   try_send     │ sender  │  │
//! │                           └──────────────────┘                └─────────┘  │
//! │                                                                            │
//! │  ┌────────────┐  quantum  ┌──────────────────┐   AudioBlock   ┌─────────┐  │
//! │  │ Speakers   │ ◄──────── │ PlaybackUnit     │ ◄───────────── │ network │◄─┼─── peer
//! │  └────────────┘           │ (render thread)  │  InboundQueue  │ receiver│  │
//! │                           └──────────────────┘  (lock-free)   └─────────┘  │
//! └────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The units only expose construction and per-quantum entry points. The
//! [`host`] module binds them to cpal devices; any other engine can drive
//! them the same way.

pub mod audio;
pub mod config;
pub mod error;
pub mod host;
pub mod protocol;

pub use audio::{AudioBlock, CaptureControl, CaptureUnit, PlaybackHandle, PlaybackUnit};
pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Default sample rate for device streams
    pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

    /// Default channel count (stereo)
    pub const DEFAULT_CHANNELS: u16 = 2;

    /// Frames per channel in one render quantum
    pub const RENDER_QUANTUM_FRAMES: usize = 128;

    /// Inbound playback queue capacity (in quanta)
    pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

    /// Outbound capture channel capacity (in quanta)
    pub const DEFAULT_OUTBOUND_CAPACITY: usize = 64;
}
