//! Host engine binding
//!
//! The units know nothing about devices or threads. This module supplies
//! what a host engine needs to drive them: the names they register under,
//! fault containment around each render call, and adapters between the
//! variable-size interleaved buffers devices hand out and fixed planar
//! quanta.

pub mod stream;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::audio::block::AudioBlock;
use crate::audio::capture::CaptureUnit;
use crate::audio::playback::PlaybackUnit;
use crate::error::AudioError;

pub use stream::{CaptureStream, PlaybackStream};

/// Processor types a host can instantiate, by registered name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorKind {
    Capture,
    Playback,
}

impl ProcessorKind {
    pub const ALL: [ProcessorKind; 2] = [ProcessorKind::Capture, ProcessorKind::Playback];

    pub fn name(self) -> &'static str {
        match self {
            ProcessorKind::Capture => CaptureUnit::PROCESSOR_NAME,
            ProcessorKind::Playback => PlaybackUnit::PROCESSOR_NAME,
        }
    }
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProcessorKind {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProcessorKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| AudioError::UnknownProcessor(s.to_string()))
    }
}

/// Count of render calls that panicked
#[derive(Debug, Default)]
pub struct RenderFaults(AtomicU64);

impl RenderFaults {
    pub fn record(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Run a render call, containing any panic
///
/// A panicking call counts as a fault and reports "keep alive".
pub fn guarded<F>(faults: &RenderFaults, render: F) -> bool
where
    F: FnOnce() -> bool,
{
    match panic::catch_unwind(AssertUnwindSafe(render)) {
        Ok(keep_alive) => keep_alive,
        Err(_) => {
            faults.record();
            true
        }
    }
}

/// Run a render call that writes `output`; a panic leaves `output` silent
pub fn render_guarded<F>(output: &mut AudioBlock, faults: &RenderFaults, render: F) -> bool
where
    F: FnOnce(&mut AudioBlock) -> bool,
{
    match panic::catch_unwind(AssertUnwindSafe(|| render(&mut *output))) {
        Ok(keep_alive) => keep_alive,
        Err(_) => {
            faults.record();
            output.fill(0.0);
            true
        }
    }
}

/// Collects interleaved device input into fixed planar quanta
pub struct InputReblocker {
    channels: usize,
    frames: usize,
    current: AudioBlock,
    cursor: usize,
}

impl InputReblocker {
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            channels,
            frames,
            current: AudioBlock::silent(channels, frames),
            cursor: 0,
        }
    }

    /// Frames buffered toward the next quantum
    pub fn pending(&self) -> usize {
        self.cursor
    }

    /// Append interleaved samples, calling `on_quantum` for every full quantum
    pub fn push_interleaved<F>(&mut self, data: &[f32], mut on_quantum: F)
    where
        F: FnMut(AudioBlock),
    {
        if self.channels == 0 || self.frames == 0 {
            return;
        }

        for frame in data.chunks_exact(self.channels) {
            for (channel, &sample) in self.current.channels_mut().iter_mut().zip(frame) {
                channel[self.cursor] = sample;
            }
            self.cursor += 1;

            if self.cursor == self.frames {
                let full = std::mem::replace(
                    &mut self.current,
                    AudioBlock::silent(self.channels, self.frames),
                );
                self.cursor = 0;
                on_quantum(full);
            }
        }
    }
}

/// Serves interleaved device output from fixed planar quanta
///
/// Each quantum is zeroed before `render` runs, so a render call that
/// leaves the block untouched produces silence.
pub struct OutputReblocker {
    current: AudioBlock,
    cursor: usize,
}

impl OutputReblocker {
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            current: AudioBlock::silent(channels, frames),
            // Start exhausted so the first request renders a fresh quantum
            cursor: frames,
        }
    }

    /// Fill `out` (interleaved, `out_channels` wide), rendering quanta as needed
    pub fn fill_interleaved<F>(&mut self, out: &mut [f32], out_channels: usize, mut render: F)
    where
        F: FnMut(&mut AudioBlock),
    {
        let frames = self.current.frames();
        if out_channels == 0 || frames == 0 {
            out.fill(0.0);
            return;
        }

        for slot in out.chunks_exact_mut(out_channels) {
            if self.cursor >= frames {
                self.current.fill(0.0);
                render(&mut self.current);
                self.cursor = 0;
            }
            for (ch, sample) in slot.iter_mut().enumerate() {
                *sample = self
                    .current
                    .channel(ch)
                    .and_then(|c| c.get(self.cursor))
                    .copied()
                    .unwrap_or(0.0);
            }
            self.cursor += 1;
        }
    }
}
