//! Planar audio block exchanged once per render quantum
//!
//! An [`AudioBlock`] is an ordered set of channels, each a dense run of
//! `f32` samples. Samples are addressed by index only.

use serde::{Deserialize, Serialize};

/// What happens to output samples that no source sample reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Zero uncovered channels and the uncovered tail of covered channels
    #[default]
    Silence,
    /// Leave uncovered samples as they were
    Retain,
}

/// One quantum of planar audio
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioBlock {
    channels: Vec<Vec<f32>>,
}

impl AudioBlock {
    /// Create a block of `channels` channels holding `frames` zero samples each
    pub fn silent(channels: usize, frames: usize) -> Self {
        Self {
            channels: vec![vec![0.0; frames]; channels],
        }
    }

    /// Wrap already planar channel data
    pub fn from_channels(channels: Vec<Vec<f32>>) -> Self {
        Self { channels }
    }

    /// Split interleaved samples into planar channels
    ///
    /// A trailing partial frame is discarded.
    pub fn from_interleaved(samples: &[f32], channels: usize) -> Self {
        if channels == 0 {
            return Self::default();
        }
        let frames = samples.len() / channels;
        let mut block = Self::silent(channels, frames);
        for (frame, chunk) in samples.chunks_exact(channels).enumerate() {
            for (ch, &sample) in chunk.iter().enumerate() {
                block.channels[ch][frame] = sample;
            }
        }
        block
    }

    /// Get number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel, taken from the first channel
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Check if the block has no channels
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Get a channel's samples
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Get a channel's samples for writing
    pub fn channel_mut(&mut self, index: usize) -> Option<&mut [f32]> {
        self.channels.get_mut(index).map(Vec::as_mut_slice)
    }

    /// Get all channels
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Get all channels for writing
    pub fn channels_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.channels
    }

    /// Unwrap into planar channel data
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Set every sample to `value`
    pub fn fill(&mut self, value: f32) {
        for channel in &mut self.channels {
            channel.fill(value);
        }
    }

    /// Check if every sample is zero
    pub fn is_silent(&self) -> bool {
        self.channels.iter().flatten().all(|&s| s == 0.0)
    }

    /// Copy this block into `dst`, truncating to the smaller extent
    ///
    /// Channel `i` of `dst` receives the first `min(src_len, dst_len)`
    /// samples of channel `i` of `self`, for `i < min(src_channels,
    /// dst_channels)`. Everything else in `dst` is handled by `fill`.
    /// Returns the number of channels written.
    pub fn copy_into(&self, dst: &mut AudioBlock, fill: FillPolicy) -> usize {
        let covered = self.channel_count().min(dst.channel_count());

        for (src, out) in self.channels.iter().zip(dst.channels.iter_mut()) {
            let len = src.len().min(out.len());
            out[..len].copy_from_slice(&src[..len]);
            if fill == FillPolicy::Silence {
                out[len..].fill(0.0);
            }
        }

        if fill == FillPolicy::Silence {
            for out in &mut dst.channels[covered..] {
                out.fill(0.0);
            }
        }

        covered
    }

    /// Write into an interleaved buffer of `out_channels` channels
    ///
    /// Output channels without a source channel are zeroed. Returns the
    /// number of frames written.
    pub fn write_interleaved(&self, out: &mut [f32], out_channels: usize) -> usize {
        if out_channels == 0 {
            return 0;
        }
        let frames = (out.len() / out_channels).min(self.frames());
        for (frame, chunk) in out.chunks_exact_mut(out_channels).take(frames).enumerate() {
            for (ch, slot) in chunk.iter_mut().enumerate() {
                *slot = self
                    .channels
                    .get(ch)
                    .and_then(|c| c.get(frame))
                    .copied()
                    .unwrap_or(0.0);
            }
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_interleaved() {
        let block = AudioBlock::from_interleaved(&[0.1, 0.2, 0.3, 0.4, 0.5], 2);
        assert_eq!(block.channel_count(), 2);
        assert_eq!(block.frames(), 2);
        assert_eq!(block.channel(0).unwrap(), &[0.1, 0.3]);
        assert_eq!(block.channel(1).unwrap(), &[0.2, 0.4]);

        assert!(AudioBlock::from_interleaved(&[1.0], 0).is_empty());
    }

    #[test]
    fn test_copy_into_silence_fill() {
        let src = AudioBlock::from_channels(vec![vec![0.5; 4]]);
        let mut dst = AudioBlock::from_channels(vec![vec![9.0; 6], vec![9.0; 6]]);

        let covered = src.copy_into(&mut dst, FillPolicy::Silence);

        assert_eq!(covered, 1);
        assert_eq!(dst.channel(0).unwrap(), &[0.5, 0.5, 0.5, 0.5, 0.0, 0.0]);
        assert_eq!(dst.channel(1).unwrap(), &[0.0; 6]);
    }

    #[test]
    fn test_copy_into_retain() {
        let src = AudioBlock::from_channels(vec![vec![0.5; 4]]);
        let mut dst = AudioBlock::from_channels(vec![vec![9.0; 6], vec![9.0; 6]]);

        src.copy_into(&mut dst, FillPolicy::Retain);

        assert_eq!(dst.channel(0).unwrap(), &[0.5, 0.5, 0.5, 0.5, 9.0, 9.0]);
        assert_eq!(dst.channel(1).unwrap(), &[9.0; 6]);
    }

    #[test]
    fn test_copy_into_longer_source() {
        let src = AudioBlock::from_channels(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let mut dst = AudioBlock::silent(1, 2);

        src.copy_into(&mut dst, FillPolicy::Silence);

        assert_eq!(dst.channel(0).unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_write_interleaved() {
        let block = AudioBlock::from_channels(vec![vec![1.0, 2.0]]);
        let mut out = [7.0f32; 6];

        let frames = block.write_interleaved(&mut out, 2);

        assert_eq!(frames, 2);
        assert_eq!(&out[..4], &[1.0, 0.0, 2.0, 0.0]);
        assert_eq!(&out[4..], &[7.0, 7.0]);
    }
}
