//! Peer message format
//!
//! Audio travels between peers as a JSON envelope:
//!
//! ```json
//! {"about": "audio data", "data": [[0.01, -0.02, ...], [0.0, 0.03, ...]]}
//! ```
//!
//! Browser peers send the worklet's input list instead: one entry per
//! input, each a list of channels serialized as objects keyed by sample
//! index:
//!
//! ```json
//! {"about": "audio data", "data": [[{"0": 0.01, "1": -0.02}, {"0": 0.0, "1": 0.03}]]}
//! ```
//!
//! Both shapes decode to one block. Inputs are flattened into channels in
//! order and keyed channels become dense vectors. Encode always writes the
//! flat form with arrays.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::audio::block::AudioBlock;
use crate::error::ProtocolError;

/// `about` tag of audio messages
pub const AUDIO_DATA: &str = "audio data";

/// Largest sample index accepted from a keyed channel
pub const MAX_CHANNEL_SAMPLES: usize = 16384;

#[derive(Serialize)]
struct OutgoingEnvelope<'a> {
    about: &'static str,
    data: &'a AudioBlock,
}

#[derive(Deserialize)]
struct IncomingEnvelope {
    about: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireChannel {
    Dense(Vec<f32>),
    Keyed(BTreeMap<String, f32>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireBlock {
    Channels(Vec<WireChannel>),
    Inputs(Vec<Vec<WireChannel>>),
}

impl WireBlock {
    fn into_channels(self) -> Vec<WireChannel> {
        match self {
            WireBlock::Channels(channels) => channels,
            WireBlock::Inputs(inputs) => inputs.into_iter().flatten().collect(),
        }
    }
}

impl WireChannel {
    fn into_samples(self) -> Result<Vec<f32>, ProtocolError> {
        match self {
            WireChannel::Dense(samples) => Ok(samples),
            WireChannel::Keyed(map) => {
                let mut indexed = Vec::with_capacity(map.len());
                for (key, value) in map {
                    let index: usize = key
                        .parse()
                        .map_err(|_| ProtocolError::InvalidSampleIndex(key.clone()))?;
                    if index >= MAX_CHANNEL_SAMPLES {
                        return Err(ProtocolError::InvalidSampleIndex(key));
                    }
                    indexed.push((index, value));
                }

                let len = indexed.iter().map(|(i, _)| i + 1).max().unwrap_or(0);
                let mut samples = vec![0.0; len];
                for (index, value) in indexed {
                    samples[index] = value;
                }
                Ok(samples)
            }
        }
    }
}

/// Audio message codec
pub struct AudioMessage;

impl AudioMessage {
    pub fn encode(block: &AudioBlock) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(&OutgoingEnvelope {
            about: AUDIO_DATA,
            data: block,
        })?)
    }

    pub fn decode(text: &str) -> Result<AudioBlock, ProtocolError> {
        let envelope: IncomingEnvelope = serde_json::from_str(text)?;
        if envelope.about != AUDIO_DATA {
            return Err(ProtocolError::UnsupportedMessage(envelope.about));
        }

        let block: WireBlock = serde_json::from_value(envelope.data)?;
        let channels = block
            .into_channels()
            .into_iter()
            .map(WireChannel::into_samples)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AudioBlock::from_channels(channels))
    }
}

/// Capture on/off control message
pub struct ControlMessage;

impl ControlMessage {
    /// Parse a control payload; only `true` and `false` are meaningful
    pub fn parse(text: &str) -> Option<bool> {
        serde_json::from_str::<serde_json::Value>(text.trim())
            .ok()
            .and_then(|v| v.as_bool())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_shape() {
        let block = AudioBlock::from_channels(vec![vec![0.5, -0.25]]);
        let text = AudioMessage::encode(&block).unwrap();
        assert_eq!(text, r#"{"about":"audio data","data":[[0.5,-0.25]]}"#);
        assert_eq!(AudioMessage::decode(&text).unwrap(), block);
    }

    #[test]
    fn test_decode_keyed_channels() {
        let text = r#"{"about":"audio data","data":[{"0":0.1,"2":0.3,"1":0.2},[0.4]]}"#;
        let block = AudioMessage::decode(text).unwrap();

        assert_eq!(block.channel_count(), 2);
        assert_eq!(block.channel(0).unwrap(), &[0.1, 0.2, 0.3]);
        assert_eq!(block.channel(1).unwrap(), &[0.4]);
    }

    #[test]
    fn test_decode_browser_input_list() {
        let text = r#"{"about":"audio data","data":[[{"0":0.1,"1":0.2},{"0":-0.1,"1":-0.2}]]}"#;
        let block = AudioMessage::decode(text).unwrap();

        assert_eq!(block.channel_count(), 2);
        assert_eq!(block.channel(0).unwrap(), &[0.1, 0.2]);
        assert_eq!(block.channel(1).unwrap(), &[-0.1, -0.2]);
    }

    #[test]
    fn test_decode_input_list_flattens_in_order() {
        let text = r#"{"about":"audio data","data":[[{"0":1.0}],[{"0":2.0},[3.0]]]}"#;
        let block = AudioMessage::decode(text).unwrap();

        assert_eq!(block.channel_count(), 3);
        assert_eq!(block.channel(0).unwrap(), &[1.0]);
        assert_eq!(block.channel(1).unwrap(), &[2.0]);
        assert_eq!(block.channel(2).unwrap(), &[3.0]);
    }

    #[test]
    fn test_decode_sparse_keys_zero_fill() {
        let text = r#"{"about":"audio data","data":[{"3":1.0}]}"#;
        let block = AudioMessage::decode(text).unwrap();
        assert_eq!(block.channel(0).unwrap(), &[0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_decode_rejects_bad_keys() {
        let text = r#"{"about":"audio data","data":[{"x":1.0}]}"#;
        assert!(matches!(
            AudioMessage::decode(text),
            Err(ProtocolError::InvalidSampleIndex(_))
        ));

        let text = r#"{"about":"audio data","data":[{"99999999":1.0}]}"#;
        assert!(matches!(
            AudioMessage::decode(text),
            Err(ProtocolError::InvalidSampleIndex(_))
        ));
    }

    #[test]
    fn test_decode_unsupported_and_malformed() {
        assert!(matches!(
            AudioMessage::decode(r#"{"about":"chat","data":"hi"}"#),
            Err(ProtocolError::UnsupportedMessage(about)) if about == "chat"
        ));
        assert!(matches!(
            AudioMessage::decode("not json"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            AudioMessage::decode(r#"{"about":"audio data","data":[["a"]]}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_control_message() {
        assert_eq!(ControlMessage::parse("true"), Some(true));
        assert_eq!(ControlMessage::parse(" false\n"), Some(false));
        assert_eq!(ControlMessage::parse("1"), None);
        assert_eq!(ControlMessage::parse("on"), None);
    }
}
