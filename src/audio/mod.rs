//! Audio subsystem module

pub mod block;
pub mod buffer;
pub mod capture;
pub mod device;
pub mod playback;

pub use block::AudioBlock;
pub use buffer::{EnqueueOutcome, InboundQueue, OverflowPolicy, QueueStats};
pub use capture::{CaptureControl, CaptureUnit};
pub use device::{get_device_by_id, list_devices, AudioDevice, AudioDeviceInfo};
pub use playback::{FillPolicy, PlaybackHandle, PlaybackUnit};
