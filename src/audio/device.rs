//! Audio device enumeration and lookup
//!
//! Devices are addressed by `input:<name>` / `output:<name>` ids so a
//! config file can pin one side without ambiguity.

use cpal::traits::{DeviceTrait, HostTrait};
use serde::Serialize;

use crate::error::AudioError;

/// Description of an available device
#[derive(Debug, Clone, Serialize)]
pub struct AudioDeviceInfo {
    pub id: String,
    pub name: String,
    pub is_input: bool,
    pub is_output: bool,
    pub is_default: bool,
    pub sample_rates: Vec<u32>,
    pub channels: Vec<u16>,
}

/// Wrapper around cpal device
pub struct AudioDevice {
    inner: cpal::Device,
    pub name: String,
    pub is_input: bool,
    pub is_output: bool,
}

impl AudioDevice {
    pub fn from_cpal(device: cpal::Device, is_input: bool, is_output: bool) -> Self {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        Self {
            inner: device,
            name,
            is_input,
            is_output,
        }
    }

    /// Unwrap into the cpal device
    pub fn into_inner(self) -> cpal::Device {
        self.inner
    }
}

/// List all available audio devices
pub fn list_devices() -> Vec<AudioDeviceInfo> {
    let host = cpal::default_host();
    let mut devices: Vec<AudioDeviceInfo> = Vec::new();

    let default_input_name = host.default_input_device().and_then(|d| d.name().ok());
    let default_output_name = host.default_output_device().and_then(|d| d.name().ok());

    if let Ok(input_devices) = host.input_devices() {
        for device in input_devices {
            if let Ok(name) = device.name() {
                let (sample_rates, channels) = device_capabilities(&device, true);
                devices.push(AudioDeviceInfo {
                    id: format!("input:{}", name),
                    is_default: default_input_name.as_ref() == Some(&name),
                    name,
                    is_input: true,
                    is_output: false,
                    sample_rates,
                    channels,
                });
            }
        }
    }

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let Ok(name) = device.name() {
                let (sample_rates, channels) = device_capabilities(&device, false);
                devices.push(AudioDeviceInfo {
                    id: format!("output:{}", name),
                    is_default: default_output_name.as_ref() == Some(&name),
                    name,
                    is_input: false,
                    is_output: true,
                    sample_rates,
                    channels,
                });
            }
        }
    }

    devices
}

/// Supported sample rates (from a common set) and channel counts
fn device_capabilities(device: &cpal::Device, is_input: bool) -> (Vec<u32>, Vec<u16>) {
    let configs: Vec<cpal::SupportedStreamConfigRange> = if is_input {
        device
            .supported_input_configs()
            .map(|iter| iter.collect())
            .unwrap_or_default()
    } else {
        device
            .supported_output_configs()
            .map(|iter| iter.collect())
            .unwrap_or_default()
    };

    let mut sample_rates = Vec::new();
    let mut channels = Vec::new();
    for config in &configs {
        for rate_val in [44100u32, 48000, 88200, 96000] {
            let rate = cpal::SampleRate(rate_val);
            if rate >= config.min_sample_rate()
                && rate <= config.max_sample_rate()
                && !sample_rates.contains(&rate_val)
            {
                sample_rates.push(rate_val);
            }
        }
        if !channels.contains(&config.channels()) {
            channels.push(config.channels());
        }
    }

    sample_rates.sort_unstable();
    channels.sort_unstable();
    (sample_rates, channels)
}

/// Split a device id into its direction and device name
///
/// Ids without a prefix are taken as input devices.
pub fn parse_device_id(id: &str) -> (bool, &str) {
    if let Some(name) = id.strip_prefix("input:") {
        (true, name)
    } else if let Some(name) = id.strip_prefix("output:") {
        (false, name)
    } else {
        (true, id)
    }
}

/// Get a device by its ID
pub fn get_device_by_id(id: &str) -> Result<AudioDevice, AudioError> {
    let host = cpal::default_host();
    let (is_input, name) = parse_device_id(id);

    let devices = if is_input {
        host.input_devices()
    } else {
        host.output_devices()
    }
    .map_err(|e| AudioError::DeviceNotFound(e.to_string()))?;

    for device in devices {
        if device.name().map(|n| n == name).unwrap_or(false) {
            return Ok(AudioDevice::from_cpal(device, is_input, !is_input));
        }
    }

    Err(AudioError::DeviceNotFound(id.to_string()))
}

pub fn get_default_input_device() -> Result<AudioDevice, AudioError> {
    cpal::default_host()
        .default_input_device()
        .map(|d| AudioDevice::from_cpal(d, true, false))
        .ok_or_else(|| AudioError::DeviceNotFound("No default input device".to_string()))
}

pub fn get_default_output_device() -> Result<AudioDevice, AudioError> {
    cpal::default_host()
        .default_output_device()
        .map(|d| AudioDevice::from_cpal(d, false, true))
        .ok_or_else(|| AudioError::DeviceNotFound("No default output device".to_string()))
}

/// Resolve a configured input device, falling back to the default
pub fn resolve_input(id: Option<&str>) -> Result<AudioDevice, AudioError> {
    match id {
        Some(id) => get_device_by_id(id),
        None => get_default_input_device(),
    }
}

/// Resolve a configured output device, falling back to the default
pub fn resolve_output(id: Option<&str>) -> Result<AudioDevice, AudioError> {
    match id {
        Some(id) => get_device_by_id(id),
        None => get_default_output_device(),
    }
}
