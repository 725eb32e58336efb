//! cpal-driven render threads
//!
//! Each stream owns a dedicated thread that builds the cpal stream, keeps
//! it alive while running, and drops it on stop. The device callback is the
//! render clock: every completed quantum goes through the unit exactly once.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::StreamConfig;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::audio::capture::{CaptureControl, CaptureUnit};
use crate::audio::device::{resolve_input, resolve_output};
use crate::audio::playback::PlaybackUnit;
use crate::config::AudioConfig;
use crate::error::AudioError;
use crate::host::{guarded, render_guarded, InputReblocker, OutputReblocker, ProcessorKind, RenderFaults};

fn stream_config(config: &AudioConfig) -> StreamConfig {
    StreamConfig {
        channels: config.channels,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    }
}

/// Spawn the thread that owns a cpal stream
///
/// Returns once the stream is playing, or with the error that prevented it.
fn spawn_stream_thread<B>(
    kind: ProcessorKind,
    running: Arc<AtomicBool>,
    build: B,
) -> Result<JoinHandle<()>, AudioError>
where
    B: FnOnce() -> Result<cpal::Stream, AudioError> + Send + 'static,
{
    let (ready_tx, ready_rx) = bounded::<Result<(), AudioError>>(1);

    let handle = thread::Builder::new()
        .name(kind.to_string())
        .spawn(move || {
            let stream = match build().and_then(|stream| {
                stream.play()?;
                Ok(stream)
            }) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(()));

            while running.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(10));
            }

            // Stream is dropped here, stopping the device
            drop(stream);
        })
        .map_err(|e| AudioError::StreamError(e.to_string()))?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(e)) => {
            let _ = handle.join();
            Err(e)
        }
        Err(_) => {
            let _ = handle.join();
            Err(AudioError::StreamError(format!("{} thread exited early", kind)))
        }
    }
}

fn error_callback(tx: Sender<AudioError>) -> impl FnMut(cpal::StreamError) + Send + 'static {
    move |err| {
        let _ = tx.try_send(AudioError::StreamError(err.to_string()));
    }
}

/// Microphone stream feeding a [`CaptureUnit`]
pub struct CaptureStream {
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
    error_rx: Receiver<AudioError>,
    faults: Arc<RenderFaults>,
    control: CaptureControl,
    config: StreamConfig,
}

impl CaptureStream {
    pub fn start(config: &AudioConfig, unit: CaptureUnit) -> Result<Self, AudioError> {
        let device = resolve_input(config.input_device.as_deref())?;
        tracing::info!("Using input device: {}", device.name);

        let stream_config = stream_config(config);
        let running = Arc::new(AtomicBool::new(true));
        let faults = Arc::new(RenderFaults::default());
        let (error_tx, error_rx) = bounded::<AudioError>(16);
        let control = unit.control();

        let callback_faults = faults.clone();
        let callback_config = stream_config.clone();
        let mut reblocker =
            InputReblocker::new(stream_config.channels as usize, config.quantum_frames);
        let mut unit = unit;

        let handle = spawn_stream_thread(ProcessorKind::Capture, running.clone(), move || {
            Ok(device.into_inner().build_input_stream(
                &callback_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    reblocker.push_interleaved(data, |block| {
                        guarded(&callback_faults, || unit.render_quantum(block));
                    });
                },
                error_callback(error_tx),
                None,
            )?)
        })?;

        tracing::info!(
            "{} started: {}Hz, {} channels, {} frames/quantum",
            ProcessorKind::Capture,
            config.sample_rate,
            config.channels,
            config.quantum_frames
        );

        Ok(Self {
            running,
            thread_handle: Some(handle),
            error_rx,
            faults,
            control,
            config: stream_config,
        })
    }

    /// Stop the device stream and join its thread
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Control handle of the unit this stream drives
    pub fn control(&self) -> &CaptureControl {
        &self.control
    }

    /// Render calls that panicked
    pub fn faults(&self) -> u64 {
        self.faults.count()
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Check for device errors
    pub fn check_errors(&self) -> Option<AudioError> {
        self.error_rx.try_recv().ok()
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Speaker stream drained from a [`PlaybackUnit`]
pub struct PlaybackStream {
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
    error_rx: Receiver<AudioError>,
    faults: Arc<RenderFaults>,
    config: StreamConfig,
}

impl PlaybackStream {
    pub fn start(config: &AudioConfig, unit: PlaybackUnit) -> Result<Self, AudioError> {
        let device = resolve_output(config.output_device.as_deref())?;
        tracing::info!("Using output device: {}", device.name);

        let stream_config = stream_config(config);
        let running = Arc::new(AtomicBool::new(true));
        let faults = Arc::new(RenderFaults::default());
        let (error_tx, error_rx) = bounded::<AudioError>(16);

        let callback_faults = faults.clone();
        let callback_config = stream_config.clone();
        let channels = stream_config.channels as usize;
        let mut reblocker = OutputReblocker::new(channels, config.quantum_frames);
        let mut unit = unit;

        let handle = spawn_stream_thread(ProcessorKind::Playback, running.clone(), move || {
            Ok(device.into_inner().build_output_stream(
                &callback_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    reblocker.fill_interleaved(data, channels, |block| {
                        render_guarded(block, &callback_faults, |out| unit.render_quantum(out));
                    });
                },
                error_callback(error_tx),
                None,
            )?)
        })?;

        tracing::info!(
            "{} started: {}Hz, {} channels, {} frames/quantum",
            ProcessorKind::Playback,
            config.sample_rate,
            config.channels,
            config.quantum_frames
        );

        Ok(Self {
            running,
            thread_handle: Some(handle),
            error_rx,
            faults,
            config: stream_config,
        })
    }

    /// Stop the device stream and join its thread
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Render calls that panicked
    pub fn faults(&self) -> u64 {
        self.faults.count()
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Check for device errors
    pub fn check_errors(&self) -> Option<AudioError> {
        self.error_rx.try_recv().ok()
    }
}

impl Drop for PlaybackStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::device::list_devices;

    #[test]
    fn test_stream_config_from_audio_config() {
        let config = AudioConfig {
            sample_rate: 44100,
            channels: 1,
            ..Default::default()
        };
        let stream = stream_config(&config);
        assert_eq!(stream.sample_rate.0, 44100);
        assert_eq!(stream.channels, 1);
    }

    #[test]
    fn test_capture_stream_start_stop() {
        // Only meaningful with an input device present
        if !list_devices().iter().any(|d| d.is_input && d.is_default) {
            return;
        }

        let (unit, _rx) = CaptureUnit::channel(8);
        if let Ok(mut stream) = CaptureStream::start(&AudioConfig::default(), unit) {
            assert!(stream.is_running());
            stream.stop();
            assert!(!stream.is_running());
        }
    }
}
