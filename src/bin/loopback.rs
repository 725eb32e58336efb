//! Loopback host
//!
//! Drives both render units against local devices with an in-process relay
//! standing in for the network: captured quanta are encoded as peer
//! messages, decoded again and delivered to playback. Type `true`/`false`
//! on stdin to toggle capture, `quit` to exit.
//!
//! Usage: `loopback [audioInputProcess] [audioOutputProcess]`

use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsvoip_audio::{
    audio::{device::list_devices, AudioBlock, CaptureUnit, PlaybackHandle, PlaybackUnit},
    config::AppConfig,
    host::{CaptureStream, PlaybackStream, ProcessorKind},
    protocol::{AudioMessage, ControlMessage},
};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting loopback host");

    let config = AppConfig::load_or_default();
    config.validate()?;

    let mut kinds = std::env::args()
        .skip(1)
        .map(|arg| arg.parse::<ProcessorKind>())
        .collect::<Result<Vec<_>, _>>()?;
    if kinds.is_empty() {
        kinds = ProcessorKind::ALL.to_vec();
    }

    println!("\n=== Available Audio Devices ===");
    for device in list_devices() {
        let default_marker = if device.is_default { " [DEFAULT]" } else { "" };
        println!("  {}{}:", device.name, default_marker);
        println!("    ID: {}", device.id);
        println!("    Sample rates: {:?}", device.sample_rates);
        println!("    Channels: {:?}", device.channels);
    }
    println!();

    let (playback_unit, playback_handle) = PlaybackUnit::from_config(&config.playback);
    let playback = if kinds.contains(&ProcessorKind::Playback) {
        Some(PlaybackStream::start(&config.audio, playback_unit)?)
    } else {
        None
    };

    let (capture_unit, outbound) = CaptureUnit::channel(config.capture.outbound_capacity);
    capture_unit.set_active(config.capture.start_active);
    let capture = if kinds.contains(&ProcessorKind::Capture) {
        Some(CaptureStream::start(&config.audio, capture_unit)?)
    } else {
        None
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let relay = {
        let shutdown = shutdown.clone();
        let handle = playback_handle.clone();
        thread::Builder::new()
            .name("relay".into())
            .spawn(move || relay_loop(outbound, handle, shutdown))?
    };

    tracing::info!("Running - type true/false to toggle capture, quit to exit");

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim() == "quit" {
            break;
        }
        match (&capture, ControlMessage::parse(&line)) {
            (Some(capture), Some(enabled)) => {
                capture.control().set_active(enabled);
                tracing::info!("Capture {}", if enabled { "on" } else { "off" });
            }
            (None, Some(_)) => tracing::warn!("Capture is not running"),
            (_, None) => tracing::warn!("Ignoring control input: {:?}", line),
        }
    }

    shutdown.store(true, Ordering::SeqCst);
    drop(capture);
    drop(playback);
    let _ = relay.join();

    let stats = playback_handle.stats();
    tracing::info!(
        "Stopped: {} blocks delivered, {} overflows, {} underruns",
        stats.enqueued,
        stats.overflows,
        stats.underruns
    );
    Ok(())
}

/// Move captured quanta through the wire format into playback
fn relay_loop(outbound: Receiver<AudioBlock>, playback: PlaybackHandle, shutdown: Arc<AtomicBool>) {
    let mut relayed: u64 = 0;
    let mut malformed: u64 = 0;
    let mut last_stats_time = Instant::now();

    while !shutdown.load(Ordering::Relaxed) {
        match outbound.recv_timeout(Duration::from_millis(100)) {
            Ok(block) => {
                let delivered = AudioMessage::encode(&block).and_then(|text| AudioMessage::decode(&text));
                match delivered {
                    Ok(block) => {
                        playback.enqueue(block);
                        relayed += 1;
                    }
                    Err(e) => {
                        tracing::warn!("Dropping undeliverable block: {}", e);
                        malformed += 1;
                    }
                }
                // Spent blocks are dropped here, off the render thread
                while playback.reclaim().is_some() {}
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if last_stats_time.elapsed() >= Duration::from_secs(5) {
            last_stats_time = Instant::now();
            let stats = playback.stats();
            tracing::info!(
                "Relay stats: {} relayed, {} malformed, queue {}/{} ({:.0}%), {} overflows, {} underruns",
                relayed,
                malformed,
                stats.level,
                stats.capacity,
                playback.fill_level() * 100.0,
                stats.overflows,
                stats.underruns
            );
        }
    }
}
