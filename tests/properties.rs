//! Behavioral properties of the capture and playback units

use proptest::prelude::*;
use std::thread;

use wsvoip_audio::audio::{AudioBlock, CaptureUnit, FillPolicy, OverflowPolicy, PlaybackUnit};

#[derive(Debug, Clone)]
enum CaptureOp {
    SetActive(bool),
    Render,
}

fn capture_op() -> impl Strategy<Value = CaptureOp> {
    prop_oneof![
        any::<bool>().prop_map(CaptureOp::SetActive),
        Just(CaptureOp::Render),
    ]
}

fn tagged(tag: usize) -> AudioBlock {
    AudioBlock::from_channels(vec![vec![tag as f32; 8]])
}

fn tag_of(block: &AudioBlock) -> usize {
    block.channel(0).unwrap()[0] as usize
}

fn block_strategy() -> impl Strategy<Value = AudioBlock> {
    (0usize..4, 0usize..16).prop_flat_map(|(channels, frames)| {
        prop::collection::vec(prop::collection::vec(-1.0f32..1.0, frames), channels)
            .prop_map(AudioBlock::from_channels)
    })
}

proptest! {
    #[test]
    fn capture_emits_iff_last_flag_was_true(ops in prop::collection::vec(capture_op(), 0..64)) {
        let (mut unit, rx) = CaptureUnit::channel(64);
        let mut active = false;
        let mut expected = Vec::new();

        for (quantum, op) in ops.iter().enumerate() {
            match op {
                CaptureOp::SetActive(enabled) => {
                    unit.set_active(*enabled);
                    active = *enabled;
                }
                CaptureOp::Render => {
                    prop_assert!(unit.render_quantum(tagged(quantum)));
                    if active {
                        expected.push(quantum);
                    }
                }
            }
        }

        let emitted: Vec<usize> = rx.try_iter().map(|b| tag_of(&b)).collect();
        prop_assert_eq!(emitted, expected);
    }

    #[test]
    fn playback_drains_burst_in_order(count in 1usize..32) {
        let (mut unit, handle) = PlaybackUnit::new(32, OverflowPolicy::DropOldest, FillPolicy::Silence);
        for tag in 0..count {
            handle.enqueue(tagged(tag));
        }

        let mut output = AudioBlock::silent(1, 8);
        let mut played = Vec::new();
        for _ in 0..count {
            prop_assert!(unit.render_quantum(&mut output));
            played.push(tag_of(&output));
        }

        prop_assert_eq!(played, (0..count).collect::<Vec<_>>());
        prop_assert_eq!(unit.queued(), 0);
    }

    #[test]
    fn playback_truncates_and_retains(source in block_strategy(), output in block_strategy()) {
        let (mut unit, handle) = PlaybackUnit::new(4, OverflowPolicy::DropOldest, FillPolicy::Retain);
        handle.enqueue(source.clone());

        let before = output.clone();
        let mut output = output;
        prop_assert!(unit.render_quantum(&mut output));

        let covered = source.channel_count().min(output.channel_count());
        for ch in 0..output.channel_count() {
            let out = output.channel(ch).unwrap();
            let prev = before.channel(ch).unwrap();
            if ch < covered {
                let src = source.channel(ch).unwrap();
                let len = src.len().min(out.len());
                prop_assert_eq!(&out[..len], &src[..len]);
                prop_assert_eq!(&out[len..], &prev[len..]);
            } else {
                prop_assert_eq!(out, prev);
            }
        }
    }

    #[test]
    fn playback_truncates_and_silences(source in block_strategy(), output in block_strategy()) {
        let (mut unit, handle) = PlaybackUnit::new(4, OverflowPolicy::DropOldest, FillPolicy::Silence);
        handle.enqueue(source.clone());

        let mut output = output;
        prop_assert!(unit.render_quantum(&mut output));

        let covered = source.channel_count().min(output.channel_count());
        for ch in 0..output.channel_count() {
            let out = output.channel(ch).unwrap();
            let len = if ch < covered {
                let src = source.channel(ch).unwrap();
                let len = src.len().min(out.len());
                prop_assert_eq!(&out[..len], &src[..len]);
                len
            } else {
                0
            };
            prop_assert!(out[len..].iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn empty_queue_never_touches_output(output in block_strategy()) {
        let (mut unit, _handle) = PlaybackUnit::new(4, OverflowPolicy::DropOldest, FillPolicy::Silence);
        let before = output.clone();
        let mut output = output;

        prop_assert!(unit.render_quantum(&mut output));
        prop_assert_eq!(output, before);
    }
}

#[test]
fn capture_scenario_quanta_three_and_four() {
    let (mut unit, rx) = CaptureUnit::channel(8);
    let control = unit.control();

    for quantum in 1..=6 {
        match quantum {
            3 => control.set_active(true),
            5 => control.set_active(false),
            _ => {}
        }
        unit.render_quantum(tagged(quantum));
    }

    let emitted: Vec<usize> = rx.try_iter().map(|b| tag_of(&b)).collect();
    assert_eq!(emitted, vec![3, 4]);
}

#[test]
fn playback_scenario_mono_into_stereo() {
    let (mut unit, handle) = PlaybackUnit::new(4, OverflowPolicy::DropOldest, FillPolicy::Silence);
    let source: Vec<f32> = (0..128).map(|i| (i as f32 * 0.05).sin()).collect();
    handle.enqueue(AudioBlock::from_channels(vec![source.clone()]));

    let mut output = AudioBlock::from_channels(vec![vec![0.4; 128], vec![0.4; 128]]);
    assert!(unit.render_quantum(&mut output));

    assert_eq!(output.channel(0).unwrap(), source.as_slice());
    assert_eq!(output.channel(1).unwrap(), &[0.0; 128]);
}

#[test]
fn concurrent_delivery_preserves_order() {
    const BLOCKS: usize = 2000;
    let (mut unit, handle) = PlaybackUnit::new(BLOCKS, OverflowPolicy::DropNewest, FillPolicy::Silence);

    let producer = thread::spawn(move || {
        for tag in 1..=BLOCKS {
            handle.enqueue(tagged(tag));
        }
    });

    let mut played = Vec::with_capacity(BLOCKS);
    let mut output = AudioBlock::silent(1, 8);
    while played.len() < BLOCKS {
        output.fill(0.0);
        unit.render_quantum(&mut output);
        let tag = tag_of(&output);
        if tag != 0 {
            played.push(tag);
        } else {
            thread::yield_now();
        }
    }
    producer.join().unwrap();

    assert_eq!(played, (1..=BLOCKS).collect::<Vec<_>>());
}
