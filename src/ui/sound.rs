/// Sound engine: procedural 8-bit style cues via rodio.
///
/// One buffer per `SoundCue`, generated once at startup. Playback is
/// fire-and-forget through a detached `Sink`.
///
/// Build without the "sound" feature to drop audio entirely; the stub
/// engine then ignores every cue.

use crate::sim::event::SoundCue;

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const SAMPLE_RATE: u32 = 22050;

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;

    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{samples_for, SAMPLE_RATE};
    use crate::sim::event::SoundCue;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        cues: HashMap<SoundCue, Vec<f32>>,
    }

    impl SoundEngine {
        /// None when no output device is available.
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("audio disabled: {e}");
                    return None;
                }
            };
            let cues = [SoundCue::Shot, SoundCue::Explosion, SoundCue::Pickup]
                .into_iter()
                .map(|cue| (cue, samples_for(cue)))
                .collect();
            Some(SoundEngine { _stream: stream, handle, cues })
        }

        pub fn play(&self, cue: SoundCue) {
            let Some(samples) = self.cues.get(&cue) else { return };
            match Sink::try_new(&self.handle) {
                Ok(sink) => {
                    sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples.clone()));
                    sink.detach();
                }
                Err(e) => log::debug!("cue {cue} dropped: {e}"),
            }
        }
    }
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _cue: SoundCue) {}
}

// ════════════════════════════════════════════════════════════
//  Waveform generators: mono f32 samples
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn samples_for(cue: SoundCue) -> Vec<f32> {
    match cue {
        SoundCue::Shot => gen_shot(),
        SoundCue::Explosion => gen_explosion(),
        SoundCue::Pickup => gen_pickup(),
    }
}

fn sample_count(duration: f32) -> usize {
    (SAMPLE_RATE as f32 * duration) as usize
}

fn sine(t: f32, freq: f32) -> f32 {
    (t * freq * std::f32::consts::TAU).sin()
}

/// Shot: fast falling zap, 1400 Hz → 500 Hz.
fn gen_shot() -> Vec<f32> {
    let n = sample_count(0.09);
    (0..n)
        .map(|i| {
            let p = i as f32 / n as f32;
            let t = i as f32 / SAMPLE_RATE as f32;
            let freq = 1400.0 - p * 900.0;
            // odd harmonic gives it a square-ish edge
            let wave = sine(t, freq) * 0.75 + sine(t, freq * 3.0) * 0.25;
            wave * (1.0 - p) * 0.25
        })
        .collect()
}

/// Explosion: noise burst over a low thump.
fn gen_explosion() -> Vec<f32> {
    let n = sample_count(0.35);
    let mut seed: u32 = 0x2545_f491;
    (0..n)
        .map(|i| {
            let p = i as f32 / n as f32;
            let t = i as f32 / SAMPLE_RATE as f32;
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let noise = (seed >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
            let thump = sine(t, 80.0 - p * 40.0);
            (noise * 0.65 + thump * 0.35) * (1.0 - p).powf(1.5) * 0.35
        })
        .collect()
}

/// Pickup: two rising notes, E6 then A6.
fn gen_pickup() -> Vec<f32> {
    let mut samples = Vec::new();
    for freq in [1319.0_f32, 1760.0] {
        let n = sample_count(0.05);
        samples.extend((0..n).map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32).sqrt();
            sine(t, freq) * env * 0.25
        }));
    }
    samples
}
