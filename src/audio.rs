//! Audible echo of note events.
//!
//! The session talks to an `Instrument`; the cpal-backed `AudioEngine` is the
//! real one. Messages reach the audio callback over an rtrb ring buffer so
//! the callback never locks, and the rendered signal comes back over a second
//! ring buffer for the oscilloscope.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::graph::tone::ToneNode;
use crate::synth::{message::SynthMessage, poly::PolySynth};
use crate::MAX_BLOCK_SIZE;

/// Capacity of the UI -> audio message queue.
const MESSAGE_QUEUE_SIZE: usize = 256;
/// Capacity of the audio -> UI sample queue (about 0.2s at 48kHz).
const SCOPE_QUEUE_SIZE: usize = 8192;

pub const DEFAULT_VOICES: usize = 8;

/// Anything that can sound a note.
pub trait Instrument {
    fn play_note(&mut self, pitch: u8, velocity: u8);
    fn stop_note(&mut self, pitch: u8);
    fn all_notes_off(&mut self);
}

impl<T: Instrument + ?Sized> Instrument for Box<T> {
    fn play_note(&mut self, pitch: u8, velocity: u8) {
        (**self).play_note(pitch, velocity)
    }

    fn stop_note(&mut self, pitch: u8) {
        (**self).stop_note(pitch)
    }

    fn all_notes_off(&mut self) {
        (**self).all_notes_off()
    }
}

/// Instrument used when audio is disabled or no device is available.
#[derive(Debug, Default)]
pub struct SilentInstrument;

impl Instrument for SilentInstrument {
    fn play_note(&mut self, _pitch: u8, _velocity: u8) {}
    fn stop_note(&mut self, _pitch: u8) {}
    fn all_notes_off(&mut self) {}
}

pub struct AudioEngine {
    _stream: cpal::Stream,
    tx: Producer<SynthMessage>,
    scope: Option<Consumer<f32>>,
    sample_rate: f32,
}

impl AudioEngine {
    /// Open the default output device and start rendering.
    pub fn start(max_voices: usize) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no default output device available".into()))?;
        let config = device.default_output_config()?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let (tx, rx) = RingBuffer::<SynthMessage>::new(MESSAGE_QUEUE_SIZE);
        let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_QUEUE_SIZE);

        let mut synth = PolySynth::new(sample_rate, max_voices, ToneNode::keys, rx);
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames];
                    synth.render_block(block);

                    // Mono to all channels; keep headroom for chords
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        let s = (s * 0.25).clamp(-1.0, 1.0);
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                        // Scope is best-effort; a full queue just drops samples
                        let _ = scope_tx.push(s);
                    }

                    frames_written += frames;
                }
            },
            |err| warn!(error = %err, "audio stream error"),
            None,
        )?;

        stream.play()?;
        info!(sample_rate, channels, voices = max_voices, "audio engine started");

        Ok(Self {
            _stream: stream,
            tx,
            scope: Some(scope_rx),
            sample_rate,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Hand the rendered-sample stream to the UI. Only the first call gets it.
    pub fn take_scope(&mut self) -> Option<Consumer<f32>> {
        self.scope.take()
    }

    fn send(&mut self, msg: SynthMessage) {
        if self.tx.push(msg).is_err() {
            warn!(?msg, "synth queue full, dropping message");
        }
    }
}

impl Instrument for AudioEngine {
    fn play_note(&mut self, pitch: u8, velocity: u8) {
        self.send(SynthMessage::Play { pitch, velocity });
    }

    fn stop_note(&mut self, pitch: u8) {
        self.send(SynthMessage::Stop { pitch });
    }

    fn all_notes_off(&mut self) {
        self.send(SynthMessage::Silence);
    }
}
