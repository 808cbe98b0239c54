//! Low-level DSP primitives behind the echo voices.
//!
//! Allocation-free and realtime-safe, so they can live inside voice structs
//! that render on the audio thread.

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Phase-accumulator oscillator waveforms.
pub mod oscillator;

pub use envelope::{Envelope, EnvelopeState};
pub use oscillator::{OscillatorBlock, OscillatorWaveform};
