//! Armonico Synth - additive synthesis engine for the armonico project
//!
//! This crate renders sound by summing hundreds of sine overtones whose
//! amplitudes and frequencies follow per-sample parameter curves, on top
//! of the four-wide vector math in `armonico-core`.
//!
//! # Core Components
//!
//! ## Engine
//!
//! - [`SynthesisEngine`] - round-robin polyphonic engine producing
//!   interleaved stereo
//! - [`Note`] - note events ([`Note::Midi`], [`Note::Off`], and the
//!   strict no-op [`Note::None`])
//!
//! ```rust
//! use armonico_synth::{Note, SynthesisEngine};
//!
//! let mut engine = SynthesisEngine::new(48_000.0);
//! engine.set_note(Note::Midi(69)); // A4
//!
//! let mut buffer = vec![0.0f32; 2 * 1024]; // interleaved stereo
//! engine.process(&mut buffer);
//! ```
//!
//! ## Parameters
//!
//! - [`SynthParams`] - the full typed parameter set, with string-id
//!   access via [`SynthParams::set_by_id`] for hosts and presets
//! - [`SrateParam`] - the parameters that automate at audio rate; each
//!   one is a row of a voice's per-sample curve matrix
//! - [`PARAM_DESCRIPTORS`] - id, range, and default of every global
//!   parameter
//!
//! ## Modulation
//!
//! Each voice carries [`MOD_CHANNELS`] envelope+LFO pairs:
//!
//! - [`Adsr`] - timestamp-based envelope with an anti-click fade on
//!   retrigger
//! - [`Lfo`] - five-waveform LFO with output smoothing and
//!   cross-channel modulation
//! - [`ModVoiceParams`] - routing of one channel onto a parameter curve
//!
//! A channel's combined envelope×LFO curve multiplies the row selected
//! by its target; channels can also master each other's LFO controls
//! through [`LfoParams::master_voice`].

pub mod engine;
pub mod envelope;
pub mod lfo;
pub mod note;
pub mod params;
pub mod voice;

// Re-export main types at crate root
pub use engine::SynthesisEngine;
pub use envelope::Adsr;
pub use lfo::Lfo;
pub use note::Note;
pub use params::{
    AdsrParams, LfoModTarget, LfoParams, MAX_OVERTONES, MAX_VIRTUAL_VOICES, MOD_CHANNELS,
    ModVoiceParams, PARAM_DESCRIPTORS, ParamDescriptor, SrateParam, SynthParams, descriptor,
};
pub use voice::VirtualVoice;

// Re-export commonly used helpers from armonico-core
pub use armonico_core::{freq_to_midi, midi_to_freq};
