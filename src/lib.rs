pub mod dsp;
pub mod error;
pub mod graph; // Audio-graph service: interface, automation, software backend
pub mod notes; // Fixed note catalog (the keyboard's trigger keys)
pub mod params;
pub mod synth; // Voice lifecycle: builder, envelope scheduling, registry, engine

pub use error::SynthError;
pub use graph::service::{AudioGraph, NodeId};
pub use graph::software::SoftwareGraph;
pub use notes::Note;
pub use params::{Adsr, ParamChange, SynthParams, Waveform};
pub use synth::engine::SynthEngine;
pub use synth::voice::{Voice, VoiceState};

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Longest supported delay-stage time, in seconds; delay lines are sized
/// for it at creation.
pub const MAX_DELAY_SECONDS: f32 = 0.5;
