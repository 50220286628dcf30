//! Sample-level primitives for the software graph backend.
//!
//! These components are allocation-free and realtime-safe. Nothing in the
//! voice engine touches them directly; they exist so the software graph can
//! actually render the chains the engine schedules. The engine itself only
//! speaks [`crate::graph::service::AudioGraph`].

/// Time-domain delay line.
pub mod delay;
/// Resonant lowpass filter (state-variable core).
pub mod filter;
/// Phase-accumulator oscillator with the four classic waveforms.
pub mod oscillator;
