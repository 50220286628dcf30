//! Global synthesis parameters and their slider-range validation.
//!
//! `SynthParams` is the single piece of shared mutable state in the engine.
//! It is snapshotted by the voice builder at note-on time; only waveform,
//! filter cutoff, and Q are re-applied live to already-sounding voices.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SynthError;

/// Oscillator waveform shape.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// Attack-Decay-Sustain-Release amplitude envelope shape.
///
/// Times are in seconds; `sustain` is a level fraction of the peak (0..=1).
/// Zero-duration segments are legal and collapse to instantaneous jumps.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

/// Process-wide synthesis parameters, mutated in place by the UI thread.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthParams {
    pub waveform: Waveform,
    pub filter_cutoff_hz: f32,
    pub filter_q: f32,
    /// Detune width in cents for the two flanking oscillators.
    pub width_cents: f32,
    pub delay_seconds: f32,
    pub volume: f32,
    pub adsr: Adsr,
    pub poly_mode: bool,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sawtooth,
            filter_cutoff_hz: 1000.0,
            filter_q: 1.0,
            width_cents: 10.0,
            delay_seconds: 0.0,
            volume: 0.3,
            adsr: Adsr {
                attack: 0.1,
                decay: 0.1,
                sustain: 0.6,
                release: 0.5,
            },
            poly_mode: false,
        }
    }
}

/// One typed slider update, validated before it touches `SynthParams`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamChange {
    Waveform(Waveform),
    Volume(f32),
    FilterCutoffHz(f32),
    FilterQ(f32),
    WidthCents(f32),
    DelaySeconds(f32),
    Attack(f32),
    Decay(f32),
    Sustain(f32),
    Release(f32),
}

impl ParamChange {
    /// Range to enforce: (name, value, min, max). Waveform has no range.
    fn bounds(&self) -> Option<(&'static str, f32, f32, f32)> {
        match *self {
            ParamChange::Waveform(_) => None,
            ParamChange::Volume(v) => Some(("volume", v, 0.0, 1.0)),
            ParamChange::FilterCutoffHz(v) => Some(("filterCutoffHz", v, 100.0, 5000.0)),
            ParamChange::FilterQ(v) => Some(("filterQ", v, 1.0, 30.0)),
            ParamChange::WidthCents(v) => Some(("widthCents", v, 0.0, 50.0)),
            ParamChange::DelaySeconds(v) => Some(("delaySeconds", v, 0.0, 0.5)),
            ParamChange::Attack(v) => Some(("attack", v, 0.0, 1.0)),
            ParamChange::Decay(v) => Some(("decay", v, 0.0, 1.0)),
            ParamChange::Sustain(v) => Some(("sustain", v, 0.0, 1.0)),
            ParamChange::Release(v) => Some(("release", v, 0.0, 10.0)),
        }
    }

    /// Reject values outside the slider's documented range.
    pub fn validate(&self) -> Result<(), SynthError> {
        if let Some((name, value, min, max)) = self.bounds() {
            if !value.is_finite() || value < min || value > max {
                return Err(SynthError::ParameterOutOfRange {
                    name,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Store the new value. Callers must `validate` first.
    pub fn apply(self, params: &mut SynthParams) {
        match self {
            ParamChange::Waveform(w) => params.waveform = w,
            ParamChange::Volume(v) => params.volume = v,
            ParamChange::FilterCutoffHz(v) => params.filter_cutoff_hz = v,
            ParamChange::FilterQ(v) => params.filter_q = v,
            ParamChange::WidthCents(v) => params.width_cents = v,
            ParamChange::DelaySeconds(v) => params.delay_seconds = v,
            ParamChange::Attack(v) => params.adsr.attack = v,
            ParamChange::Decay(v) => params.adsr.decay = v,
            ParamChange::Sustain(v) => params.adsr.sustain = v,
            ParamChange::Release(v) => params.adsr.release = v,
        }
    }

    /// Only waveform, cutoff, and Q propagate to already-sounding voices.
    /// ADSR, width, delay, and volume apply to future triggers only.
    pub fn affects_live_voices(&self) -> bool {
        matches!(
            self,
            ParamChange::Waveform(_) | ParamChange::FilterCutoffHz(_) | ParamChange::FilterQ(_)
        )
    }
}
