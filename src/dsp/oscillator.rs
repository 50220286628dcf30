use std::f32::consts::TAU;

use crate::params::Waveform;

/*
Phase-Accumulator Oscillator
============================

One `phase` value in [0, 1) walks forward by frequency / sample_rate each
sample; the waveform is a pure function of phase:

  Sine      sin(2π · phase)
  Square    +1 for the first half cycle, -1 for the second
  Sawtooth  2 · phase - 1 (rises, snaps back)
  Triangle  rises 0→1 over the first half, falls back over the second

Detune is expressed in cents before reaching this struct: the caller scales
the frequency by 2^(cents / 1200), so three oscillators at {0, -w, +w} cents
around the same note give the classic unison "width" thickening.
*/

pub struct PhaseOsc {
    phase: f32,
}

impl PhaseOsc {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Advance one sample at the given frequency and return the waveform value.
    pub fn next_sample(&mut self, waveform: Waveform, frequency: f32, sample_rate: f32) -> f32 {
        let value = match waveform {
            Waveform::Sine => (TAU * self.phase).sin(),
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * self.phase - 1.0,
            Waveform::Triangle => {
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
        };

        self.phase += frequency / sample_rate;
        self.phase -= self.phase.floor();

        value
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

impl Default for PhaseOsc {
    fn default() -> Self {
        Self::new()
    }
}

/// Frequency ratio for a detune in cents: 2^(cents / 1200).
pub fn cents_to_ratio(cents: f32) -> f32 {
    2.0_f32.powf(cents / 1200.0)
}
