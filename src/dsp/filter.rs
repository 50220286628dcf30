use std::f32::consts::PI;

/*
Resonant Lowpass (State-Variable Core)
======================================

Two integrators in a loop (the classic Chamberlin/Zavalishin topology):

  ic1eq, ic2eq   the integrators' memories
  g              tan(pi * cutoff / sample_rate), the warped cutoff gain
  k              1 / Q, the damping

Q maps directly onto the UI's resonance slider (1..=30): Q = 1 is gently
rounded, Q = 30 rings hard at the cutoff. The voice chain only ever needs
the lowpass output, so that is all this struct returns.
*/

pub struct LowpassFilter {
    ic1eq: f32,
    ic2eq: f32,
}

impl LowpassFilter {
    pub fn new() -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
        }
    }

    /// Filter one sample. Cutoff and Q may change every sample; the
    /// coefficients are recomputed on the fly.
    pub fn next_sample(&mut self, sample: f32, cutoff_hz: f32, q: f32, sample_rate: f32) -> f32 {
        let cutoff = cutoff_hz.clamp(10.0, sample_rate * 0.49);
        let g = (PI * cutoff / sample_rate).tan();
        let k = 1.0 / q.max(0.5);

        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        v2 // lowpass tap
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}

impl Default for LowpassFilter {
    fn default() -> Self {
        Self::new()
    }
}
