/*
Envelope Scheduling
===================

Envelopes are not rendered here; they are scheduled as gain automation and
executed by the audio-graph service. Two operations cover the whole
lifecycle:

  attack (at note-on):

    gain
    peak ┤      ╱╲
         │     ╱  ╲___________ sustain = sustain_level * peak
         │    ╱
       0 ┼───●
         └───┴──┴──┴─────────→ time
           start  +attack +decay

  release (at note-off): read the gain's CURRENT value, anchor it with a
  set (cancelling any still-pending attack/decay ramps), then ramp to zero.
  Anchoring at the current value rather than the nominal sustain level is
  what keeps a mid-attack release click-free.

ADSR parameter changes never reshape ramps already in flight; a segment is
scheduled exactly once, at the moment its phase begins.
*/

use crate::graph::service::AudioGraph;
use crate::params::Adsr;
use crate::synth::voice::{Release, Voice};

/// Schedule the onset: silence at `start`, ramp to the peak over the attack,
/// then down to the sustain level over the decay.
pub fn schedule_attack(
    graph: &mut dyn AudioGraph,
    voice: &Voice,
    adsr: &Adsr,
    volume: f32,
    start: f64,
) {
    graph.set_gain_at(voice.gain, 0.0, start);
    graph.ramp_gain_to(voice.gain, volume, start + adsr.attack as f64);
    graph.ramp_gain_to(
        voice.gain,
        adsr.sustain * volume,
        start + (adsr.attack + adsr.decay) as f64,
    );
}

/// Schedule the release at `now` and mark the voice. Returns the time the
/// voice falls silent and its oscillators stop.
pub fn schedule_release(
    graph: &mut dyn AudioGraph,
    voice: &mut Voice,
    release_seconds: f32,
    now: f64,
) -> f64 {
    let current = graph.gain_value(voice.gain);
    graph.set_gain_at(voice.gain, current, now);

    let stop_time = now + release_seconds as f64;
    graph.ramp_gain_to(voice.gain, 0.0, stop_time);
    for &osc in &voice.oscillators {
        graph.stop(osc, stop_time);
    }

    voice.release = Some(Release {
        at: now,
        stop_time,
    });
    stop_time
}
