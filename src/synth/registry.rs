/*
Voice Registry
==============

Tracks every sounding voice in trigger order and owns the allocation policy:

  mono  - at most one voice: a new trigger hard-cuts whatever is sounding
          (synchronous disconnect, no release tail), and note-off tears the
          chain down immediately after scheduling the release.
  poly  - voices accumulate without bound; note-off schedules a release on
          ALL of them (there is no per-key tracking) and leaves the chains
          connected so the tails ring out. The reaper reclaims them once
          their stop time has elapsed.

The reaper is what keeps poly mode from leaking: a released voice past its
stop time contributes nothing but still occupies graph nodes until it is
disconnected and deregistered here.
*/

use crate::graph::service::AudioGraph;
use crate::params::SynthParams;
use crate::synth::envelope;
use crate::synth::voice::{Voice, VoiceState};

#[derive(Default)]
pub struct VoiceRegistry {
    voices: Vec<Voice>,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Register a freshly built voice. In mono mode every prior voice is
    /// hard-cut first so the newest trigger always wins.
    pub fn allocate(&mut self, graph: &mut dyn AudioGraph, voice: Voice, poly: bool) {
        if !poly {
            self.hard_cut(graph);
        }
        tracing::debug!(
            note = voice.note_index,
            frequency = voice.frequency,
            poly,
            "voice allocated"
        );
        self.voices.push(voice);
    }

    /// Schedule a release on every voice that does not have one yet. Mono
    /// additionally disconnects the chains immediately and clears the
    /// registry; the scheduled ramps simply never play out.
    pub fn release_all(&mut self, graph: &mut dyn AudioGraph, release_seconds: f32, poly: bool) {
        let now = graph.now();
        for voice in &mut self.voices {
            if voice.release.is_none() {
                let stop = envelope::schedule_release(graph, voice, release_seconds, now);
                tracing::debug!(note = voice.note_index, stop, "voice released");
            }
        }
        if !poly {
            self.hard_cut(graph);
        }
    }

    /// Re-apply the live-updatable parameters to every registered voice:
    /// waveform, cutoff (the FULL value, unlike the halved construction-time
    /// cutoff), and Q. Envelopes are never touched.
    pub fn propagate_live(&mut self, graph: &mut dyn AudioGraph, params: &SynthParams) {
        let now = graph.now();
        for voice in &self.voices {
            for &osc in &voice.oscillators {
                graph.set_waveform(osc, params.waveform);
            }
            graph.set_cutoff(voice.filter, params.filter_cutoff_hz, now);
            graph.set_q(voice.filter, params.filter_q);
        }
    }

    /// Disconnect and deregister every voice whose stop time has elapsed.
    pub fn reap(&mut self, graph: &mut dyn AudioGraph, now: f64) {
        let before = self.voices.len();
        self.voices.retain(|voice| {
            if voice.state_at(now) == VoiceState::Stopped {
                for node in voice.node_ids() {
                    graph.disconnect(node);
                }
                false
            } else {
                true
            }
        });
        let reaped = before - self.voices.len();
        if reaped > 0 {
            tracing::debug!(reaped, remaining = self.voices.len(), "voices reaped");
        }
    }

    /// Disconnect and drop every voice immediately, release tails included.
    /// Mono triggering cuts the previous voice this way before the
    /// replacement chain allocates any nodes.
    pub fn hard_cut(&mut self, graph: &mut dyn AudioGraph) {
        for voice in self.voices.drain(..) {
            for node in voice.node_ids() {
                graph.disconnect(node);
            }
        }
    }
}
