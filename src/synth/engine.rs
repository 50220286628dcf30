/*
Synth Engine
============

The single control-thread facade over the whole instrument. It owns the
injected audio-graph service, the shared parameter set, and the voice
registry, and exposes the handful of operations a keyboard UI needs:

    note_on(index)        trigger the catalog note
    note_off()            release everything sounding
    set_parameter(change) validate, store, maybe propagate live
    toggle_poly_mode()    future triggers only; sounding voices unaffected
    reap()                reclaim poly voices past their stop time

The graph is a type parameter rather than a trait object so the engine can
sit directly on a `SoftwareGraph` in tests and offline rendering, or on a
`GraphClient` when the rendering runs on a realtime thread.

note_on and note_off run the reaper on entry, so long-dead poly voices are
torn down at the next human interaction even if the host never calls
`reap()` on a timer.
*/

use crate::error::SynthError;
use crate::graph::service::AudioGraph;
use crate::notes::{self, Note};
use crate::params::{ParamChange, SynthParams};
use crate::synth::builder;
use crate::synth::envelope;
use crate::synth::registry::VoiceRegistry;
use crate::synth::voice::Voice;

pub struct SynthEngine<G: AudioGraph> {
    graph: G,
    params: SynthParams,
    registry: VoiceRegistry,
    note_is_on: bool,
}

impl<G: AudioGraph> SynthEngine<G> {
    pub fn new(graph: G) -> Self {
        Self::with_params(graph, SynthParams::default())
    }

    pub fn with_params(graph: G, params: SynthParams) -> Self {
        Self {
            graph,
            params,
            registry: VoiceRegistry::new(),
            note_is_on: false,
        }
    }

    /// Trigger the catalog note at `index`: build the voice chain, schedule
    /// its attack, and register it under the current allocation policy.
    pub fn note_on(&mut self, index: usize) -> Result<(), SynthError> {
        let now = self.graph.now();
        self.registry.reap(&mut self.graph, now);

        let frequency = notes::frequency_of(index)?;

        // Mono cuts the previous voice before any new nodes exist: the two
        // chains never coexist, and a failed build leaves silence rather
        // than the stale note.
        if !self.params.poly_mode {
            self.registry.hard_cut(&mut self.graph);
        }

        let voice = builder::build(&mut self.graph, index, frequency, &self.params)?;
        envelope::schedule_attack(
            &mut self.graph,
            &voice,
            &self.params.adsr,
            self.params.volume,
            voice.start_time,
        );
        self.registry
            .allocate(&mut self.graph, voice, self.params.poly_mode);

        self.note_is_on = true;
        tracing::debug!(index, frequency, "note on");
        Ok(())
    }

    /// Release every sounding voice. There is no per-key tracking: in poly
    /// mode one note-off releases all of them. A no-op when nothing sounds.
    pub fn note_off(&mut self) {
        let now = self.graph.now();
        self.registry.reap(&mut self.graph, now);

        if !self.registry.is_empty() {
            self.registry.release_all(
                &mut self.graph,
                self.params.adsr.release,
                self.params.poly_mode,
            );
            tracing::debug!("note off");
        }
        self.note_is_on = false;
    }

    /// Validate and store a parameter change. Waveform, cutoff, and Q are
    /// additionally pushed to already-sounding voices while a note is held;
    /// everything else takes effect at the next trigger. A rejected change
    /// leaves the stored parameters untouched.
    pub fn set_parameter(&mut self, change: ParamChange) -> Result<(), SynthError> {
        if let Err(err) = change.validate() {
            tracing::debug!(?change, %err, "parameter change rejected");
            return Err(err);
        }
        change.apply(&mut self.params);

        if change.affects_live_voices() && self.note_is_on {
            self.registry.propagate_live(&mut self.graph, &self.params);
        }
        Ok(())
    }

    /// Flip the allocation policy for FUTURE triggers; whatever is sounding
    /// keeps its current lifecycle. Returns the new setting.
    pub fn toggle_poly_mode(&mut self) -> bool {
        self.params.poly_mode = !self.params.poly_mode;
        self.params.poly_mode
    }

    /// Reclaim voices past their scheduled stop time.
    pub fn reap(&mut self) {
        let now = self.graph.now();
        self.registry.reap(&mut self.graph, now);
    }

    pub fn note_catalog(&self) -> &'static [Note] {
        notes::catalog()
    }

    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    pub fn active_voices(&self) -> usize {
        self.registry.len()
    }

    pub fn voices(&self) -> &[Voice] {
        self.registry.voices()
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }
}
