//! End-to-end engine tests against the software graph backend, driven in
//! virtual time.

use trivox::{
    AudioGraph, NodeId, ParamChange, SoftwareGraph, SynthEngine, SynthError, VoiceState, Waveform,
};

const SAMPLE_RATE: f32 = 48_000.0;

fn engine() -> SynthEngine<SoftwareGraph> {
    SynthEngine::new(SoftwareGraph::new(SAMPLE_RATE))
}

/// Wraps `SoftwareGraph` and counts control calls, so tests can tell HOW
/// OFTEN the engine touched a node, not just what value it ended up at.
/// Also tracks a live-node high-water mark to catch chains coexisting.
struct CountingGraph {
    inner: SoftwareGraph,
    set_waveform_calls: usize,
    set_cutoff_calls: usize,
    set_q_calls: usize,
    live_nodes: usize,
    max_live_nodes: usize,
}

impl CountingGraph {
    fn new(sample_rate: f32) -> Self {
        Self {
            inner: SoftwareGraph::new(sample_rate),
            set_waveform_calls: 0,
            set_cutoff_calls: 0,
            set_q_calls: 0,
            live_nodes: 1, // the output sink
            max_live_nodes: 1,
        }
    }

    fn reset_counters(&mut self) {
        self.set_waveform_calls = 0;
        self.set_cutoff_calls = 0;
        self.set_q_calls = 0;
    }

    fn track(&mut self, node: Result<NodeId, SynthError>) -> Result<NodeId, SynthError> {
        if node.is_ok() {
            self.live_nodes += 1;
            self.max_live_nodes = self.max_live_nodes.max(self.live_nodes);
        }
        node
    }
}

impl AudioGraph for CountingGraph {
    fn create_oscillator(&mut self) -> Result<NodeId, SynthError> {
        let node = self.inner.create_oscillator();
        self.track(node)
    }

    fn set_waveform(&mut self, osc: NodeId, waveform: Waveform) {
        self.set_waveform_calls += 1;
        self.inner.set_waveform(osc, waveform);
    }

    fn set_frequency(&mut self, osc: NodeId, hz: f32, at: f64) {
        self.inner.set_frequency(osc, hz, at);
    }

    fn set_detune(&mut self, osc: NodeId, cents: f32, at: f64) {
        self.inner.set_detune(osc, cents, at);
    }

    fn start(&mut self, osc: NodeId, at: f64) {
        self.inner.start(osc, at);
    }

    fn stop(&mut self, osc: NodeId, at: f64) {
        self.inner.stop(osc, at);
    }

    fn create_filter(&mut self) -> Result<NodeId, SynthError> {
        let node = self.inner.create_filter();
        self.track(node)
    }

    fn set_cutoff(&mut self, filter: NodeId, hz: f32, at: f64) {
        self.set_cutoff_calls += 1;
        self.inner.set_cutoff(filter, hz, at);
    }

    fn set_q(&mut self, filter: NodeId, q: f32) {
        self.set_q_calls += 1;
        self.inner.set_q(filter, q);
    }

    fn create_delay(&mut self) -> Result<NodeId, SynthError> {
        let node = self.inner.create_delay();
        self.track(node)
    }

    fn set_delay_time(&mut self, delay: NodeId, seconds: f32, at: f64) {
        self.inner.set_delay_time(delay, seconds, at);
    }

    fn create_gain(&mut self) -> Result<NodeId, SynthError> {
        let node = self.inner.create_gain();
        self.track(node)
    }

    fn set_gain_at(&mut self, gain: NodeId, value: f32, at: f64) {
        self.inner.set_gain_at(gain, value, at);
    }

    fn ramp_gain_to(&mut self, gain: NodeId, target: f32, at: f64) {
        self.inner.ramp_gain_to(gain, target, at);
    }

    fn gain_value(&self, gain: NodeId) -> f32 {
        self.inner.gain_value(gain)
    }

    fn connect(&mut self, src: NodeId, dst: NodeId) {
        self.inner.connect(src, dst);
    }

    fn disconnect(&mut self, node: NodeId) {
        self.live_nodes -= 1;
        self.inner.disconnect(node);
    }

    fn output(&self) -> NodeId {
        self.inner.output()
    }

    fn now(&self) -> f64 {
        self.inner.now()
    }
}

#[test]
fn default_note_on_builds_the_documented_chain() {
    let mut synth = engine();
    synth.note_on(0).unwrap(); // C-3

    assert_eq!(synth.active_voices(), 1);
    let voice = synth.voices()[0].clone();
    assert!((voice.frequency - 130.81).abs() < 1e-3);

    let graph = synth.graph();
    assert_eq!(graph.detune_at(voice.oscillators[0], 0.0), Some(0.0));
    assert_eq!(graph.detune_at(voice.oscillators[1], 0.0), Some(-10.0));
    assert_eq!(graph.detune_at(voice.oscillators[2], 0.0), Some(10.0));
    assert_eq!(graph.cutoff_at(voice.filter, 0.0), Some(500.0)); // halved
    assert_eq!(graph.q_of(voice.filter), Some(1.0));

    // Attack 0 -> 0.3 over 0.1 s, decay to 0.18 over the next 0.1 s
    assert_eq!(graph.gain_at(voice.gain, 0.0), Some(0.0));
    assert!((graph.gain_at(voice.gain, 0.1).unwrap() - 0.3).abs() < 1e-6);
    assert!((graph.gain_at(voice.gain, 0.2).unwrap() - 0.18).abs() < 1e-6);
    assert!((graph.gain_at(voice.gain, 2.0).unwrap() - 0.18).abs() < 1e-6);
}

#[test]
fn release_mid_attack_anchors_and_stops_on_schedule() {
    // Poly mode so the chain survives note-off and the schedule is readable
    let mut synth = engine();
    synth.toggle_poly_mode();
    synth.note_on(0).unwrap();
    let voice = synth.voices()[0].clone();

    synth.graph_mut().advance(0.05); // halfway up the attack
    synth.note_off();

    let release = synth.voices()[0].release.unwrap();
    assert!((release.at - 0.05).abs() < 1e-3);
    assert!((release.stop_time - 0.55).abs() < 1e-3);

    let graph = synth.graph();
    // Anchored at the mid-attack value, not the nominal sustain
    let anchored = graph.gain_at(voice.gain, 0.05).unwrap();
    assert!((anchored - 0.15).abs() < 1e-3);
    // Halfway through the release tail
    assert!((graph.gain_at(voice.gain, 0.3).unwrap() - 0.075).abs() < 1e-3);
    assert!(graph.gain_at(voice.gain, 0.55).unwrap().abs() < 1e-6);
    for osc in voice.oscillators {
        let stop = graph.stop_time_of(osc).unwrap();
        assert!((stop - 0.55).abs() < 1e-3);
    }
}

#[test]
fn mono_retrigger_replaces_the_sounding_voice() {
    let mut synth = engine();
    synth.note_on(0).unwrap();
    synth.graph_mut().advance(0.3);
    synth.note_on(7).unwrap(); // C-4

    assert_eq!(synth.active_voices(), 1);
    assert_eq!(synth.voices()[0].note_index, 7);
    // Output sink plus exactly one six-node chain
    assert_eq!(synth.graph().live_node_count(), 7);
}

#[test]
fn poly_voices_accumulate_and_one_note_off_releases_all() {
    let mut synth = engine();
    synth.toggle_poly_mode();

    synth.note_on(0).unwrap();
    synth.graph_mut().advance(0.05);
    synth.note_on(2).unwrap();
    synth.graph_mut().advance(0.05);
    synth.note_on(4).unwrap();
    assert_eq!(synth.active_voices(), 3);

    synth.note_off();
    let now = synth.graph().now();
    for voice in synth.voices() {
        assert_eq!(voice.state_at(now), VoiceState::Releasing);
    }
}

#[test]
fn reaper_reclaims_poly_voices_after_their_tails() {
    let mut synth = engine();
    synth.toggle_poly_mode();
    synth.note_on(0).unwrap();
    synth.note_on(4).unwrap();
    synth.graph_mut().advance(0.3);
    synth.note_off(); // release = 0.5, stop at t = 0.8

    synth.graph_mut().advance(0.4); // t = 0.7, still releasing
    synth.reap();
    assert_eq!(synth.active_voices(), 2);

    synth.graph_mut().advance(0.2); // t = 0.9, past the stop time
    synth.reap();
    assert_eq!(synth.active_voices(), 0);
    assert_eq!(synth.graph().live_node_count(), 1);
}

#[test]
fn note_on_runs_the_reaper_on_entry() {
    let mut synth = engine();
    synth.toggle_poly_mode();
    synth.note_on(0).unwrap();
    synth.note_off(); // stop at t = 0.5
    synth.graph_mut().advance(0.6);

    synth.note_on(1).unwrap();
    assert_eq!(synth.active_voices(), 1);
    assert_eq!(synth.graph().live_node_count(), 7);
}

#[test]
fn note_off_with_nothing_sounding_is_a_no_op() {
    let mut synth = engine();
    synth.note_off();
    synth.note_off();
    assert_eq!(synth.active_voices(), 0);
    assert_eq!(synth.graph().live_node_count(), 1);
}

#[test]
fn invalid_note_index_is_rejected() {
    let mut synth = engine();
    let err = synth.note_on(13).unwrap_err();
    assert!(matches!(err, SynthError::NoteIndex { index: 13, len: 13 }));
    assert_eq!(synth.active_voices(), 0);
}

#[test]
fn rejected_parameter_leaves_stored_state_untouched() {
    let mut synth = engine();
    synth.set_parameter(ParamChange::FilterQ(12.0)).unwrap();

    let err = synth.set_parameter(ParamChange::FilterQ(55.0)).unwrap_err();
    assert!(matches!(err, SynthError::ParameterOutOfRange { .. }));
    assert_eq!(synth.params().filter_q, 12.0);
}

#[test]
fn live_changes_reach_sounding_voices_with_full_cutoff() {
    let mut synth = engine();
    synth.note_on(0).unwrap();
    let voice = synth.voices()[0].clone();
    synth.graph_mut().advance(0.3);

    synth
        .set_parameter(ParamChange::FilterCutoffHz(2000.0))
        .unwrap();
    synth.set_parameter(ParamChange::FilterQ(5.0)).unwrap();
    synth
        .set_parameter(ParamChange::Waveform(Waveform::Square))
        .unwrap();

    let graph = synth.graph();
    let now = graph.now();
    assert_eq!(graph.cutoff_at(voice.filter, now), Some(2000.0));
    assert_eq!(graph.q_of(voice.filter), Some(5.0));
    for osc in voice.oscillators {
        assert_eq!(graph.waveform_of(osc), Some(Waveform::Square));
    }
    // The envelope is untouched by live propagation
    assert!((graph.gain_at(voice.gain, now).unwrap() - 0.18).abs() < 1e-6);
}

#[test]
fn relevant_changes_propagate_exactly_once() {
    let mut synth = SynthEngine::new(CountingGraph::new(SAMPLE_RATE));
    synth.note_on(0).unwrap();
    synth.graph_mut().reset_counters();

    synth
        .set_parameter(ParamChange::FilterCutoffHz(2000.0))
        .unwrap();
    // One voice, one propagation pass: all three live parameters re-applied
    assert_eq!(synth.graph().set_cutoff_calls, 1);
    assert_eq!(synth.graph().set_q_calls, 1);
    assert_eq!(synth.graph().set_waveform_calls, 3); // one per oscillator

    synth.set_parameter(ParamChange::FilterQ(5.0)).unwrap();
    assert_eq!(synth.graph().set_cutoff_calls, 2);
    assert_eq!(synth.graph().set_q_calls, 2);
    assert_eq!(synth.graph().set_waveform_calls, 6);
}

#[test]
fn unrelated_changes_never_touch_live_voices() {
    let mut synth = SynthEngine::new(CountingGraph::new(SAMPLE_RATE));
    synth.note_on(0).unwrap();
    let filter = synth.voices()[0].filter;
    synth.graph_mut().reset_counters();

    for change in [
        ParamChange::Volume(0.9),
        ParamChange::WidthCents(25.0),
        ParamChange::DelaySeconds(0.2),
        ParamChange::Attack(0.3),
        ParamChange::Decay(0.2),
        ParamChange::Sustain(0.4),
        ParamChange::Release(1.0),
    ] {
        synth.set_parameter(change).unwrap();
    }

    assert_eq!(synth.graph().set_cutoff_calls, 0);
    assert_eq!(synth.graph().set_q_calls, 0);
    assert_eq!(synth.graph().set_waveform_calls, 0);
    // The sounding voice still carries its halved construction cutoff
    assert_eq!(synth.graph().inner.cutoff_at(filter, 0.0), Some(500.0));
}

#[test]
fn no_propagation_after_the_note_is_released() {
    let mut synth = SynthEngine::new(CountingGraph::new(SAMPLE_RATE));
    synth.toggle_poly_mode(); // released voices stay registered until reaped
    synth.note_on(0).unwrap();
    synth.note_off();
    synth.graph_mut().reset_counters();

    synth
        .set_parameter(ParamChange::FilterCutoffHz(3000.0))
        .unwrap();

    assert_eq!(synth.graph().set_cutoff_calls, 0);
    assert_eq!(synth.graph().set_q_calls, 0);
    assert_eq!(synth.graph().set_waveform_calls, 0);
}

#[test]
fn mono_retrigger_cuts_before_the_new_chain_allocates() {
    let mut synth = SynthEngine::new(CountingGraph::new(SAMPLE_RATE));
    synth.note_on(0).unwrap();
    assert_eq!(synth.graph().max_live_nodes, 7);

    // If the old chain survived into the build, the high-water mark would
    // reach 13
    synth.note_on(5).unwrap();
    assert_eq!(synth.graph().max_live_nodes, 7);
}

#[test]
fn mono_retrigger_succeeds_within_a_tight_node_budget() {
    // Room for exactly one chain plus five spare slots: the retrigger only
    // fits because the previous voice is cut before the new one allocates
    let mut synth = SynthEngine::new(SoftwareGraph::with_budget(SAMPLE_RATE, 12));
    synth.note_on(0).unwrap();
    synth.note_on(1).unwrap();

    assert_eq!(synth.active_voices(), 1);
    assert_eq!(synth.voices()[0].note_index, 1);
    assert_eq!(synth.graph().live_node_count(), 7);
}

#[test]
fn non_live_changes_wait_for_the_next_trigger() {
    let mut synth = engine();
    synth.note_on(0).unwrap();
    let first = synth.voices()[0].clone();

    synth.set_parameter(ParamChange::WidthCents(30.0)).unwrap();
    synth.set_parameter(ParamChange::Volume(0.9)).unwrap();

    let graph = synth.graph();
    assert_eq!(graph.detune_at(first.oscillators[1], 0.0), Some(-10.0));
    assert!((graph.gain_at(first.gain, 0.1).unwrap() - 0.3).abs() < 1e-6);

    synth.note_on(0).unwrap();
    let second = synth.voices()[0].clone();
    let graph = synth.graph();
    let t = second.start_time;
    assert_eq!(graph.detune_at(second.oscillators[1], t), Some(-30.0));
    assert!((graph.gain_at(second.gain, t + 0.1).unwrap() - 0.9).abs() < 1e-6);
}

#[test]
fn toggling_poly_does_not_disturb_sounding_voices() {
    let mut synth = engine();
    synth.note_on(0).unwrap();
    let before = synth.voices()[0].clone();

    assert!(synth.toggle_poly_mode());
    assert_eq!(synth.active_voices(), 1);
    assert_eq!(synth.voices()[0].note_index, before.note_index);
    assert!(synth.voices()[0].release.is_none());

    // The next trigger uses the new policy
    synth.note_on(3).unwrap();
    assert_eq!(synth.active_voices(), 2);
}

#[test]
fn rendered_audio_is_silent_before_and_loud_during_the_note() {
    let mut synth = engine();

    let mut silence = vec![0.0f32; 4800];
    synth.graph_mut().render(&mut silence);
    assert!(silence.iter().all(|s| s.abs() < 1e-6));

    synth.note_on(0).unwrap();
    let mut note = vec![0.0f32; 9600]; // 0.2 s: through attack and decay
    synth.graph_mut().render(&mut note);
    assert!(note.iter().any(|s| s.abs() > 0.05));

    synth.note_off();
    // Mono note-off disconnects the chain; output goes silent at once
    let mut after = vec![0.0f32; 4800];
    synth.graph_mut().render(&mut after);
    assert!(after.iter().all(|s| s.abs() < 1e-6));
}
