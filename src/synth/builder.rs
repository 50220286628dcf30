/*
Voice Builder
=============

Assembles the per-note signal chain:

    osc (0¢)    ──┐
    osc (−width¢) ─┼──▶ lowpass ──▶ delay ──▶ gain ──▶ output
    osc (+width¢) ─┘

All three oscillators share one frequency and are scheduled with identical
timestamps, so the unison stays phase-coherent and the width control only
spreads the pitch.

Two behaviors here are deliberate, not accidents:

  - The filter cutoff is HALVED at construction time; live cutoff updates
    (see registry::propagate_live) apply the full value.
  - Oscillators start immediately at build time, before the attack ramp is
    scheduled; the gain node idles at 0 so nothing is heard early.

Construction is atomic: if any node allocation fails, every node created so
far is disconnected before the error propagates.
*/

use crate::error::SynthError;
use crate::graph::service::{AudioGraph, NodeId};
use crate::params::SynthParams;
use crate::synth::voice::Voice;

pub fn build(
    graph: &mut dyn AudioGraph,
    note_index: usize,
    frequency: f32,
    params: &SynthParams,
) -> Result<Voice, SynthError> {
    let now = graph.now();
    let mut created: Vec<NodeId> = Vec::with_capacity(6);

    match build_chain(graph, frequency, params, now, &mut created) {
        Ok((oscillators, filter, delay, gain)) => {
            let attack_end = now + params.adsr.attack as f64;
            let decay_end = attack_end + params.adsr.decay as f64;
            Ok(Voice {
                note_index,
                frequency,
                oscillators,
                filter,
                delay,
                gain,
                start_time: now,
                attack_end,
                decay_end,
                release: None,
            })
        }
        Err(err) => {
            for node in created {
                graph.disconnect(node);
            }
            Err(err)
        }
    }
}

fn build_chain(
    graph: &mut dyn AudioGraph,
    frequency: f32,
    params: &SynthParams,
    now: f64,
    created: &mut Vec<NodeId>,
) -> Result<([NodeId; 3], NodeId, NodeId, NodeId), SynthError> {
    let filter = graph.create_filter()?;
    created.push(filter);
    graph.set_cutoff(filter, params.filter_cutoff_hz / 2.0, now);
    graph.set_q(filter, params.filter_q);

    let delay = graph.create_delay()?;
    created.push(delay);
    graph.set_delay_time(delay, params.delay_seconds, now);

    let gain = graph.create_gain()?;
    created.push(gain);
    // Anchor at zero before the oscillators start; a fresh gain node sits at
    // unity, and on the realtime link a block boundary can land between any
    // two commands.
    graph.set_gain_at(gain, 0.0, now);

    let width = params.width_cents;
    let mut oscillators = Vec::with_capacity(3);
    for detune in [0.0, -width, width] {
        let osc = graph.create_oscillator()?;
        created.push(osc);
        graph.set_waveform(osc, params.waveform);
        graph.set_frequency(osc, frequency, now);
        graph.set_detune(osc, detune, now);
        graph.connect(osc, filter);
        oscillators.push(osc);
    }

    graph.connect(filter, delay);
    graph.connect(delay, gain);
    let output = graph.output();
    graph.connect(gain, output);

    for &osc in &oscillators {
        graph.start(osc, now);
    }

    Ok((
        [oscillators[0], oscillators[1], oscillators[2]],
        filter,
        delay,
        gain,
    ))
}
