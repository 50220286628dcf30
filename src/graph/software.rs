//! In-process implementation of the audio-graph service.
//!
//! `SoftwareGraph` owns a table of nodes, a list of directed edges, and a
//! sample counter that doubles as the clock (`now = frames / sample_rate`).
//! Rendering walks the nodes in topological order once per sample, so every
//! scheduled automation event lands on the exact frame it names. The same
//! instance serves realtime playback (behind [`crate::graph::link`]), offline
//! rendering, and the test suite - where a virtual-time `advance` replaces a
//! sound card.

use crate::dsp::delay::DelayLine;
use crate::dsp::filter::LowpassFilter;
use crate::dsp::oscillator::{cents_to_ratio, PhaseOsc};
use crate::error::SynthError;
use crate::graph::automation::ParamTimeline;
use crate::graph::service::{AudioGraph, NodeId};
use crate::params::Waveform;
use crate::{MAX_BLOCK_SIZE, MAX_DELAY_SECONDS};

/// Node allocations permitted per graph unless overridden. Generous for a
/// 13-key instrument (each voice takes six nodes) while still bounding a
/// runaway caller.
pub const DEFAULT_NODE_BUDGET: usize = 256;

enum NodeKind {
    Oscillator {
        osc: PhaseOsc,
        waveform: Waveform,
        frequency: ParamTimeline,
        detune: ParamTimeline,
        start_at: Option<f64>,
        stop_at: Option<f64>,
    },
    Filter {
        filter: LowpassFilter,
        cutoff: ParamTimeline,
        q: f32,
    },
    Delay {
        line: DelayLine,
        time: ParamTimeline,
    },
    Gain {
        level: ParamTimeline,
    },
    Output,
}

pub struct SoftwareGraph {
    sample_rate: f32,
    node_budget: usize,
    /// Slot table; freed slots are reused by later allocations.
    nodes: Vec<Option<NodeKind>>,
    edges: Vec<(u32, u32)>,
    /// Cached topological order, rebuilt after topology changes.
    order: Vec<u32>,
    order_dirty: bool,
    frames_rendered: u64,
    /// Per-node output for the tick being processed.
    levels: Vec<f32>,
    /// Per-node accumulated input for the tick being processed.
    feeds: Vec<f32>,
}

impl SoftwareGraph {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_budget(sample_rate, DEFAULT_NODE_BUDGET)
    }

    pub fn with_budget(sample_rate: f32, node_budget: usize) -> Self {
        Self {
            sample_rate,
            node_budget,
            nodes: vec![Some(NodeKind::Output)],
            edges: Vec::new(),
            order: Vec::new(),
            order_dirty: true,
            frames_rendered: 0,
            levels: Vec::new(),
            feeds: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Nodes currently allocated, including the output sink.
    pub fn live_node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    fn alloc(&mut self, kind: NodeKind) -> Result<NodeId, SynthError> {
        if self.live_node_count() >= self.node_budget {
            return Err(SynthError::GraphAllocation(format!(
                "node budget of {} exhausted",
                self.node_budget
            )));
        }

        // Reuse a freed slot if one exists; handles to freed nodes must not
        // be retained by callers.
        let idx = match self.nodes.iter().position(|n| n.is_none()) {
            Some(idx) => {
                self.nodes[idx] = Some(kind);
                idx
            }
            None => {
                self.nodes.push(Some(kind));
                self.nodes.len() - 1
            }
        };

        self.order_dirty = true;
        Ok(NodeId(idx as u32))
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.nodes.get_mut(id.0 as usize).and_then(|n| n.as_mut())
    }

    fn node(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0 as usize).and_then(|n| n.as_ref())
    }

    fn rebuild_order(&mut self) {
        let n = self.nodes.len();
        let mut indegree = vec![0usize; n];
        for &(_, dst) in &self.edges {
            indegree[dst as usize] += 1;
        }

        let mut ready: Vec<u32> = (0..n as u32)
            .filter(|&i| self.nodes[i as usize].is_some() && indegree[i as usize] == 0)
            .collect();

        self.order.clear();
        while let Some(idx) = ready.pop() {
            self.order.push(idx);
            for &(src, dst) in &self.edges {
                if src == idx {
                    indegree[dst as usize] -= 1;
                    if indegree[dst as usize] == 0 {
                        ready.push(dst);
                    }
                }
            }
        }

        debug_assert_eq!(
            self.order.len(),
            self.live_node_count(),
            "voice chains are acyclic by construction"
        );

        self.levels.resize(n, 0.0);
        self.feeds.resize(n, 0.0);
        self.order_dirty = false;
    }

    /// Render one block of mixed output and advance the clock.
    pub fn render(&mut self, out: &mut [f32]) {
        if self.order_dirty {
            self.rebuild_order();
        }

        let sample_rate = self.sample_rate;
        for frame in out.iter_mut() {
            let t = self.frames_rendered as f64 / sample_rate as f64;
            self.feeds.fill(0.0);

            for i in 0..self.order.len() {
                let idx = self.order[i] as usize;
                let input = self.feeds[idx];

                let output = match self.nodes[idx].as_mut() {
                    Some(NodeKind::Oscillator {
                        osc,
                        waveform,
                        frequency,
                        detune,
                        start_at,
                        stop_at,
                    }) => {
                        let running = start_at.map_or(false, |s| t >= s)
                            && stop_at.map_or(true, |e| t < e);
                        if running {
                            let hz = frequency.value_at(t)
                                * cents_to_ratio(detune.value_at(t));
                            osc.next_sample(*waveform, hz, sample_rate)
                        } else {
                            0.0
                        }
                    }
                    Some(NodeKind::Filter { filter, cutoff, q }) => {
                        filter.next_sample(input, cutoff.value_at(t), *q, sample_rate)
                    }
                    Some(NodeKind::Delay { line, time }) => {
                        let seconds = time.value_at(t).clamp(0.0, MAX_DELAY_SECONDS);
                        let samples = (seconds * sample_rate) as usize;
                        line.next_sample(input, samples)
                    }
                    Some(NodeKind::Gain { level }) => input * level.value_at(t),
                    Some(NodeKind::Output) => input,
                    None => 0.0,
                };

                self.levels[idx] = output;
                for e in 0..self.edges.len() {
                    let (src, dst) = self.edges[e];
                    if src as usize == idx {
                        self.feeds[dst as usize] += output;
                    }
                }
            }

            *frame = self.levels[0];
            self.frames_rendered += 1;
        }
    }

    /// Advance the clock by rendering into a scratch buffer. Lets tests and
    /// offline callers move time forward without a sound card.
    pub fn advance(&mut self, seconds: f64) {
        let mut remaining = (seconds * self.sample_rate as f64).round() as usize;
        let mut scratch = [0.0f32; MAX_BLOCK_SIZE];
        while remaining > 0 {
            let chunk = remaining.min(MAX_BLOCK_SIZE);
            self.render(&mut scratch[..chunk]);
            remaining -= chunk;
        }
    }

    // Introspection - lets tests and host tooling read back what was
    // scheduled without waiting for audio to play out.

    pub fn is_connected(&self, src: NodeId, dst: NodeId) -> bool {
        self.edges.contains(&(src.0, dst.0))
    }

    pub fn waveform_of(&self, id: NodeId) -> Option<Waveform> {
        match self.node(id)? {
            NodeKind::Oscillator { waveform, .. } => Some(*waveform),
            _ => None,
        }
    }

    pub fn frequency_at(&self, id: NodeId, t: f64) -> Option<f32> {
        match self.node(id)? {
            NodeKind::Oscillator { frequency, .. } => Some(frequency.value_at(t)),
            _ => None,
        }
    }

    pub fn detune_at(&self, id: NodeId, t: f64) -> Option<f32> {
        match self.node(id)? {
            NodeKind::Oscillator { detune, .. } => Some(detune.value_at(t)),
            _ => None,
        }
    }

    pub fn stop_time_of(&self, id: NodeId) -> Option<f64> {
        match self.node(id)? {
            NodeKind::Oscillator { stop_at, .. } => *stop_at,
            _ => None,
        }
    }

    pub fn cutoff_at(&self, id: NodeId, t: f64) -> Option<f32> {
        match self.node(id)? {
            NodeKind::Filter { cutoff, .. } => Some(cutoff.value_at(t)),
            _ => None,
        }
    }

    pub fn q_of(&self, id: NodeId) -> Option<f32> {
        match self.node(id)? {
            NodeKind::Filter { q, .. } => Some(*q),
            _ => None,
        }
    }

    pub fn delay_time_at(&self, id: NodeId, t: f64) -> Option<f32> {
        match self.node(id)? {
            NodeKind::Delay { time, .. } => Some(time.value_at(t)),
            _ => None,
        }
    }

    pub fn gain_at(&self, id: NodeId, t: f64) -> Option<f32> {
        match self.node(id)? {
            NodeKind::Gain { level } => Some(level.value_at(t)),
            _ => None,
        }
    }
}

impl AudioGraph for SoftwareGraph {
    fn create_oscillator(&mut self) -> Result<NodeId, SynthError> {
        self.alloc(NodeKind::Oscillator {
            osc: PhaseOsc::new(),
            waveform: Waveform::Sine,
            frequency: ParamTimeline::new(440.0),
            detune: ParamTimeline::new(0.0),
            start_at: None,
            stop_at: None,
        })
    }

    fn set_waveform(&mut self, osc: NodeId, new_waveform: Waveform) {
        if let Some(NodeKind::Oscillator { waveform, .. }) = self.node_mut(osc) {
            *waveform = new_waveform;
        }
    }

    fn set_frequency(&mut self, osc: NodeId, hz: f32, at: f64) {
        if let Some(NodeKind::Oscillator { frequency, .. }) = self.node_mut(osc) {
            frequency.set_at(hz, at);
        }
    }

    fn set_detune(&mut self, osc: NodeId, cents: f32, at: f64) {
        if let Some(NodeKind::Oscillator { detune, .. }) = self.node_mut(osc) {
            detune.set_at(cents, at);
        }
    }

    fn start(&mut self, osc: NodeId, at: f64) {
        if let Some(NodeKind::Oscillator { start_at, .. }) = self.node_mut(osc) {
            *start_at = Some(at);
        }
    }

    fn stop(&mut self, osc: NodeId, at: f64) {
        if let Some(NodeKind::Oscillator { stop_at, .. }) = self.node_mut(osc) {
            *stop_at = Some(at);
        }
    }

    fn create_filter(&mut self) -> Result<NodeId, SynthError> {
        self.alloc(NodeKind::Filter {
            filter: LowpassFilter::new(),
            cutoff: ParamTimeline::new(1000.0),
            q: 1.0,
        })
    }

    fn set_cutoff(&mut self, filter: NodeId, hz: f32, at: f64) {
        if let Some(NodeKind::Filter { cutoff, .. }) = self.node_mut(filter) {
            cutoff.set_at(hz, at);
        }
    }

    fn set_q(&mut self, filter: NodeId, value: f32) {
        if let Some(NodeKind::Filter { q, .. }) = self.node_mut(filter) {
            *q = value;
        }
    }

    fn create_delay(&mut self) -> Result<NodeId, SynthError> {
        let max_samples = (MAX_DELAY_SECONDS * self.sample_rate) as usize + 1;
        self.alloc(NodeKind::Delay {
            line: DelayLine::new(max_samples),
            time: ParamTimeline::new(0.0),
        })
    }

    fn set_delay_time(&mut self, delay: NodeId, seconds: f32, at: f64) {
        if let Some(NodeKind::Delay { time, .. }) = self.node_mut(delay) {
            time.set_at(seconds, at);
        }
    }

    fn create_gain(&mut self) -> Result<NodeId, SynthError> {
        self.alloc(NodeKind::Gain {
            level: ParamTimeline::new(1.0),
        })
    }

    fn set_gain_at(&mut self, gain: NodeId, value: f32, at: f64) {
        if let Some(NodeKind::Gain { level }) = self.node_mut(gain) {
            level.set_at(value, at);
        }
    }

    fn ramp_gain_to(&mut self, gain: NodeId, target: f32, at: f64) {
        if let Some(NodeKind::Gain { level }) = self.node_mut(gain) {
            level.ramp_to(target, at);
        }
    }

    fn gain_value(&self, gain: NodeId) -> f32 {
        self.gain_at(gain, self.now()).unwrap_or(0.0)
    }

    fn connect(&mut self, src: NodeId, dst: NodeId) {
        debug_assert!(self.node(src).is_some(), "connect from freed node");
        debug_assert!(self.node(dst).is_some(), "connect to freed node");
        if !self.is_connected(src, dst) {
            self.edges.push((src.0, dst.0));
            self.order_dirty = true;
        }
    }

    fn disconnect(&mut self, node: NodeId) {
        if node == self.output() {
            return; // the mix destination outlives every voice
        }
        let idx = node.0;
        self.edges.retain(|&(src, dst)| src != idx && dst != idx);
        if let Some(slot) = self.nodes.get_mut(idx as usize) {
            *slot = None;
        }
        self.order_dirty = true;
    }

    fn output(&self) -> NodeId {
        NodeId(0)
    }

    fn now(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate as f64
    }
}
