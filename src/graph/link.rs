/*
Realtime Graph Link
===================

Splits the audio-graph service across the realtime boundary:

    control thread                      audio thread
    ┌─────────────┐   GraphCommand    ┌─────────────┐
    │ GraphClient │ ──ring buffer───▶ │ GraphWorker │──▶ render()
    │  (engine)   │ ◀──atomic clock── │ (SoftwareGraph)
    └─────────────┘                   └─────────────┘

The client implements `AudioGraph` by translating every call into a
`GraphCommand` pushed onto a lock-free queue; the worker drains the queue at
the top of each render block and replays the commands against its private
`SoftwareGraph`. Nothing blocks and nothing allocates on the hot path of the
control thread.

Two things cannot ride the queue and are mirrored instead:

  - `now()`: the worker publishes its frame counter through an atomic after
    every block; the client divides by the sample rate.
  - `gain_value()`: the client keeps a local copy of each gain node's
    timeline, updated as it schedules, and evaluates it at the mirrored
    clock. Both sides apply identical events, so the mirror cannot drift.

The client also enforces the node budget locally so allocation fails on the
calling thread, where the error can be reported, instead of silently on the
audio thread.
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rtrb::{Consumer, Producer, RingBuffer};

use crate::error::SynthError;
use crate::graph::automation::ParamTimeline;
use crate::graph::service::{AudioGraph, NodeId};
use crate::graph::software::{SoftwareGraph, DEFAULT_NODE_BUDGET};
use crate::params::Waveform;

const COMMAND_QUEUE_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy)]
pub enum GraphCommand {
    CreateOscillator { id: u32 },
    SetWaveform { id: u32, waveform: Waveform },
    SetFrequency { id: u32, hz: f32, at: f64 },
    SetDetune { id: u32, cents: f32, at: f64 },
    Start { id: u32, at: f64 },
    Stop { id: u32, at: f64 },
    CreateFilter { id: u32 },
    SetCutoff { id: u32, hz: f32, at: f64 },
    SetQ { id: u32, q: f32 },
    CreateDelay { id: u32 },
    SetDelayTime { id: u32, seconds: f32, at: f64 },
    CreateGain { id: u32 },
    SetGainAt { id: u32, value: f32, at: f64 },
    RampGainTo { id: u32, target: f32, at: f64 },
    Connect { src: u32, dst: u32 },
    Disconnect { id: u32 },
}

/// Control-thread half: an `AudioGraph` whose operations are queued for the
/// worker instead of executed in place.
pub struct GraphClient {
    tx: Producer<GraphCommand>,
    clock_frames: Arc<AtomicU64>,
    sample_rate: f32,
    next_id: u32,
    live_nodes: usize,
    node_budget: usize,
    gains: HashMap<u32, ParamTimeline>,
}

/// Audio-thread half: owns the rendering graph and replays queued commands
/// at block boundaries.
pub struct GraphWorker {
    graph: SoftwareGraph,
    rx: Consumer<GraphCommand>,
    clock_frames: Arc<AtomicU64>,
    ids: HashMap<u32, NodeId>,
}

/// Builds a connected client/worker pair sharing one clock.
pub fn link(sample_rate: f32) -> (GraphClient, GraphWorker) {
    link_with_budget(sample_rate, DEFAULT_NODE_BUDGET)
}

pub fn link_with_budget(sample_rate: f32, node_budget: usize) -> (GraphClient, GraphWorker) {
    let (tx, rx) = RingBuffer::<GraphCommand>::new(COMMAND_QUEUE_SIZE);
    let clock_frames = Arc::new(AtomicU64::new(0));

    let graph = SoftwareGraph::with_budget(sample_rate, node_budget);
    let mut ids = HashMap::new();
    ids.insert(0, graph.output());

    let client = GraphClient {
        tx,
        clock_frames: Arc::clone(&clock_frames),
        sample_rate,
        next_id: 1,
        live_nodes: 1, // the output sink
        node_budget,
        gains: HashMap::new(),
    };
    let worker = GraphWorker {
        graph,
        rx,
        clock_frames,
        ids,
    };
    (client, worker)
}

impl GraphClient {
    fn send(&mut self, cmd: GraphCommand) {
        if self.tx.push(cmd).is_err() {
            tracing::warn!(?cmd, "graph command queue full, dropping command");
        }
    }

    fn create(&mut self, make: fn(u32) -> GraphCommand) -> Result<NodeId, SynthError> {
        if self.live_nodes >= self.node_budget {
            return Err(SynthError::GraphAllocation(format!(
                "node budget of {} exhausted",
                self.node_budget
            )));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.live_nodes += 1;
        self.send(make(id));
        Ok(NodeId(id))
    }
}

impl AudioGraph for GraphClient {
    fn create_oscillator(&mut self) -> Result<NodeId, SynthError> {
        self.create(|id| GraphCommand::CreateOscillator { id })
    }

    fn set_waveform(&mut self, osc: NodeId, waveform: Waveform) {
        self.send(GraphCommand::SetWaveform { id: osc.0, waveform });
    }

    fn set_frequency(&mut self, osc: NodeId, hz: f32, at: f64) {
        self.send(GraphCommand::SetFrequency { id: osc.0, hz, at });
    }

    fn set_detune(&mut self, osc: NodeId, cents: f32, at: f64) {
        self.send(GraphCommand::SetDetune { id: osc.0, cents, at });
    }

    fn start(&mut self, osc: NodeId, at: f64) {
        self.send(GraphCommand::Start { id: osc.0, at });
    }

    fn stop(&mut self, osc: NodeId, at: f64) {
        self.send(GraphCommand::Stop { id: osc.0, at });
    }

    fn create_filter(&mut self) -> Result<NodeId, SynthError> {
        self.create(|id| GraphCommand::CreateFilter { id })
    }

    fn set_cutoff(&mut self, filter: NodeId, hz: f32, at: f64) {
        self.send(GraphCommand::SetCutoff { id: filter.0, hz, at });
    }

    fn set_q(&mut self, filter: NodeId, q: f32) {
        self.send(GraphCommand::SetQ { id: filter.0, q });
    }

    fn create_delay(&mut self) -> Result<NodeId, SynthError> {
        self.create(|id| GraphCommand::CreateDelay { id })
    }

    fn set_delay_time(&mut self, delay: NodeId, seconds: f32, at: f64) {
        self.send(GraphCommand::SetDelayTime { id: delay.0, seconds, at });
    }

    fn create_gain(&mut self) -> Result<NodeId, SynthError> {
        let id = self.create(|id| GraphCommand::CreateGain { id })?;
        self.gains.insert(id.0, ParamTimeline::new(1.0));
        Ok(id)
    }

    fn set_gain_at(&mut self, gain: NodeId, value: f32, at: f64) {
        if let Some(timeline) = self.gains.get_mut(&gain.0) {
            timeline.set_at(value, at);
        }
        self.send(GraphCommand::SetGainAt { id: gain.0, value, at });
    }

    fn ramp_gain_to(&mut self, gain: NodeId, target: f32, at: f64) {
        if let Some(timeline) = self.gains.get_mut(&gain.0) {
            timeline.ramp_to(target, at);
        }
        self.send(GraphCommand::RampGainTo { id: gain.0, target, at });
    }

    fn gain_value(&self, gain: NodeId) -> f32 {
        self.gains
            .get(&gain.0)
            .map_or(0.0, |timeline| timeline.value_at(self.now()))
    }

    fn connect(&mut self, src: NodeId, dst: NodeId) {
        self.send(GraphCommand::Connect { src: src.0, dst: dst.0 });
    }

    fn disconnect(&mut self, node: NodeId) {
        if node.0 == 0 {
            return;
        }
        self.live_nodes = self.live_nodes.saturating_sub(1);
        self.gains.remove(&node.0);
        self.send(GraphCommand::Disconnect { id: node.0 });
    }

    fn output(&self) -> NodeId {
        NodeId(0)
    }

    fn now(&self) -> f64 {
        self.clock_frames.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }
}

impl GraphWorker {
    /// Drain pending commands, render one block, publish the clock. This is
    /// the audio callback's entire job.
    pub fn render(&mut self, out: &mut [f32]) {
        while let Ok(cmd) = self.rx.pop() {
            self.apply(cmd);
        }
        self.graph.render(out);
        self.clock_frames
            .store(self.graph.frames_rendered(), Ordering::Release);
    }

    pub fn graph(&self) -> &SoftwareGraph {
        &self.graph
    }

    fn mapped(&self, id: u32) -> Option<NodeId> {
        self.ids.get(&id).copied()
    }

    fn apply(&mut self, cmd: GraphCommand) {
        match cmd {
            GraphCommand::CreateOscillator { id } => {
                if let Ok(node) = self.graph.create_oscillator() {
                    self.ids.insert(id, node);
                }
            }
            GraphCommand::SetWaveform { id, waveform } => {
                if let Some(node) = self.mapped(id) {
                    self.graph.set_waveform(node, waveform);
                }
            }
            GraphCommand::SetFrequency { id, hz, at } => {
                if let Some(node) = self.mapped(id) {
                    self.graph.set_frequency(node, hz, at);
                }
            }
            GraphCommand::SetDetune { id, cents, at } => {
                if let Some(node) = self.mapped(id) {
                    self.graph.set_detune(node, cents, at);
                }
            }
            GraphCommand::Start { id, at } => {
                if let Some(node) = self.mapped(id) {
                    self.graph.start(node, at);
                }
            }
            GraphCommand::Stop { id, at } => {
                if let Some(node) = self.mapped(id) {
                    self.graph.stop(node, at);
                }
            }
            GraphCommand::CreateFilter { id } => {
                if let Ok(node) = self.graph.create_filter() {
                    self.ids.insert(id, node);
                }
            }
            GraphCommand::SetCutoff { id, hz, at } => {
                if let Some(node) = self.mapped(id) {
                    self.graph.set_cutoff(node, hz, at);
                }
            }
            GraphCommand::SetQ { id, q } => {
                if let Some(node) = self.mapped(id) {
                    self.graph.set_q(node, q);
                }
            }
            GraphCommand::CreateDelay { id } => {
                if let Ok(node) = self.graph.create_delay() {
                    self.ids.insert(id, node);
                }
            }
            GraphCommand::SetDelayTime { id, seconds, at } => {
                if let Some(node) = self.mapped(id) {
                    self.graph.set_delay_time(node, seconds, at);
                }
            }
            GraphCommand::CreateGain { id } => {
                if let Ok(node) = self.graph.create_gain() {
                    self.ids.insert(id, node);
                }
            }
            GraphCommand::SetGainAt { id, value, at } => {
                if let Some(node) = self.mapped(id) {
                    self.graph.set_gain_at(node, value, at);
                }
            }
            GraphCommand::RampGainTo { id, target, at } => {
                if let Some(node) = self.mapped(id) {
                    self.graph.ramp_gain_to(node, target, at);
                }
            }
            GraphCommand::Connect { src, dst } => {
                if let (Some(src), Some(dst)) = (self.mapped(src), self.mapped(dst)) {
                    self.graph.connect(src, dst);
                }
            }
            GraphCommand::Disconnect { id } => {
                if let Some(node) = self.ids.remove(&id) {
                    self.graph.disconnect(node);
                }
            }
        }
    }
}
