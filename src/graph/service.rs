use crate::error::SynthError;
use crate::params::Waveform;

/// Opaque handle to a node owned by the audio-graph service.
///
/// A handle is valid from creation until `disconnect` frees the node; the
/// service may hand the slot to a later allocation, so freed handles must be
/// dropped, not retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

/// The audio-graph service consumed by the voice engine.
///
/// All `at` arguments are absolute times in seconds on the service's clock
/// (`now`). Scheduling methods return immediately; the service executes the
/// events sample-accurately on its own rendering thread. Node creation is the
/// only fallible operation: either it succeeds or the device is unusable.
///
/// The trait is object-safe on purpose: voice lifecycle code takes
/// `&mut dyn AudioGraph` so the same logic drives the software backend, the
/// realtime link, and any platform service.
pub trait AudioGraph {
    fn create_oscillator(&mut self) -> Result<NodeId, SynthError>;
    fn set_waveform(&mut self, osc: NodeId, waveform: Waveform);
    fn set_frequency(&mut self, osc: NodeId, hz: f32, at: f64);
    /// Detune in cents; the service applies 2^(cents/1200) to the frequency.
    fn set_detune(&mut self, osc: NodeId, cents: f32, at: f64);
    fn start(&mut self, osc: NodeId, at: f64);
    fn stop(&mut self, osc: NodeId, at: f64);

    /// Creates a lowpass filter node.
    fn create_filter(&mut self) -> Result<NodeId, SynthError>;
    fn set_cutoff(&mut self, filter: NodeId, hz: f32, at: f64);
    fn set_q(&mut self, filter: NodeId, q: f32);

    fn create_delay(&mut self) -> Result<NodeId, SynthError>;
    fn set_delay_time(&mut self, delay: NodeId, seconds: f32, at: f64);

    fn create_gain(&mut self) -> Result<NodeId, SynthError>;
    /// Anchor the gain at an exact value, cancelling any later scheduled
    /// events on that parameter (cancel-and-hold).
    fn set_gain_at(&mut self, gain: NodeId, value: f32, at: f64);
    /// Linear ramp from the previous scheduled event to `target` at `at`.
    fn ramp_gain_to(&mut self, gain: NodeId, target: f32, at: f64);
    /// The gain parameter's value at the current clock time.
    fn gain_value(&self, gain: NodeId) -> f32;

    fn connect(&mut self, src: NodeId, dst: NodeId);
    /// Tear the node out of the graph and free it, severing all its edges.
    fn disconnect(&mut self, node: NodeId);
    /// Handle of the mix destination every voice chain terminates at.
    fn output(&self) -> NodeId;
    /// Current time in seconds on the service's rendering clock.
    fn now(&self) -> f64;
}
