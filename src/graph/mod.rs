//! The audio-graph service: the narrow seam between voice lifecycle logic
//! and sample-accurate signal processing.
//!
//! The engine never renders audio itself. It creates nodes, wires them into
//! per-voice chains, and schedules time-stamped parameter automation against
//! the service's clock, then trusts the service to execute those events
//! sample-accurately on its own rendering thread. `service` defines that
//! contract; `automation` implements the event timelines; `software` is a
//! complete in-process backend; `link` splits the backend across a realtime
//! boundary with a lock-free command queue.

/// Time-stamped parameter automation (set / linear-ramp events).
pub mod automation;
/// Control-thread client / audio-thread worker pair over a ring buffer.
#[cfg(feature = "rtrb")]
pub mod link;
/// The `AudioGraph` trait and node handles.
pub mod service;
/// In-process `AudioGraph` backend that renders audio.
pub mod software;
