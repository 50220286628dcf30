//! Voice lifecycle: building per-note signal chains, scheduling their
//! amplitude envelopes, and tracking them from trigger to teardown.

pub mod builder;
pub mod engine;
pub mod envelope;
pub mod registry;
pub mod voice;
