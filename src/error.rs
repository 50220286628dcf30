use thiserror::Error;

/// Everything that can go wrong inside the voice engine.
///
/// All variants surface synchronously to the caller of `note_on` /
/// `set_parameter`; none are retried. A failed note-on produces silence for
/// that trigger with no half-connected voice left behind.
#[derive(Debug, Error)]
pub enum SynthError {
    /// A slider value fell outside its documented range. The previously
    /// stored value is retained; no partial state change occurs.
    #[error("parameter {name} out of range: {value} (allowed {min}..={max})")]
    ParameterOutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// The audio-graph service could not allocate a node. Either node
    /// creation succeeds or the device is unusable for the session.
    #[error("audio graph allocation failed: {0}")]
    GraphAllocation(String),

    /// Note index outside the fixed catalog.
    #[error("note index {index} outside catalog of {len} notes")]
    NoteIndex { index: usize, len: usize },
}
