use crate::graph::service::NodeId;

/// A scheduled release: when it was anchored and when the voice falls silent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    pub at: f64,
    pub stop_time: f64,
}

/// One sounding note: three detuned oscillators into a shared
/// filter -> delay -> gain chain, all exclusively owned by this voice.
///
/// A voice stores only node handles and envelope timestamps. Its lifecycle
/// state is derived from the clock on demand; nothing calls back into the
/// voice when a ramp finishes.
#[derive(Debug, Clone)]
pub struct Voice {
    pub note_index: usize,
    pub frequency: f32,
    pub oscillators: [NodeId; 3],
    pub filter: NodeId,
    pub delay: NodeId,
    pub gain: NodeId,
    pub start_time: f64,
    /// End of the attack ramp (peak reached).
    pub attack_end: f64,
    /// End of the decay ramp (sustain level reached).
    pub decay_end: f64,
    pub release: Option<Release>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    /// Onset: ramping through attack and decay toward the sustain level.
    Attacking,
    Sustaining,
    Releasing,
    /// Past the scheduled stop time; the reaper may tear the chain down.
    Stopped,
}

impl Voice {
    /// Lifecycle state purely as a function of elapsed time.
    pub fn state_at(&self, now: f64) -> VoiceState {
        if let Some(release) = self.release {
            if now >= release.stop_time {
                return VoiceState::Stopped;
            }
            if now >= release.at {
                return VoiceState::Releasing;
            }
        }
        if now < self.decay_end {
            VoiceState::Attacking
        } else {
            VoiceState::Sustaining
        }
    }

    /// Every node this voice owns, in signal order.
    pub fn node_ids(&self) -> [NodeId; 6] {
        [
            self.oscillators[0],
            self.oscillators[1],
            self.oscillators[2],
            self.filter,
            self.delay,
            self.gain,
        ]
    }
}
