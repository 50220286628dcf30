/*
Parameter Automation Timelines
==============================

Every schedulable parameter (gain, oscillator frequency/detune, filter
cutoff, delay time) carries a timeline of time-stamped events:

  Set   { time, value }    jump to `value` at `time`
  Ramp  { time, value }    ramp linearly from the previous event to `value`,
                           arriving exactly at `time`

Evaluating the parameter at time t walks the events in order:

    value
      v2 ┤           ● Ramp(t2, v2)
         │        ╱
      v1 ┤  ●───╱           a Set holds flat until the next event;
         │  Set(t1, v1)     a Ramp draws the connecting line
      v0 ┼──┘
         └──┴─────┴──────→ time
            t1    t2

Rules:

  - Before the first event the parameter sits at its initial value.
  - A Ramp whose time is not after the previous event's time collapses to an
    instantaneous jump (this is how an attack of zero seconds behaves).
  - Scheduling a Set at time t cancels every event strictly after t
    (cancel-and-hold). This is what makes a release click-free: the
    scheduler reads the current value mid-attack, anchors it with a Set, and
    the not-yet-executed attack/decay ramps vanish instead of fighting the
    release ramp.
*/

#[derive(Debug, Clone, Copy, PartialEq)]
enum EventKind {
    Set,
    Ramp,
}

#[derive(Debug, Clone, Copy)]
struct AutomationEvent {
    time: f64,
    value: f32,
    kind: EventKind,
}

/// One parameter's scheduled history and future.
#[derive(Debug, Clone)]
pub struct ParamTimeline {
    initial: f32,
    events: Vec<AutomationEvent>,
}

impl ParamTimeline {
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            events: Vec::new(),
        }
    }

    fn insert(&mut self, event: AutomationEvent) {
        // Events are kept sorted by time; equal times preserve push order
        let pos = self
            .events
            .partition_point(|e| e.time <= event.time);
        self.events.insert(pos, event);
    }

    /// Jump to `value` at `time`, cancelling everything scheduled after it.
    pub fn set_at(&mut self, value: f32, time: f64) {
        self.events.retain(|e| e.time <= time);
        self.insert(AutomationEvent {
            time,
            value,
            kind: EventKind::Set,
        });
    }

    /// Ramp linearly from the previous event to `value`, arriving at `time`.
    pub fn ramp_to(&mut self, value: f32, time: f64) {
        self.insert(AutomationEvent {
            time,
            value,
            kind: EventKind::Ramp,
        });
    }

    /// The parameter's value at time `t`.
    pub fn value_at(&self, t: f64) -> f32 {
        let mut prev_time = f64::NEG_INFINITY;
        let mut prev_value = self.initial;

        for event in &self.events {
            if event.time <= t {
                prev_time = event.time;
                prev_value = event.value;
                continue;
            }

            // First event past t decides the interpolation
            return match event.kind {
                EventKind::Set => prev_value,
                EventKind::Ramp => {
                    if event.time <= prev_time || prev_time == f64::NEG_INFINITY {
                        prev_value
                    } else {
                        let frac = ((t - prev_time) / (event.time - prev_time)) as f32;
                        prev_value + (event.value - prev_value) * frac
                    }
                }
            };
        }

        prev_value
    }

    /// True once every scheduled event lies at or before `t`.
    pub fn settled_by(&self, t: f64) -> bool {
        self.events.last().map_or(true, |e| e.time <= t)
    }

    #[cfg(test)]
    fn event_count(&self) -> usize {
        self.events.len()
    }
}
