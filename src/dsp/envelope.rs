/*
Scheduled Gain Automation
=========================

Voice amplitude is not stepped by a per-sample state machine. Instead the
control side schedules a handful of timestamped automation events against
the audio clock, and the audio thread evaluates the resulting curve at the
exact frame of every sample. UI load or timer jitter on the control thread
therefore never shifts an envelope by even one sample.

Vocabulary
----------

  frame       Position on the audio clock, counted in samples since the
              output started. All event times are frames.

  event       A point the curve must pass through, plus how to get there
              from the previous point:

                SetValue         jump to `value` at `at`
                LinearRamp       straight line from the previous point,
                                 reaching `value` at `end`
                ExponentialRamp  constant-ratio curve from the previous point,
                                 reaching `value` at `end`

  hold        Before the first event the curve holds the default value;
              after the last event it holds the last event's value.


The Note Shape
--------------

  Level
  peak ┐   ╱‾‾‾‾‾‾──___
       │  ╱             ‾‾‾──── 0.7·peak ──┐
       │ ╱                                  ╲
       │╱                                    ╲_
     0 └───────────────────────────────────────‾‾──→ frame
       start  +20ms         +500ms      stop   stop+200ms
       │ linear │   exponential  │ hold  │ exponential release

A note-on schedules:

    SetValue(0, start)
    LinearRamp(peak, start + attack)
    ExponentialRamp(0.7·peak, start + decay)

A note-off cancels everything from the stop frame onward, pins the value the
curve has AT that frame (cancel-and-hold), then ramps exponentially toward a
near-silent floor. Releasing mid-attack therefore starts from the partial
level instead of jumping to the peak, which is what avoids the click.


The Math
--------

For a ramp from (t0, v0) to (t1, v1), with p = (t - t0) / (t1 - t0):

    linear:       v = v0 + (v1 - v0) · p
    exponential:  v = v0 · (v1 / v0)^p

An exponential ramp cannot start or end at zero (the ratio is undefined) and
cannot cross zero; such a ramp holds v0 until it ends, then jumps to v1.
*/

/// One scheduled automation event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Automation {
    SetValue { at: u64, value: f32 },
    LinearRamp { end: u64, value: f32 },
    ExponentialRamp { end: u64, value: f32 },
}

impl Automation {
    #[inline]
    pub fn time(&self) -> u64 {
        match *self {
            Automation::SetValue { at, .. } => at,
            Automation::LinearRamp { end, .. } | Automation::ExponentialRamp { end, .. } => end,
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        match *self {
            Automation::SetValue { value, .. }
            | Automation::LinearRamp { value, .. }
            | Automation::ExponentialRamp { value, .. } => value,
        }
    }
}

// note-on uses 3 events, note-off replaces the tail with 2
const EVENT_CAPACITY: usize = 8;

#[derive(Debug, Clone)]
pub struct GainEnvelope {
    events: Vec<Automation>, // sorted by time
    default_value: f32,
}

impl GainEnvelope {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(EVENT_CAPACITY),
            default_value: 0.0,
        }
    }

    /// Drop every event and hold `value`.
    pub fn reset(&mut self, value: f32) {
        self.events.clear();
        self.default_value = value;
    }

    pub fn set_value_at(&mut self, value: f32, at: u64) {
        self.insert(Automation::SetValue { at, value });
    }

    pub fn linear_ramp_to(&mut self, value: f32, end: u64) {
        self.insert(Automation::LinearRamp { end, value });
    }

    pub fn exponential_ramp_to(&mut self, value: f32, end: u64) {
        self.insert(Automation::ExponentialRamp { end, value });
    }

    /// Freeze the curve at `at`: later events are discarded and the value the
    /// curve has at `at` is pinned there.
    pub fn cancel_and_hold(&mut self, at: u64) {
        let held = self.value_at(at);
        let keep = self.events.partition_point(|e| e.time() < at);
        self.events.truncate(keep);
        self.events.push(Automation::SetValue { at, value: held });
    }

    fn insert(&mut self, event: Automation) {
        debug_assert!(self.events.len() < EVENT_CAPACITY);
        // events sharing a timestamp keep call order
        let idx = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(idx, event);
    }

    /// Evaluate the curve at `frame`.
    pub fn value_at(&self, frame: u64) -> f32 {
        let next_idx = self.events.partition_point(|e| e.time() <= frame);

        let (t0, v0) = match next_idx.checked_sub(1) {
            Some(prev) => (self.events[prev].time(), self.events[prev].value()),
            None => (0, self.default_value),
        };

        match self.events.get(next_idx) {
            Some(&Automation::LinearRamp { end, value }) => {
                let p = progress(t0, end, frame);
                v0 + (value - v0) * p
            }
            Some(&Automation::ExponentialRamp { end, value }) => {
                if v0 == 0.0 || value == 0.0 || v0.signum() != value.signum() {
                    v0
                } else {
                    let p = progress(t0, end, frame);
                    v0 * (value / v0).powf(p)
                }
            }
            _ => v0,
        }
    }

    /// Multiply `buffer` by the curve, the first sample sitting at `start`.
    pub fn apply(&self, buffer: &mut [f32], start: u64) {
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample *= self.value_at(start + i as u64);
        }
    }

    /// Write the curve itself into `buffer`.
    pub fn render(&self, buffer: &mut [f32], start: u64) {
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample = self.value_at(start + i as u64);
        }
    }

    /// Frame of the last scheduled event, after which the curve is constant.
    pub fn settles_at(&self) -> Option<u64> {
        self.events.last().map(Automation::time)
    }
}

impl Default for GainEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn progress(t0: u64, t1: u64, t: u64) -> f32 {
    if t1 <= t0 {
        1.0
    } else {
        ((t - t0) as f64 / (t1 - t0) as f64) as f32
    }
}
