//! Motion analysis for one tracked entity
//!
//! Positions are kept newest first in a buffer bounded by age, not count.
//! Every query is a pure function of the buffer plus the adaptive lookback
//! counter, which shrinks as soon as the entity moves fast and grows back by
//! one slot per update while it is still.

use std::collections::VecDeque;

use rigstream_core::{EntityId, HandFrame, StreamTime, Vec3};

/// Samples older than this (relative to the newest) are dropped
pub const BUFFER_MAX_AGE_SECS: f64 = 2.0;

/// Speeds above this (mm/s) mean the hand was pulled out of view
pub const HAND_MAX_SPEED: f32 = 1000.0;

/// Floor for the adaptive lookback window
pub const MIN_LOOKBACK_SECS: f64 = 0.02;

/// Sample pairs used for the hand-removed check
const REMOVAL_SPEED_PAIRS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionSample {
    pub time: StreamTime,
    pub position: Vec3,
}

/// Running mean and squared deviation (Welford)
#[derive(Clone, Copy, Debug, Default)]
struct Welford {
    n: u32,
    mean: Vec3,
    m2: Vec3,
}

impl Welford {
    fn push(&mut self, x: Vec3) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f32;
        self.m2 += delta.mul_elem(x - self.mean);
    }

    fn mean(&self) -> Option<Vec3> {
        (self.n > 0).then_some(self.mean)
    }

    /// Population standard deviation per component
    fn deviation(&self) -> Option<Vec3> {
        (self.n > 0).then(|| (self.m2 / self.n as f32).map(|v| v.max(0.0).sqrt()))
    }

    /// Root of the summed squared deviations per component
    fn spread(&self) -> Option<Vec3> {
        (self.n > 0).then(|| self.m2.map(|v| v.max(0.0).sqrt()))
    }
}

#[derive(Clone, Debug, Default)]
pub struct MotionAnalyzer {
    /// Newest first
    samples: VecDeque<MotionSample>,
    lookback: usize,
    speed: f32,
    hand_removed: bool,
}

impl MotionAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; the next update starts a fresh history
    pub fn reset(&mut self) {
        self.samples.clear();
        self.lookback = 0;
        self.speed = 0.0;
        self.hand_removed = false;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples, newest first
    pub fn samples(&self) -> impl Iterator<Item = &MotionSample> + '_ {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&MotionSample> {
        self.samples.front()
    }

    /// Current adaptive lookback, in slots
    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Speed over the lookback window at the last update
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// The short-window speed exceeded `HAND_MAX_SPEED` at the last update
    pub fn hand_removed(&self) -> bool {
        self.hand_removed
    }

    /// Record a position observed at `time`
    pub fn update(&mut self, time: StreamTime, position: Vec3) {
        self.samples.push_front(MotionSample { time, position });

        while let Some(oldest) = self.samples.back() {
            if time.secs_since(oldest.time) > BUFFER_MAX_AGE_SECS {
                self.samples.pop_back();
            } else {
                break;
            }
        }

        self.lookback = (self.lookback + 1).min(self.samples.len());
        let pairs = self.lookback.saturating_sub(1);

        self.speed = self.average_speed_slots(pairs).length();
        let recent = self.average_speed_slots(pairs.min(REMOVAL_SPEED_PAIRS));
        self.hand_removed = recent.length() > HAND_MAX_SPEED;

        let speed_ratio = (self.speed as f64 + 1.0).ln() / (HAND_MAX_SPEED as f64).ln();
        let lookback_time = (BUFFER_MAX_AGE_SECS * (1.0 - speed_ratio)).max(MIN_LOOKBACK_SECS);
        self.lookback = self.lookback.min(self.slots_within(lookback_time));
    }

    /// Number of newest samples no older than `time_range` seconds from the
    /// newest one
    pub fn slots_within(&self, time_range: f64) -> usize {
        let Some(newest) = self.samples.front() else {
            return 0;
        };
        self.samples
            .iter()
            .take_while(|s| newest.time.secs_since(s.time) <= time_range)
            .count()
    }

    /// Seconds covered by the buffer, 0 with fewer than two samples
    pub fn hand_age(&self) -> f64 {
        match (self.samples.front(), self.samples.back()) {
            (Some(newest), Some(oldest)) if self.samples.len() >= 2 => {
                newest.time.secs_since(oldest.time)
            }
            _ => 0.0,
        }
    }

    /// Position deviation over the last `time_window` seconds is below
    /// `threshold`. An empty buffer is never stable.
    pub fn is_stable(&self, time_window: f64, threshold: f32) -> bool {
        let slots = self.slots_within(time_window);
        match self.welford_slots(0, slots).deviation() {
            Some(deviation) => deviation.length() < threshold,
            None => false,
        }
    }

    /// Like `is_stable`, but compares the root of the summed squared
    /// deviations, which grows with the number of samples in the window.
    /// Thresholds for this check are calibrated for a ~50 Hz hand stream.
    pub fn is_still(&self, time_window: f64, threshold: f32) -> bool {
        let slots = self.slots_within(time_window);
        match self.welford_slots(0, slots).spread() {
            Some(spread) => spread.length() < threshold,
            None => false,
        }
    }

    /// Mean and population standard deviation over slots `[from, to)`
    pub fn average_and_deviation(&self, from: usize, to: usize) -> Option<(Vec3, Vec3)> {
        let acc = self.welford_slots(from, to);
        Some((acc.mean()?, acc.deviation()?))
    }

    fn welford_slots(&self, from: usize, to: usize) -> Welford {
        let to = to.min(self.samples.len());
        let mut acc = Welford::default();
        for sample in self.samples.range(from.min(to)..to) {
            acc.push(sample.position);
        }
        acc
    }

    /// Velocity averaged over the `pairs` most recent adjacent sample pairs
    pub fn average_speed_slots(&self, pairs: usize) -> Vec3 {
        let pairs = pairs.min(self.samples.len().saturating_sub(1));
        let mut acc = Welford::default();
        for i in 0..pairs {
            if let Some(v) = self.pair_velocity(i) {
                acc.push(v);
            }
        }
        acc.mean().unwrap_or(Vec3::ZERO)
    }

    /// Velocity averaged over pairs whose older sample lies within
    /// `window_secs` of the newest sample
    pub fn average_speed(&self, window_secs: f64) -> Vec3 {
        let Some(newest) = self.samples.front() else {
            return Vec3::ZERO;
        };
        let mut acc = Welford::default();
        for i in 0..self.samples.len().saturating_sub(1) {
            if newest.time.secs_since(self.samples[i + 1].time) > window_secs {
                break;
            }
            if let Some(v) = self.pair_velocity(i) {
                acc.push(v);
            }
        }
        acc.mean().unwrap_or(Vec3::ZERO)
    }

    /// Velocity between the two newest samples
    pub fn latest_speed(&self) -> Vec3 {
        self.pair_velocity(0).unwrap_or(Vec3::ZERO)
    }

    /// Velocity between slot `i` and the older slot `i + 1`. Pairs with a
    /// non-positive time step carry no velocity.
    fn pair_velocity(&self, i: usize) -> Option<Vec3> {
        let newer = self.samples.get(i)?;
        let older = self.samples.get(i + 1)?;
        let dt = newer.time.secs_since(older.time);
        (dt > 0.0).then(|| (newer.position - older.position) / dt as f32)
    }

    pub fn hand_fast_movement(&self, min_speed: f32, lookback_time: f64) -> bool {
        let slots = self.slots_within(lookback_time);
        self.average_speed_slots(slots).length() > min_speed
    }

    /// Mean position over the whole buffer
    pub fn position_average(&self) -> Option<Vec3> {
        self.welford_slots(0, self.samples.len()).mean()
    }

    /// Mean position of samples aged between `from_secs` and `to_secs`
    /// relative to the newest one
    pub fn position_average_in_range(&self, from_secs: f64, to_secs: f64) -> Option<Vec3> {
        let newest = self.samples.front()?;
        let mut acc = Welford::default();
        for sample in &self.samples {
            let age = newest.time.secs_since(sample.time);
            if age < from_secs {
                continue;
            }
            if age > to_secs {
                break;
            }
            acc.push(sample.position);
        }
        acc.mean()
    }

    pub fn position_average_in_slots(&self, from: usize, to: usize) -> Option<Vec3> {
        self.welford_slots(from, to).mean()
    }

    /// Mean over the adaptive lookback window
    pub fn speed_modulated_position(&self) -> Option<Vec3> {
        self.position_average_in_slots(0, self.lookback)
    }

    /// Mean over the part of the buffer older than the lookback window,
    /// i.e. where the entity was before it last started moving
    pub fn stable_position(&self) -> Option<Vec3> {
        self.position_average_in_slots(self.lookback, self.samples.len())
    }

    /// Movement over the older window points against movement over the
    /// newer one.
    ///
    /// ```text
    /// t(movement) ---------> t(change) ---------> now
    /// ```
    pub fn sudden_change(&self, change_lookback: f64, movement_lookback: f64) -> bool {
        if self.samples.len() < 2 {
            return false;
        }
        let start_slot = self.slots_within(movement_lookback).max(1);
        let change_slot = self.slots_within(change_lookback).max(1);

        let now = self.samples[0].position;
        let start = self.samples[start_slot - 1].position;
        let change = self.samples[change_slot - 1].position;

        let movement = change - start;
        let reversal = now - change;
        movement.dot(reversal) < 0.0
    }

    /// Sudden reversal performed fast enough (carriage return)
    pub fn change_of_direction(
        &self,
        change_lookback: f64,
        movement_lookback: f64,
        min_back_speed: f32,
    ) -> bool {
        let slots = self.slots_within(change_lookback);
        let speed = self.average_speed_slots(slots).length();
        speed > min_back_speed && self.sudden_change(change_lookback, movement_lookback)
    }

    /// Extended fingers (non-tool pointables) attached to `hand`
    pub fn count_fingers(hand: EntityId, frame: &HandFrame) -> usize {
        frame.pointables_of(hand).filter(|p| !p.tool).count()
    }
}
