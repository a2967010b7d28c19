//! Hand tracker and grab activation
//!
//! `HandTracker` feeds the selected hand into a `MotionAnalyzer`, starting a
//! fresh history whenever the selection changes. `GrabController` turns the
//! analyzer's signals into grab/release events without any keyboard input:
//! hold the hand still to grab, hold it still again (or yank it away, or do
//! a quick back-stroke) to release.

use tracing::{debug, info};

use rigstream_core::{EntityId, Hand, HandFrame, StreamTime, Vec3};

use crate::{HandSelector, MotionAnalyzer, SelectionStrategy};

/// Result of feeding one hand frame
#[derive(Clone, Debug, PartialEq)]
pub struct HandObservation {
    /// Selected hand, if any was in view
    pub hand: Option<Hand>,
    /// The selected hand differs from the previous cycle's
    pub hand_changed: bool,
}

/// Selected hand plus its motion history
#[derive(Debug, Default)]
pub struct HandTracker {
    selector: HandSelector,
    analyzer: MotionAnalyzer,
    last_hand_id: Option<EntityId>,
    last_frame_id: Option<i64>,
}

impl HandTracker {
    pub fn new(strategy: SelectionStrategy) -> Self {
        HandTracker {
            selector: HandSelector::new(strategy),
            ..Default::default()
        }
    }

    /// Process a frame observed at `now`.
    ///
    /// Returns `None` when the frame is skipped: it carries no frame id
    /// (protocol greeting) or its id is not newer than the last processed.
    pub fn process(&mut self, frame: &HandFrame, now: StreamTime) -> Option<HandObservation> {
        let frame_id = frame.frame_id?;
        if self.last_frame_id.is_some_and(|last| frame_id <= last) {
            return None;
        }
        self.last_frame_id = Some(frame_id);

        let hand = self.selector.select(frame).cloned();
        let mut hand_changed = false;
        if let Some(hand) = &hand {
            if Some(hand.id) != self.last_hand_id {
                debug!(hand = %hand.id, "tracking new hand");
                hand_changed = true;
                self.analyzer.reset();
            }
            self.analyzer.update(now, hand.palm_position);
        }
        self.last_hand_id = hand.as_ref().map(|h| h.id);

        Some(HandObservation { hand, hand_changed })
    }

    /// Hand selected in the last processed frame
    pub fn hand_id(&self) -> Option<EntityId> {
        self.last_hand_id
    }

    /// Forget the current hand; the next selection counts as a change
    pub fn reset_hand_id(&mut self) {
        self.last_hand_id = None;
    }

    pub fn last_frame_id(&self) -> Option<i64> {
        self.last_frame_id
    }

    pub fn analyzer(&self) -> &MotionAnalyzer {
        &self.analyzer
    }

    pub fn analyzer_mut(&mut self) -> &mut MotionAnalyzer {
        &mut self.analyzer
    }

    pub fn selector(&self) -> &HandSelector {
        &self.selector
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GrabMode {
    /// Grab and release by holding still
    #[default]
    Timed,
    /// Grab with a closed hand, release by opening it
    Finger,
}

/// Grab thresholds. Distances in mm, times in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct GrabConfig {
    pub mode: GrabMode,
    /// Hold time before grabbing
    pub edit_on_secs: f64,
    /// Hold time before releasing
    pub edit_off_secs: f64,
    /// Max root summed squared deviation over the hold window to count
    /// as still (see `MotionAnalyzer::is_still`)
    pub stability_threshold: f32,
    /// Finger mode grabs with at most this many fingers out
    pub max_fingers: usize,
    /// No re-grab within this distance of the last drop
    pub drop_radius: f32,
    pub fast_movement_speed: f32,
    pub fast_movement_lookback: f64,
    pub carriage_total_lookback: f64,
    pub carriage_change_lookback: f64,
    pub carriage_min_back_speed: f32,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            mode: GrabMode::Timed,
            edit_on_secs: 0.5,
            edit_off_secs: 1.0,
            stability_threshold: 10.0,
            max_fingers: 2,
            drop_radius: 50.0,
            fast_movement_speed: 1000.0,
            fast_movement_lookback: 0.1,
            carriage_total_lookback: 0.4,
            carriage_change_lookback: 0.2,
            carriage_min_back_speed: 100.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeactivationReason {
    Lost,
    Changed,
    FastMovement,
    CarriageReturn,
    Stable,
    FingersOpened,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GrabEvent {
    Activated {
        hand_id: EntityId,
        position: Vec3,
    },
    Deactivated {
        reason: DeactivationReason,
        /// Where the grabbed object should be put back, when the release
        /// gesture itself moved the hand
        restore_position: Option<Vec3>,
    },
}

/// Grab state machine
#[derive(Debug, Default)]
pub struct GrabController {
    config: GrabConfig,
    grab_start: Option<StreamTime>,
    last_drop: Option<Vec3>,
}

impl GrabController {
    pub fn new(config: GrabConfig) -> Self {
        GrabController {
            config,
            grab_start: None,
            last_drop: None,
        }
    }

    pub fn config(&self) -> &GrabConfig {
        &self.config
    }

    pub fn is_grabbing(&self) -> bool {
        self.grab_start.is_some()
    }

    /// Where the last grab was released
    pub fn last_drop(&self) -> Option<Vec3> {
        self.last_drop
    }

    pub fn clear_last_drop(&mut self) {
        self.last_drop = None;
    }

    /// Advance after `tracker` processed `frame`
    pub fn update(
        &mut self,
        tracker: &mut HandTracker,
        frame: &HandFrame,
        observation: &HandObservation,
        now: StreamTime,
    ) -> Option<GrabEvent> {
        match self.grab_start {
            Some(start) => self.check_release(tracker, frame, observation, now.secs_since(start)),
            None => self.check_grab(tracker, frame, observation, now),
        }
    }

    fn check_grab(
        &mut self,
        tracker: &HandTracker,
        frame: &HandFrame,
        observation: &HandObservation,
        now: StreamTime,
    ) -> Option<GrabEvent> {
        let config = &self.config;
        let Some(hand) = &observation.hand else {
            if config.mode == GrabMode::Timed && self.last_drop.take().is_some() {
                debug!("hand gone, clearing last drop position");
            }
            return None;
        };

        let grab = match config.mode {
            GrabMode::Timed => {
                let analyzer = tracker.analyzer();
                let away_from_drop = self
                    .last_drop
                    .map_or(true, |drop| hand.palm_position.distance(drop) > config.drop_radius);
                analyzer.hand_age() > config.edit_on_secs
                    && analyzer.is_still(config.edit_on_secs, config.stability_threshold)
                    && away_from_drop
            }
            GrabMode::Finger => {
                MotionAnalyzer::count_fingers(hand.id, frame) <= config.max_fingers
            }
        };
        if !grab {
            return None;
        }

        info!(hand = %hand.id, "grab activated");
        self.grab_start = Some(now);
        Some(GrabEvent::Activated {
            hand_id: hand.id,
            position: hand.palm_position,
        })
    }

    fn check_release(
        &mut self,
        tracker: &mut HandTracker,
        frame: &HandFrame,
        observation: &HandObservation,
        grabbed_for: f64,
    ) -> Option<GrabEvent> {
        let config = self.config.clone();
        let timed = config.mode == GrabMode::Timed;

        let Some(hand) = observation.hand.as_ref().filter(|_| !observation.hand_changed) else {
            let reason = if observation.hand.is_none() {
                DeactivationReason::Lost
            } else {
                DeactivationReason::Changed
            };
            return Some(self.release(tracker, reason, None, None));
        };

        let analyzer = tracker.analyzer();
        if timed
            && analyzer.hand_fast_movement(config.fast_movement_speed, config.fast_movement_lookback)
        {
            let restore = analyzer.stable_position();
            return Some(self.release(tracker, DeactivationReason::FastMovement, restore, None));
        }

        if timed
            && analyzer.change_of_direction(
                config.carriage_change_lookback,
                config.carriage_total_lookback,
                config.carriage_min_back_speed,
            )
        {
            return Some(self.release(tracker, DeactivationReason::CarriageReturn, None, None));
        }

        if timed
            && analyzer.is_still(config.edit_off_secs, config.stability_threshold)
            && grabbed_for > config.edit_off_secs
        {
            let drop = hand.palm_position;
            tracker.analyzer_mut().reset();
            return Some(self.release(tracker, DeactivationReason::Stable, None, Some(drop)));
        }

        if config.mode == GrabMode::Finger
            && MotionAnalyzer::count_fingers(hand.id, frame) > config.max_fingers
        {
            let drop = hand.palm_position;
            return Some(self.release(
                tracker,
                DeactivationReason::FingersOpened,
                None,
                Some(drop),
            ));
        }

        None
    }

    fn release(
        &mut self,
        tracker: &mut HandTracker,
        reason: DeactivationReason,
        restore_position: Option<Vec3>,
        drop: Option<Vec3>,
    ) -> GrabEvent {
        info!(?reason, "grab released");
        self.grab_start = None;
        self.last_drop = drop;
        tracker.reset_hand_id();
        GrabEvent::Deactivated {
            reason,
            restore_position,
        }
    }
}
