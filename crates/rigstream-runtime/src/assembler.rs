//! Frame assembler
//!
//! Turns the latest frame of each stream into one `Pose` per cycle. Face
//! frames without tracking leave the face part of the pose untouched; hand
//! frames drive the identity tracker, the motion analyzer and the grab
//! controller; body frames are copied over.

use tracing::{debug, info};

use rigstream_core::{
    BodyPose, CircleState, FaceFrame, HandFrame, HandPose, JointFrame, MappingError, Pose, Quat,
    StreamTime, Vec3, EYELID_TARGET_COUNT,
};
use rigstream_map::{
    gaze_target, head_rotation_to_rig, ChannelMapper, GazeConfig, JawCalibration, ResponseCurve,
};
use rigstream_track::{
    CircleGestureSelector, GrabConfig, GrabController, GrabEvent, HandTracker, PointableSelector,
    SelectionStrategy,
};

use crate::RuntimeConfig;

#[derive(Clone, Debug, Default)]
pub struct AssemblerConfig {
    pub response_curve: ResponseCurve,
    pub jaw: JawCalibration,
    pub gaze: GazeConfig,
    pub strategy: SelectionStrategy,
    pub grab: GrabConfig,
}

impl From<&RuntimeConfig> for AssemblerConfig {
    fn from(config: &RuntimeConfig) -> Self {
        AssemblerConfig {
            response_curve: config.face.response_curve,
            jaw: config.face.jaw(),
            gaze: config.face.gaze(),
            strategy: config.hand.strategy(),
            grab: config.grab.to_grab_config(),
        }
    }
}

/// Frames handed to one cycle. `None` means nothing new on that stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct CycleInput<'a> {
    pub face: Option<&'a FaceFrame>,
    pub hand: Option<&'a HandFrame>,
    pub body: Option<&'a JointFrame>,
}

pub struct FrameAssembler {
    facial: ChannelMapper,
    eyelids: ChannelMapper,
    gaze: GazeConfig,
    tracker: HandTracker,
    grab: GrabController,
    pointables: PointableSelector,
    circles: CircleGestureSelector,
    pose: Pose,
    sequence: u64,
    last_grab_event: Option<GrabEvent>,
}

impl FrameAssembler {
    pub fn new(config: AssemblerConfig) -> Result<Self, MappingError> {
        let facial = ChannelMapper::facial()?
            .with_jaw(Some(config.jaw))
            .with_curve(config.response_curve);
        let eyelids = ChannelMapper::eyelids()?;
        let pose = Pose::rest(facial.width());

        Ok(FrameAssembler {
            facial,
            eyelids,
            gaze: config.gaze,
            tracker: HandTracker::new(config.strategy),
            grab: GrabController::new(config.grab),
            pointables: PointableSelector::new(config.strategy),
            circles: CircleGestureSelector::new(config.strategy),
            pose,
            sequence: 0,
            last_grab_event: None,
        })
    }

    /// Pose of the last completed cycle
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Grab transition produced by the last cycle
    pub fn last_grab_event(&self) -> Option<&GrabEvent> {
        self.last_grab_event.as_ref()
    }

    pub fn is_grabbing(&self) -> bool {
        self.grab.is_grabbing()
    }

    pub fn hand_tracker(&self) -> &HandTracker {
        &self.tracker
    }

    /// Run one cycle and return the resulting pose
    pub fn assemble(&mut self, input: CycleInput<'_>, now: StreamTime) -> Pose {
        self.last_grab_event = None;

        if let Some(face) = input.face {
            self.apply_face(face);
        }
        if let Some(hand) = input.hand {
            self.last_grab_event = self.apply_hand(hand, now);
        }
        if let Some(body) = input.body {
            self.apply_body(body);
        }

        self.sequence += 1;
        self.pose.sequence = self.sequence;
        self.pose.clone()
    }

    /// Update the face part of the pose. Returns false when the frame was
    /// ignored for lack of tracking.
    pub fn apply_face(&mut self, frame: &FaceFrame) -> bool {
        if !frame.tracking_ok {
            debug!("face tracking lost, holding previous pose");
            return false;
        }

        let facial = self.facial.map(frame.channels());
        self.pose.target_displacements = facial.targets;
        self.pose.jaw_yaw_degrees = facial.jaw_yaw_degrees;

        let eyelids = self.eyelids.map(frame.channels());
        let mut rotations = [Vec3::ZERO; EYELID_TARGET_COUNT];
        for (slot, rotation) in rotations.iter_mut().zip(eyelids.targets) {
            *slot = rotation;
        }
        self.pose.eyelid_rotations = rotations;

        if let Some(rotation) = frame.head_rotation {
            self.pose.head_rotation = Some(head_rotation_to_rig(rotation));
        }
        if let Some(translation) = frame.head_translation {
            self.pose.head_translation = Some(translation);
        }
        if let Some(gaze) = &frame.eye_gaze {
            let head = self.pose.head_rotation.unwrap_or(Quat::IDENTITY);
            self.pose.gaze_target = Some(gaze_target(head, gaze, &self.gaze));
        }
        self.pose.face_timestamp = frame.timestamp;
        true
    }

    /// Feed a hand frame. Frames that are not newer than the last one keep
    /// the previous hand pose.
    pub fn apply_hand(&mut self, frame: &HandFrame, now: StreamTime) -> Option<GrabEvent> {
        let observation = self.tracker.process(frame, now)?;
        let event = self
            .grab
            .update(&mut self.tracker, frame, &observation, now);
        if let Some(event) = &event {
            info!(?event, "grab state changed");
        }

        let Some(hand) = &observation.hand else {
            self.pose.hand = None;
            return event;
        };

        let analyzer = self.tracker.analyzer();
        let grab = self.grab.config();
        let pointer_tip = self.pointables.select(frame).map(|p| p.tip_position);
        let circle = self.circles.select(frame).map(|g| CircleState {
            gesture_id: g.id,
            progress: g.progress.unwrap_or(0.0),
            center: g.center,
            normal: g.normal,
        });

        self.pose.hand = Some(HandPose {
            hand_id: hand.id,
            side: hand.side,
            palm_position: hand.palm_position,
            smoothed_position: analyzer
                .speed_modulated_position()
                .unwrap_or(hand.palm_position),
            speed: analyzer.speed(),
            stable: analyzer.is_stable(grab.edit_on_secs, grab.stability_threshold),
            grabbing: self.grab.is_grabbing(),
            pointer_tip,
            circle,
        });
        event
    }

    pub fn apply_body(&mut self, frame: &JointFrame) {
        self.pose.body = Some(BodyPose {
            joints: frame.joints.clone(),
            label: frame.pose.clone(),
        });
    }
}
