//! End-to-end pipeline harness
//!
//! Drives raw tracker payloads through decoding and frame assembly without
//! sockets, using the frame timestamps as the clock. Scenario helpers run a
//! simulated hand for a number of frames and collect the grab transitions.

use rigstream_core::{DecodeError, Pose, RigResult, StreamTime, Vec3};
use rigstream_runtime::{AssemblerConfig, CycleInput, FrameAssembler};
use rigstream_track::{DeactivationReason, GrabEvent, SelectionStrategy};
use rigstream_wire::{HandMessageDecoder, TrackingStateDecoder};

use crate::hand_sim::{HandSimConfig, HandSimulator};
use crate::trajectory::{NoisyTrajectory, Trajectory};

/// Decoders plus assembler, fed one payload at a time
pub struct PipelineHarness {
    face: TrackingStateDecoder,
    hand: HandMessageDecoder,
    assembler: FrameAssembler,
    events: Vec<(u64, GrabEvent)>,
}

impl PipelineHarness {
    pub fn new(config: AssemblerConfig) -> RigResult<Self> {
        Ok(PipelineHarness {
            face: TrackingStateDecoder::default(),
            hand: HandMessageDecoder,
            assembler: FrameAssembler::new(config)?,
            events: Vec::new(),
        })
    }

    pub fn with_strategy(strategy: SelectionStrategy) -> RigResult<Self> {
        Self::new(AssemblerConfig {
            strategy,
            ..Default::default()
        })
    }

    pub fn assembler(&self) -> &FrameAssembler {
        &self.assembler
    }

    /// Grab transitions so far, tagged with the cycle that produced them
    pub fn events(&self) -> &[(u64, GrabEvent)] {
        &self.events
    }

    /// Decode one tracking-state datagram and run a cycle with it
    pub fn face_message(&mut self, payload: &[u8]) -> Result<Pose, DecodeError> {
        let frame = self.face.decode(payload)?;
        let now = StreamTime::from_secs_f64(frame.timestamp.unwrap_or(0.0));
        Ok(self.assembler.assemble(
            CycleInput {
                face: Some(&frame),
                ..Default::default()
            },
            now,
        ))
    }

    /// Decode one hand tracker message and run a cycle with it
    pub fn hand_message(&mut self, text: &str) -> Result<Pose, DecodeError> {
        let frame = self.hand.decode_str(text)?;
        let now = StreamTime::from_micros(frame.timestamp.unwrap_or(0));
        let pose = self.assembler.assemble(
            CycleInput {
                hand: Some(&frame),
                ..Default::default()
            },
            now,
        );
        if let Some(event) = self.assembler.last_grab_event() {
            self.events.push((pose.sequence, event.clone()));
        }
        Ok(pose)
    }
}

/// One simulated hand run
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub trajectory: Trajectory,
    /// Half-width of the uniform position noise, mm
    pub noise_mm: f32,
    pub frames: usize,
    pub hand: HandSimConfig,
}

impl ScenarioConfig {
    /// Hand held still in front of the sensor for three seconds
    pub fn still_hand() -> Self {
        Self {
            trajectory: Trajectory::Still {
                at: Vec3::new(0.0, 200.0, 0.0),
            },
            noise_mm: 0.5,
            frames: 150,
            hand: HandSimConfig::default(),
        }
    }

    /// Hand sliding sideways at 100 mm/s
    pub fn drifting_hand() -> Self {
        Self {
            trajectory: Trajectory::Linear {
                from: Vec3::new(-150.0, 200.0, 0.0),
                velocity: Vec3::new(100.0, 0.0, 0.0),
            },
            noise_mm: 0.5,
            frames: 100,
            hand: HandSimConfig::default(),
        }
    }

    pub fn with_noise(mut self, noise_mm: f32) -> Self {
        self.noise_mm = noise_mm;
        self
    }
}

#[derive(Clone, Debug)]
pub struct ScenarioResult {
    pub frames: usize,
    pub events: Vec<(u64, GrabEvent)>,
    pub final_pose: Pose,
}

impl ScenarioResult {
    pub fn activations(&self) -> usize {
        self.events
            .iter()
            .filter(|(_, e)| matches!(e, GrabEvent::Activated { .. }))
            .count()
    }

    pub fn release_reasons(&self) -> Vec<DeactivationReason> {
        self.events
            .iter()
            .filter_map(|(_, e)| match e {
                GrabEvent::Deactivated { reason, .. } => Some(*reason),
                GrabEvent::Activated { .. } => None,
            })
            .collect()
    }

    /// Cycle of the first activation
    pub fn first_activation(&self) -> Option<u64> {
        self.events
            .iter()
            .find(|(_, e)| matches!(e, GrabEvent::Activated { .. }))
            .map(|(seq, _)| *seq)
    }
}

/// Run a hand scenario through a fresh pipeline
pub fn run_hand_scenario(config: &ScenarioConfig) -> RigResult<ScenarioResult> {
    let mut harness = PipelineHarness::new(AssemblerConfig::default())?;
    let path = NoisyTrajectory::new(config.trajectory.clone(), config.noise_mm, config.hand.seed);
    let mut sim = HandSimulator::new(path, config.hand.clone());

    let mut final_pose = harness.assembler().pose().clone();
    for _ in 0..config.frames {
        final_pose = harness.hand_message(&sim.next_message())?;
    }
    Ok(ScenarioResult {
        frames: config.frames,
        events: harness.events().to_vec(),
        final_pose,
    })
}
