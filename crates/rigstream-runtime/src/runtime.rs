//! Runtime - sources, assembler and the per-tick cycle

use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use rigstream_core::{FaceFrame, HandFrame, Pose, RigResult, StreamClock, TransportError};
use rigstream_track::GrabEvent;
use rigstream_transport::{
    spawn_receiver, BodyTrackerClient, ReceiverConfig, ReceiverHandle, ReceiverStatus, UdpTransport,
    WebSocketTransport,
};
use rigstream_wire::{HandMessageDecoder, TrackingStateDecoder, UserPosition};

use crate::{
    CycleInput, FaceSourceConfig, FrameAssembler, HandSourceConfig, HandTransportKind,
    ReceiverLease, RuntimeConfig, Scheduler, SharedReceiver,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Face,
    Hand,
    Body,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Face => "face",
            SourceKind::Hand => "hand",
            SourceKind::Body => "body",
        };
        f.write_str(name)
    }
}

/// A receiver that ended on a transport error
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: SourceKind,
    pub error: TransportError,
}

#[derive(Clone, Debug, Default)]
pub struct RuntimeStats {
    pub ticks: u64,
    pub face_frames: u64,
    /// Face frames ignored because tracking was lost
    pub face_frames_untracked: u64,
    pub hand_frames: u64,
    pub body_frames: u64,
    pub grab_events: u64,
    pub failures: u64,
    pub last_tick_duration: Duration,
}

/// Outcome of one tick
#[derive(Clone, Debug)]
pub struct TickReport {
    pub pose: Pose,
    /// Receivers that failed since the previous tick
    pub failures: Vec<SourceFailure>,
    pub grab_event: Option<GrabEvent>,
}

/// Tracks what a consumer has already seen of one receiver
#[derive(Debug, Default)]
struct Cursor {
    seen: u64,
    failure_reported: bool,
}

impl Cursor {
    fn take_new<T>(&mut self, handle: &ReceiverHandle<T>) -> Option<Arc<T>> {
        let (sequence, frame) = handle.slot().newer_than(self.seen)?;
        self.seen = sequence;
        Some(frame)
    }

    /// The receiver's failure, reported once
    fn take_failure<T>(&mut self, handle: &ReceiverHandle<T>) -> Option<TransportError> {
        if self.failure_reported {
            return None;
        }
        match handle.status() {
            ReceiverStatus::Failed(error) => {
                self.failure_reported = true;
                Some(error)
            }
            _ => None,
        }
    }
}

struct LeasedStream<T> {
    lease: ReceiverLease<T>,
    cursor: Cursor,
}

impl<T> LeasedStream<T> {
    fn new(lease: ReceiverLease<T>) -> Self {
        LeasedStream {
            lease,
            cursor: Cursor::default(),
        }
    }
}

struct BodyStream {
    client: Arc<BodyTrackerClient>,
    cursor: Cursor,
    discovery: JoinHandle<()>,
}

/// Running pipeline
pub struct Runtime {
    config: RuntimeConfig,
    assembler: FrameAssembler,
    clock: StreamClock,
    face_source: Arc<SharedReceiver<FaceFrame>>,
    hand_source: Arc<SharedReceiver<HandFrame>>,
    face: Option<LeasedStream<FaceFrame>>,
    hand: Option<LeasedStream<HandFrame>>,
    body: Option<BodyStream>,
    cancel: CancellationToken,
    stats: RuntimeStats,
    stopped: bool,
}

impl Runtime {
    /// Start every enabled source
    pub async fn start(config: RuntimeConfig) -> RigResult<Self> {
        config.validate()?;
        let assembler = FrameAssembler::new((&config).into())?;
        let cancel = CancellationToken::new();

        let face_source = Arc::new(SharedReceiver::new());
        let face = if config.face.enabled {
            let decoder = config.face.decoder()?;
            let lease = face_source
                .acquire(|| start_face(&config.face, decoder))
                .await?;
            Some(LeasedStream::new(lease))
        } else {
            None
        };

        let hand_source = Arc::new(SharedReceiver::new());
        let hand = if config.hand.enabled {
            let lease = hand_source
                .acquire(|| start_hand(&config.hand))
                .await?;
            Some(LeasedStream::new(lease))
        } else {
            None
        };

        let body = if config.body.enabled {
            let client = Arc::new(BodyTrackerClient::start(&config.body.tracker_config()).await?);
            let discovery = spawn_discovery(
                Arc::clone(&client),
                config.body.user_position()?,
                config.body.discovery_interval,
                cancel.child_token(),
            );
            Some(BodyStream {
                client,
                cursor: Cursor::default(),
                discovery,
            })
        } else {
            None
        };

        info!(
            face = face.is_some(),
            hand = hand.is_some(),
            body = body.is_some(),
            tick = ?config.tick_interval,
            "runtime started"
        );

        Ok(Runtime {
            config,
            assembler,
            clock: StreamClock::new(),
            face_source,
            hand_source,
            face,
            hand,
            body,
            cancel,
            stats: RuntimeStats::default(),
            stopped: false,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    pub fn assembler(&self) -> &FrameAssembler {
        &self.assembler
    }

    /// Shared face receiver, for consumers that want their own lease
    pub fn face_source(&self) -> &Arc<SharedReceiver<FaceFrame>> {
        &self.face_source
    }

    pub fn hand_source(&self) -> &Arc<SharedReceiver<HandFrame>> {
        &self.hand_source
    }

    /// Another lease on the running face receiver
    pub fn face_lease(&self) -> Option<ReceiverLease<FaceFrame>> {
        self.face.as_ref().map(|s| s.lease.clone())
    }

    pub fn hand_lease(&self) -> Option<ReceiverLease<HandFrame>> {
        self.hand.as_ref().map(|s| s.lease.clone())
    }

    /// Body tracker server, once discovered
    pub fn body_server(&self) -> Option<std::net::SocketAddr> {
        self.body.as_ref().and_then(|b| b.client.server_addr())
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Run one cycle
    pub fn tick(&mut self) -> TickReport {
        let start = Instant::now();
        self.stats.ticks += 1;
        let now = self.clock.now();

        // Stage 1: Collect receiver failures
        let failures = self.collect_failures();

        // Stage 2: Take the newest frame of each stream
        let face = self
            .face
            .as_mut()
            .and_then(|s| s.cursor.take_new(&*s.lease));
        let hand = self
            .hand
            .as_mut()
            .and_then(|s| s.cursor.take_new(&*s.lease));
        let body = self
            .body
            .as_mut()
            .and_then(|s| s.cursor.take_new(s.client.receiver()));

        if let Some(face) = &face {
            self.stats.face_frames += 1;
            if !face.tracking_ok {
                self.stats.face_frames_untracked += 1;
            }
        }
        self.stats.hand_frames += u64::from(hand.is_some());
        self.stats.body_frames += u64::from(body.is_some());

        // Stage 3: Assemble the pose
        let input = CycleInput {
            face: face.as_deref(),
            hand: hand.as_deref(),
            body: body.as_deref(),
        };
        let pose = self.assembler.assemble(input, now);
        let grab_event = self.assembler.last_grab_event().cloned();
        self.stats.grab_events += u64::from(grab_event.is_some());

        self.stats.last_tick_duration = start.elapsed();
        TickReport {
            pose,
            failures,
            grab_event,
        }
    }

    fn collect_failures(&mut self) -> Vec<SourceFailure> {
        let mut failures = Vec::new();
        if let Some(s) = self.face.as_mut() {
            if let Some(error) = s.cursor.take_failure(&*s.lease) {
                failures.push(SourceFailure {
                    source: SourceKind::Face,
                    error,
                });
            }
        }
        if let Some(s) = self.hand.as_mut() {
            if let Some(error) = s.cursor.take_failure(&*s.lease) {
                failures.push(SourceFailure {
                    source: SourceKind::Hand,
                    error,
                });
            }
        }
        if let Some(s) = self.body.as_mut() {
            if let Some(error) = s.cursor.take_failure(s.client.receiver()) {
                failures.push(SourceFailure {
                    source: SourceKind::Body,
                    error,
                });
            }
        }
        for failure in &failures {
            warn!(source = %failure.source, error = %failure.error, "source failed");
        }
        self.stats.failures += failures.len() as u64;
        failures
    }

    /// Tick on `scheduler` until it is cancelled or `on_tick` breaks
    pub async fn run<F>(&mut self, scheduler: &Scheduler, mut on_tick: F) -> u64
    where
        F: FnMut(&TickReport) -> ControlFlow<()>,
    {
        scheduler
            .run(|_| {
                let report = self.tick();
                on_tick(&report)
            })
            .await
    }

    /// Release every source. Calling it again is a no-op.
    pub async fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.cancel.cancel();

        if let Some(face) = self.face.take() {
            face.lease.release().await;
        }
        if let Some(hand) = self.hand.take() {
            hand.lease.release().await;
        }
        if let Some(body) = self.body.take() {
            body.discovery.abort();
            match Arc::try_unwrap(body.client) {
                Ok(client) => client.shutdown().await,
                Err(client) => client.stop(),
            }
        }
        info!(ticks = self.stats.ticks, "runtime stopped");
    }
}

async fn start_face(
    face: &FaceSourceConfig,
    decoder: TrackingStateDecoder,
) -> Result<ReceiverHandle<FaceFrame>, TransportError> {
    let transport = UdpTransport::open(&face.udp_config()).await?;
    Ok(spawn_receiver(
        transport,
        decoder,
        ReceiverConfig::new("face").with_timeout(face.recv_timeout),
    ))
}

async fn start_hand(hand: &HandSourceConfig) -> Result<ReceiverHandle<HandFrame>, TransportError> {
    let receiver_config = ReceiverConfig::new("hand").with_timeout(hand.recv_timeout);
    let handle = match hand.transport {
        HandTransportKind::Udp => {
            let transport = UdpTransport::open(&hand.udp_config()).await?;
            spawn_receiver(transport, HandMessageDecoder, receiver_config)
        }
        HandTransportKind::Websocket => {
            let transport = WebSocketTransport::connect(&hand.websocket_config()).await?;
            spawn_receiver(transport, HandMessageDecoder, receiver_config)
        }
    };
    Ok(handle)
}

/// Broadcast discovery until the server answers, then subscribe
fn spawn_discovery(
    client: Arc<BodyTrackerClient>,
    position: UserPosition,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if client.is_discovered() {
                match client.request_user(position).await {
                    Ok(()) => info!(position = position.as_str(), "body user requested"),
                    Err(e) => warn!(error = %e, "body user request failed"),
                }
                return;
            }
            if let Err(e) = client.discover().await {
                warn!(error = %e, "body discovery broadcast failed");
            }
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("body discovery cancelled");
                    return;
                }
                _ = tokio::time::sleep(every) => {}
            }
        }
    })
}
