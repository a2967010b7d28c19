//! Receiver task
//!
//! One task per stream source. It pulls payloads with a bounded timeout,
//! decodes them and publishes the newest frame into a `LatestSlot`. Bad
//! messages are counted and dropped; only a transport failure ends the task,
//! and that failure stays visible on the handle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use rigstream_core::{DecodeError, FaceFrame, HandFrame, TransportError};
use rigstream_wire::{HandMessageDecoder, TrackingStateDecoder};

use crate::{Datagram, LatestSlot, PacketSource};

/// Default bound on a single blocking receive
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// Turns payloads into frames. May keep state across messages.
pub trait FrameDecoder: Send + 'static {
    type Frame: Send + Sync + 'static;

    /// `Ok(None)` means the message was valid but produced no frame.
    fn decode(&mut self, datagram: &Datagram) -> Result<Option<Self::Frame>, DecodeError>;
}

impl FrameDecoder for TrackingStateDecoder {
    type Frame = FaceFrame;

    fn decode(&mut self, datagram: &Datagram) -> Result<Option<FaceFrame>, DecodeError> {
        TrackingStateDecoder::decode(self, &datagram.payload).map(Some)
    }
}

impl FrameDecoder for HandMessageDecoder {
    type Frame = HandFrame;

    fn decode(&mut self, datagram: &Datagram) -> Result<Option<HandFrame>, DecodeError> {
        HandMessageDecoder::decode(self, &datagram.payload).map(Some)
    }
}

/// Lifecycle of a receiver
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiverStatus {
    Running,
    /// Stopped on request
    Stopped,
    /// Ended by a transport failure
    Failed(TransportError),
}

#[derive(Clone, Debug)]
pub struct ReceiverConfig {
    /// Label used in logs
    pub name: String,
    pub recv_timeout: Duration,
}

impl ReceiverConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            recv_timeout: DEFAULT_RECV_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }
}

/// Snapshot of receiver counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReceiverCounters {
    pub received: u64,
    pub decoded: u64,
    pub dropped: u64,
    pub timeouts: u64,
}

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    decoded: AtomicU64,
    dropped: AtomicU64,
    timeouts: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> ReceiverCounters {
        ReceiverCounters {
            received: self.received.load(Ordering::Relaxed),
            decoded: self.decoded.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug)]
struct Shared {
    status: Mutex<ReceiverStatus>,
    counters: Counters,
}

/// Owning handle of a running receiver. Dropping it stops the task.
pub struct ReceiverHandle<T> {
    name: String,
    slot: Arc<LatestSlot<T>>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T> ReceiverHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot(&self) -> &Arc<LatestSlot<T>> {
        &self.slot
    }

    pub fn latest(&self) -> Option<Arc<T>> {
        self.slot.latest()
    }

    pub fn status(&self) -> ReceiverStatus {
        self.shared.status.lock().clone()
    }

    pub fn counters(&self) -> ReceiverCounters {
        self.shared.counters.snapshot()
    }

    /// Request termination. Returns immediately; calling it again is a no-op.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            debug!(receiver = %self.name, "stop requested");
            self.cancel.cancel();
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the task to end and return its final status
    pub async fn join(&self) -> ReceiverStatus {
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(receiver = %self.name, error = %e, "receiver task aborted");
            }
        }
        self.status()
    }

    /// Stop and wait
    pub async fn shutdown(&self) -> ReceiverStatus {
        self.stop();
        self.join().await
    }
}

impl<T> Drop for ReceiverHandle<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn a receiver task onto the current tokio runtime
pub fn spawn_receiver<S, D>(
    mut source: S,
    mut decoder: D,
    config: ReceiverConfig,
) -> ReceiverHandle<D::Frame>
where
    S: PacketSource,
    D: FrameDecoder,
{
    let slot = Arc::new(LatestSlot::new());
    let shared = Arc::new(Shared {
        status: Mutex::new(ReceiverStatus::Running),
        counters: Counters::default(),
    });
    let cancel = CancellationToken::new();

    let task = {
        let slot = Arc::clone(&slot);
        let shared = Arc::clone(&shared);
        let cancel = cancel.clone();
        let name = config.name.clone();
        let timeout = config.recv_timeout;

        tokio::spawn(async move {
            info!(receiver = %name, "receiver started");
            let counters = &shared.counters;

            let status = loop {
                if cancel.is_cancelled() {
                    break ReceiverStatus::Stopped;
                }
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break ReceiverStatus::Stopped,
                    result = source.recv(timeout) => result,
                };
                match result {
                    Ok(None) => {
                        counters.timeouts.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(Some(datagram)) => {
                        counters.received.fetch_add(1, Ordering::Relaxed);
                        match decoder.decode(&datagram) {
                            Ok(Some(frame)) => {
                                slot.store(frame);
                                counters.decoded.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(None) => {}
                            Err(e) => {
                                counters.dropped.fetch_add(1, Ordering::Relaxed);
                                debug!(receiver = %name, error = %e, "dropping message");
                            }
                        }
                    }
                    Err(e) => {
                        warn!(receiver = %name, error = %e, "receiver failed");
                        break ReceiverStatus::Failed(e);
                    }
                }
            };

            source.close();
            info!(receiver = %name, ?status, "receiver finished");
            *shared.status.lock() = status;
        })
    };

    ReceiverHandle {
        name: config.name,
        slot,
        shared,
        cancel,
        task: Mutex::new(Some(task)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use bytes::Bytes;
    use rigstream_wire::TrackingStateBuilder;

    /// Scripted source; `None` entries are timeouts
    struct ScriptedSource {
        script: VecDeque<Result<Option<Datagram>, TransportError>>,
        closes: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(
            script: Vec<Result<Option<Datagram>, TransportError>>,
        ) -> (Self, Arc<AtomicUsize>) {
            let closes = Arc::new(AtomicUsize::new(0));
            (
                ScriptedSource {
                    script: script.into(),
                    closes: Arc::clone(&closes),
                },
                closes,
            )
        }
    }

    impl PacketSource for ScriptedSource {
        async fn recv(&mut self, timeout: Duration) -> Result<Option<Datagram>, TransportError> {
            match self.script.pop_front() {
                Some(step) => step,
                None => {
                    tokio::time::sleep(timeout).await;
                    Ok(None)
                }
            }
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn face_datagram(tracking_ok: bool) -> Datagram {
        let bytes = TrackingStateBuilder::new()
            .frame_info(1.0, tracking_ok)
            .build();
        Datagram::new(bytes)
    }

    async fn wait_for<F: Fn() -> bool>(cond: F) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_bad_message_does_not_kill_stream() {
        let (source, closes) = ScriptedSource::new(vec![
            Ok(Some(Datagram::new(Bytes::from_static(&[1, 2, 3])))),
            Ok(None),
            Ok(Some(face_datagram(true))),
        ]);
        let handle = spawn_receiver(
            source,
            TrackingStateDecoder::default(),
            ReceiverConfig::new("face").with_timeout(Duration::from_millis(5)),
        );

        wait_for(|| handle.counters().decoded == 1).await;
        let counters = handle.counters();
        assert_eq!(counters.received, 2);
        assert_eq!(counters.dropped, 1);
        assert!(counters.timeouts >= 1);
        assert!(handle.latest().unwrap().tracking_ok);
        assert_eq!(handle.status(), ReceiverStatus::Running);

        assert_eq!(handle.shutdown().await, ReceiverStatus::Stopped);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_closes_once() {
        let (source, closes) = ScriptedSource::new(vec![]);
        let handle = spawn_receiver(
            source,
            HandMessageDecoder,
            ReceiverConfig::new("hand").with_timeout(Duration::from_secs(30)),
        );

        handle.stop();
        handle.stop();
        assert!(handle.is_stopping());
        assert_eq!(handle.join().await, ReceiverStatus::Stopped);
        assert_eq!(handle.join().await, ReceiverStatus::Stopped);
        handle.stop();
        drop(handle);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported() {
        let (source, closes) = ScriptedSource::new(vec![
            Ok(Some(face_datagram(true))),
            Err(TransportError::Receive("connection reset".into())),
        ]);
        let handle = spawn_receiver(
            source,
            TrackingStateDecoder::default(),
            ReceiverConfig::new("face"),
        );

        let status = handle.join().await;
        assert_eq!(
            status,
            ReceiverStatus::Failed(TransportError::Receive("connection reset".into()))
        );
        // The last good frame stays readable
        assert!(handle.latest().is_some());
        handle.stop();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_latest_frame_wins() {
        let (source, _) = ScriptedSource::new(vec![
            Ok(Some(face_datagram(true))),
            Ok(Some(face_datagram(true))),
            Ok(Some(face_datagram(false))),
        ]);
        let handle = spawn_receiver(
            source,
            TrackingStateDecoder::default(),
            ReceiverConfig::new("face").with_timeout(Duration::from_millis(5)),
        );
        wait_for(|| handle.slot().sequence() == 3).await;
        assert!(!handle.latest().unwrap().tracking_ok);
        handle.shutdown().await;
    }
}
