//! Shared receiver leases
//!
//! Several consumers may want the same stream. A `SharedReceiver` starts the
//! receiver on the first `acquire` and hands out leases; the receiver stops
//! when the last lease is released or dropped. Nothing is global: whoever
//! owns the `SharedReceiver` owns the stream.

use std::future::Future;
use std::ops::Deref;
use std::sync::{Arc, Weak};

use tokio::sync::Mutex;
use tracing::debug;

use rigstream_core::TransportError;
use rigstream_transport::{ReceiverHandle, ReceiverStatus};

/// One consumer's hold on a running receiver
pub struct ReceiverLease<T> {
    handle: Arc<ReceiverHandle<T>>,
}

impl<T> ReceiverLease<T> {
    /// Give the lease back. When it was the last one the receiver is shut
    /// down and its final status returned.
    pub async fn release(self) -> Option<ReceiverStatus> {
        match Arc::try_unwrap(self.handle) {
            Ok(handle) => {
                debug!(receiver = handle.name(), "last lease released");
                Some(handle.shutdown().await)
            }
            Err(_) => None,
        }
    }
}

impl<T> Clone for ReceiverLease<T> {
    fn clone(&self) -> Self {
        ReceiverLease {
            handle: Arc::clone(&self.handle),
        }
    }
}

impl<T> Deref for ReceiverLease<T> {
    type Target = ReceiverHandle<T>;

    fn deref(&self) -> &ReceiverHandle<T> {
        &self.handle
    }
}

/// Lazily started receiver shared through leases
pub struct SharedReceiver<T> {
    current: Mutex<Weak<ReceiverHandle<T>>>,
}

impl<T> Default for SharedReceiver<T> {
    fn default() -> Self {
        Self {
            current: Mutex::new(Weak::new()),
        }
    }
}

impl<T> SharedReceiver<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lease the running receiver, calling `start` to launch it if no lease
    /// is outstanding
    pub async fn acquire<F, Fut>(&self, start: F) -> Result<ReceiverLease<T>, TransportError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ReceiverHandle<T>, TransportError>>,
    {
        let mut current = self.current.lock().await;
        if let Some(handle) = current.upgrade() {
            return Ok(ReceiverLease { handle });
        }

        let handle = Arc::new(start().await?);
        debug!(receiver = handle.name(), "receiver started for first lease");
        *current = Arc::downgrade(&handle);
        Ok(ReceiverLease { handle })
    }

    /// Number of outstanding leases
    pub async fn lease_count(&self) -> usize {
        self.current.lock().await.strong_count()
    }

    pub async fn is_running(&self) -> bool {
        self.lease_count().await > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use rigstream_core::DecodeError;
    use rigstream_transport::{spawn_receiver, Datagram, FrameDecoder, PacketSource, ReceiverConfig};

    /// Yields one datagram, then idles
    struct OneShotSource {
        sent: bool,
        closes: Arc<AtomicUsize>,
    }

    impl PacketSource for OneShotSource {
        async fn recv(&mut self, timeout: Duration) -> Result<Option<Datagram>, TransportError> {
            if !self.sent {
                self.sent = true;
                return Ok(Some(Datagram::new(vec![0u8; 3])));
            }
            tokio::time::sleep(timeout).await;
            Ok(None)
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct PayloadLen;

    impl FrameDecoder for PayloadLen {
        type Frame = usize;

        fn decode(&mut self, datagram: &Datagram) -> Result<Option<usize>, DecodeError> {
            Ok(Some(datagram.payload.len()))
        }
    }

    fn starter(
        starts: &Arc<AtomicUsize>,
        closes: &Arc<AtomicUsize>,
    ) -> impl Future<Output = Result<ReceiverHandle<usize>, TransportError>> {
        starts.fetch_add(1, Ordering::SeqCst);
        let source = OneShotSource {
            sent: false,
            closes: Arc::clone(closes),
        };
        let handle = spawn_receiver(
            source,
            PayloadLen,
            ReceiverConfig::new("shared").with_timeout(Duration::from_millis(10)),
        );
        async move { Ok(handle) }
    }

    #[tokio::test]
    async fn test_first_acquire_starts_last_release_stops() {
        let shared = SharedReceiver::new();
        let starts = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));

        let a = shared.acquire(|| starter(&starts, &closes)).await.unwrap();
        let b = shared.acquire(|| starter(&starts, &closes)).await.unwrap();
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(shared.lease_count().await, 2);
        assert_eq!(a.name(), "shared");

        assert_eq!(b.release().await, None);
        assert!(shared.is_running().await);
        assert_eq!(a.status(), ReceiverStatus::Running);

        assert_eq!(a.release().await, Some(ReceiverStatus::Stopped));
        assert!(!shared.is_running().await);
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        // Acquiring again starts a fresh receiver
        let c = shared.acquire(|| starter(&starts, &closes)).await.unwrap();
        assert_eq!(starts.load(Ordering::SeqCst), 2);
        c.release().await;
        assert_eq!(closes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_start_leaves_nothing_running() {
        let shared: SharedReceiver<usize> = SharedReceiver::new();
        let result = shared
            .acquire(|| async { Err(TransportError::Connect("refused".into())) })
            .await;
        assert!(matches!(result, Err(TransportError::Connect(_))));
        assert!(!shared.is_running().await);
    }

    #[tokio::test]
    async fn test_dropped_lease_stops_receiver() {
        let shared = SharedReceiver::new();
        let starts = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));

        let lease = shared.acquire(|| starter(&starts, &closes)).await.unwrap();
        let cloned = lease.clone();
        drop(lease);
        assert!(shared.is_running().await);
        drop(cloned);
        assert!(!shared.is_running().await);

        for _ in 0..100 {
            if closes.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
