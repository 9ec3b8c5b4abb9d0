use tokio::sync::mpsc;
use tracing::debug;

use crate::error::CallError;

/// Connectivity state reported by the underlying peer transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    Failed,
}

/// Seam to the peer connectivity layer.
///
/// The session drives description and candidate application through this
/// trait; connectivity state comes back asynchronously as [`TransportEvent`]s
/// on the channel handed to the transport at creation.
#[async_trait::async_trait]
pub trait PeerTransport: Send + Sync {
    /// Construct and set the local offer description.
    async fn create_offer(&mut self) -> Result<String, CallError>;

    /// Apply a remote session description.
    async fn apply_remote_description(&mut self, sdp: &str) -> Result<(), CallError>;

    /// Construct and set the local answer description. Requires a remote
    /// offer to have been applied.
    async fn create_answer(&mut self) -> Result<String, CallError>;

    /// Apply a connectivity candidate.
    async fn apply_candidate(&mut self, candidate: &str) -> Result<(), CallError>;

    /// Restart connectivity gathering after a failure. Transports that do not
    /// support restarts return `Err(CallError::Connectivity)`.
    async fn restart(&mut self) -> Result<(), CallError>;

    /// Release the underlying connection.
    async fn close(&mut self);
}

/// Creates one transport per session, wired to a per-session event channel.
pub type TransportFactory =
    Box<dyn FnMut(mpsc::Sender<TransportEvent>) -> Box<dyn PeerTransport> + Send>;

/// In-process transport that fabricates descriptions and reports `Connected`
/// once both sides of the exchange are applied. Stands in for a real peer
/// connectivity stack in the demo binary and in tests.
pub struct LocalPeerTransport {
    events: mpsc::Sender<TransportEvent>,
    local_set: bool,
    remote_set: bool,
    candidates_applied: usize,
    closed: bool,
}

impl LocalPeerTransport {
    pub fn new(events: mpsc::Sender<TransportEvent>) -> Self {
        Self {
            events,
            local_set: false,
            remote_set: false,
            candidates_applied: 0,
            closed: false,
        }
    }

    pub fn candidates_applied(&self) -> usize {
        self.candidates_applied
    }

    async fn maybe_connected(&self) {
        if self.local_set && self.remote_set {
            let _ = self.events.send(TransportEvent::Connected).await;
        }
    }
}

#[async_trait::async_trait]
impl PeerTransport for LocalPeerTransport {
    async fn create_offer(&mut self) -> Result<String, CallError> {
        if self.closed {
            return Err(CallError::Negotiation("transport closed".to_string()));
        }
        self.local_set = true;
        Ok(format!("v=0 o=local-{}", uuid::Uuid::new_v4()))
    }

    async fn apply_remote_description(&mut self, _sdp: &str) -> Result<(), CallError> {
        if self.closed {
            return Err(CallError::Negotiation("transport closed".to_string()));
        }
        self.remote_set = true;
        self.maybe_connected().await;
        Ok(())
    }

    async fn create_answer(&mut self) -> Result<String, CallError> {
        if !self.remote_set {
            return Err(CallError::Negotiation(
                "answer requested with no remote offer".to_string(),
            ));
        }
        self.local_set = true;
        self.maybe_connected().await;
        Ok(format!("v=0 o=answer-{}", uuid::Uuid::new_v4()))
    }

    async fn apply_candidate(&mut self, candidate: &str) -> Result<(), CallError> {
        if !self.remote_set {
            return Err(CallError::Negotiation(
                "candidate before remote description".to_string(),
            ));
        }
        debug!("Applying candidate: {}", candidate);
        self.candidates_applied += 1;
        Ok(())
    }

    async fn restart(&mut self) -> Result<(), CallError> {
        if self.closed {
            return Err(CallError::Connectivity("transport closed".to_string()));
        }
        self.maybe_connected().await;
        Ok(())
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}
