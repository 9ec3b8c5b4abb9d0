use thiserror::Error;

/// Errors surfaced by call setup and negotiation.
///
/// `Capture` and `Credential` abort before any envelope reaches the relay.
/// `Negotiation` and `Connectivity` move the session to `Failed` after the
/// single permitted ICE restart. `Protocol` is logged and ignored by the
/// session, never fatal: signaling relays may reorder or duplicate.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("negotiation failed: {0}")]
    Negotiation(String),

    #[error("connectivity failed: {0}")]
    Connectivity(String),

    #[error("audio capture unavailable: {0}")]
    Capture(String),

    #[error("credentials rejected: {0}")]
    Credential(String),

    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl CallError {
    /// Short class name used in owner-facing notices and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CallError::Negotiation(_) => "negotiation",
            CallError::Connectivity(_) => "connectivity",
            CallError::Capture(_) => "capture",
            CallError::Credential(_) => "credential",
            CallError::Protocol(_) => "protocol",
        }
    }
}
