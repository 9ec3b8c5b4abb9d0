pub mod audio;
pub mod call;
pub mod config;
pub mod error;
pub mod signaling;

pub use audio::{
    AudioChunker, AudioFrame, CaptureSource, ChunkPipeline, ChunkerConfig, DeniedCapture,
    ScriptedCapture,
};
pub use call::{
    CallNotice, CallRole, CallSession, CandidateQueue, LocalPeerTransport, PeerTransport,
    SessionNotice, SessionState, SessionSupervisor, SupervisorCommand, TransportEvent,
};
pub use config::Config;
pub use error::CallError;
pub use signaling::{SignalMessage, SignalingChannel, SignalingEnvelope};
