//! Relay signaling: wire message types and the room-scoped pub/sub channel.

pub mod channel;
pub mod messages;

pub use channel::{SignalSink, SignalingChannel};
pub use messages::{
    AudioChunkMessage, CallEndedMessage, JoinRequest, JoinResponse, RoomEvent, SignalMessage,
    SignalingEnvelope, TranscriptionMessage, VerifyRequest, VerifyResponse,
};
