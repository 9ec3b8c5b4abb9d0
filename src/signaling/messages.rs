use serde::{Deserialize, Serialize};

/// One signaling message unit exchanged through the relay.
///
/// Each variant carries only its own payload; the kind tag is explicit on the
/// wire so receivers never probe optional fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalingEnvelope {
    /// Session-description offer from the call initiator
    Offer { sdp: String },
    /// Session-description answer from the responder
    Answer { sdp: String },
    /// Connectivity candidate, opaque to the relay
    Candidate { candidate: String },
    /// One side ended the call
    Hangup,
}

impl SignalingEnvelope {
    /// Envelope kind for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SignalingEnvelope::Offer { .. } => "offer",
            SignalingEnvelope::Answer { .. } => "answer",
            SignalingEnvelope::Candidate { .. } => "candidate",
            SignalingEnvelope::Hangup => "hangup",
        }
    }
}

/// Relay-level frame wrapping an envelope with sender context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalMessage {
    pub room: String,
    pub from: String,
    #[serde(flatten)]
    pub envelope: SignalingEnvelope,
}

/// Room lifecycle notifications delivered by the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoomEvent {
    PeerJoined { peer_id: String },
    PeerLeft { peer_id: String },
    ConnectionLost,
    ConnectionRestored,
}

/// Voice-activity-gated utterance chunk sent to the audio processor.
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioChunkMessage {
    pub participant_id: String,
    pub room: String,
    /// Base64-encoded 16-bit little-endian PCM
    pub pcm: String,
    pub sample_rate: u32,
    pub channels: u16,
    /// RFC3339 timestamp
    pub timestamp: String,
}

/// Transcription result received from the audio processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionMessage {
    pub participant_id: String,
    pub text: String,
}

/// Published on local hangup with the accumulated transcript log.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallEndedMessage {
    pub room: String,
    pub transcript: Vec<TranscriptionMessage>,
}

/// Credential check request, answered before any join is attempted.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRequest {
    pub room: String,
    pub username: String,
}

/// Structured join acknowledgment (no success-phrase scraping).
#[derive(Debug, Serialize, Deserialize)]
pub struct JoinResponse {
    pub ok: bool,
    #[serde(default)]
    pub message: String,
}
