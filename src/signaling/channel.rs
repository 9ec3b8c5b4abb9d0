use anyhow::{Context, Result};
use async_nats::Client;
use base64::Engine;
use tracing::{debug, info};

use super::messages::{
    AudioChunkMessage, CallEndedMessage, JoinRequest, JoinResponse, SignalMessage,
    SignalingEnvelope, TranscriptionMessage, VerifyRequest, VerifyResponse,
};
use crate::error::CallError;

/// Outbound side of the relay, as seen by a call session and the audio
/// pipeline. Both producers share one sink; implementations must be safe to
/// call from either without external locking.
#[async_trait::async_trait]
pub trait SignalSink: Send + Sync {
    /// Send a signaling envelope to the room.
    async fn send_signal(
        &self,
        room: &str,
        from: &str,
        envelope: SignalingEnvelope,
    ) -> Result<()>;

    /// Send an utterance chunk to the audio processor. Fire-and-forget.
    async fn send_chunk(
        &self,
        participant_id: &str,
        room: &str,
        pcm_bytes: &[u8],
        sample_rate: u32,
        channels: u16,
    ) -> Result<()>;

    /// Send the end-of-call transcript log.
    async fn send_call_ended(
        &self,
        room: &str,
        transcript: Vec<TranscriptionMessage>,
    ) -> Result<()>;
}

/// Room-scoped pub/sub adapter over the relay.
///
/// One handle is shared by every producer (session and audio pipeline); the
/// underlying client serializes writes internally, so no extra locking is
/// needed around sends.
#[derive(Clone)]
pub struct SignalingChannel {
    client: Client,
}

fn signal_subject(room: &str) -> String {
    format!("call.signal.{}", room)
}

fn audio_subject(room: &str) -> String {
    format!("call.audio.{}", room)
}

fn transcript_subject(room: &str) -> String {
    format!("call.transcript.{}", room)
}

fn event_subject(room: &str) -> String {
    format!("call.event.{}", room)
}

impl SignalingChannel {
    /// Connect to the relay.
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to signaling relay at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to signaling relay")?;

        info!("Connected to signaling relay");

        Ok(Self { client })
    }

    /// Publish a signaling envelope to the room.
    pub async fn publish_signal(
        &self,
        room: &str,
        from: &str,
        envelope: SignalingEnvelope,
    ) -> Result<()> {
        let subject = signal_subject(room);
        let kind = envelope.kind();

        let message = SignalMessage {
            room: room.to_string(),
            from: from.to_string(),
            envelope,
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish signaling envelope")?;

        debug!("Published {} envelope to {}", kind, subject);

        Ok(())
    }

    /// Subscribe to signaling envelopes for a room.
    ///
    /// Payloads are raw; callers deserialize and skip malformed messages
    /// rather than failing.
    pub async fn subscribe_signals(&self, room: &str) -> Result<async_nats::Subscriber> {
        let subject = signal_subject(room);
        info!("Subscribing to signaling on {}", subject);

        self.client
            .subscribe(subject)
            .await
            .context("Failed to subscribe to signaling")
    }

    /// Subscribe to room lifecycle events.
    pub async fn subscribe_room_events(&self, room: &str) -> Result<async_nats::Subscriber> {
        let subject = event_subject(room);
        info!("Subscribing to room events on {}", subject);

        self.client
            .subscribe(subject)
            .await
            .context("Failed to subscribe to room events")
    }

    /// Subscribe to transcription results for a room.
    pub async fn subscribe_transcriptions(&self, room: &str) -> Result<async_nats::Subscriber> {
        let subject = transcript_subject(room);
        info!("Subscribing to transcriptions on {}", subject);

        self.client
            .subscribe(subject)
            .await
            .context("Failed to subscribe to transcriptions")
    }

    /// Publish an utterance chunk to the audio processor. Fire-and-forget: no
    /// acknowledgment is awaited.
    pub async fn publish_audio_chunk(
        &self,
        participant_id: &str,
        room: &str,
        pcm_bytes: &[u8],
        sample_rate: u32,
        channels: u16,
    ) -> Result<()> {
        let subject = audio_subject(room);

        let message = AudioChunkMessage {
            participant_id: participant_id.to_string(),
            room: room.to_string(),
            pcm: base64::engine::general_purpose::STANDARD.encode(pcm_bytes),
            sample_rate,
            channels,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish audio chunk")?;

        debug!(
            "Published audio chunk to {} ({} bytes)",
            subject,
            pcm_bytes.len()
        );

        Ok(())
    }

    /// Publish the end-of-call transcript log.
    pub async fn publish_call_ended(
        &self,
        room: &str,
        transcript: Vec<TranscriptionMessage>,
    ) -> Result<()> {
        let subject = format!("call.ended.{}", room);

        let message = CallEndedMessage {
            room: room.to_string(),
            transcript,
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject, payload.into())
            .await
            .context("Failed to publish call-ended message")?;

        Ok(())
    }

    /// Verify room credentials before joining. Rejection surfaces as
    /// [`CallError::Credential`] and no session-visible side effect occurs.
    pub async fn verify_credentials(&self, password: &str) -> Result<(), CallError> {
        let request = VerifyRequest {
            password: password.to_string(),
        };

        let payload = serde_json::to_vec(&request)
            .map_err(|e| CallError::Protocol(e.to_string()))?;

        let reply = self
            .client
            .request("call.verify".to_string(), payload.into())
            .await
            .map_err(|e| CallError::Connectivity(format!("verify request failed: {}", e)))?;

        let response: VerifyResponse = serde_json::from_slice(&reply.payload)
            .map_err(|e| CallError::Protocol(format!("malformed verify response: {}", e)))?;

        if response.success {
            Ok(())
        } else {
            Err(CallError::Credential(response.message))
        }
    }

    /// Request to join a room. Returns a structured acknowledgment.
    pub async fn join_room(&self, room: &str, username: &str) -> Result<(), CallError> {
        let request = JoinRequest {
            room: room.to_string(),
            username: username.to_string(),
        };

        let payload = serde_json::to_vec(&request)
            .map_err(|e| CallError::Protocol(e.to_string()))?;

        let reply = self
            .client
            .request("call.join".to_string(), payload.into())
            .await
            .map_err(|e| CallError::Connectivity(format!("join request failed: {}", e)))?;

        let response: JoinResponse = serde_json::from_slice(&reply.payload)
            .map_err(|e| CallError::Protocol(format!("malformed join response: {}", e)))?;

        if response.ok {
            info!("Joined room {} as {}", room, username);
            Ok(())
        } else {
            Err(CallError::Credential(response.message))
        }
    }
}

#[async_trait::async_trait]
impl SignalSink for SignalingChannel {
    async fn send_signal(
        &self,
        room: &str,
        from: &str,
        envelope: SignalingEnvelope,
    ) -> Result<()> {
        self.publish_signal(room, from, envelope).await
    }

    async fn send_chunk(
        &self,
        participant_id: &str,
        room: &str,
        pcm_bytes: &[u8],
        sample_rate: u32,
        channels: u16,
    ) -> Result<()> {
        self.publish_audio_chunk(participant_id, room, pcm_bytes, sample_rate, channels)
            .await
    }

    async fn send_call_ended(
        &self,
        room: &str,
        transcript: Vec<TranscriptionMessage>,
    ) -> Result<()> {
        self.publish_call_ended(room, transcript).await
    }
}
