use std::sync::Arc;
use tracing::{info, warn};

use super::candidates::CandidateQueue;
use super::transport::{PeerTransport, TransportEvent};
use crate::audio::{CaptureSource, ChunkPipeline, ChunkerConfig};
use crate::error::CallError;
use crate::signaling::{SignalSink, SignalingEnvelope};

/// Which side of the offer/answer exchange this session plays. Fixed at
/// creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallRole {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingLocalDescription,
    AwaitingRemoteDescription,
    Negotiating,
    Connected,
    Failed,
    Closed,
}

/// Owner-facing outcome of processing one envelope or transport event. Each
/// terminal notice is produced at most once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    Connected,
    RemoteEnded,
    Failed(String),
}

/// One negotiated peer call, owned exclusively by the supervisor.
///
/// All transitions are driven from the supervisor's actor loop, so no two
/// envelopes for the same session are ever processed concurrently. There is
/// no negotiation timeout; failing a session that never reaches `Connected`
/// is left to a future hardening pass.
pub struct CallSession {
    role: CallRole,
    state: SessionState,
    room: String,
    local_participant: String,
    remote_participant: Option<String>,
    /// Creation generation; the supervisor drops transport completions whose
    /// generation no longer matches the live session.
    generation: u64,
    pending: CandidateQueue,
    remote_description_set: bool,
    restart_attempted: bool,
    terminal_notified: bool,
    transport: Box<dyn PeerTransport>,
    capture: Box<dyn CaptureSource>,
    pipeline: Option<ChunkPipeline>,
    chunker_config: ChunkerConfig,
    sink: Arc<dyn SignalSink>,
}

impl CallSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        role: CallRole,
        room: String,
        local_participant: String,
        remote_participant: Option<String>,
        generation: u64,
        transport: Box<dyn PeerTransport>,
        capture: Box<dyn CaptureSource>,
        chunker_config: ChunkerConfig,
        sink: Arc<dyn SignalSink>,
    ) -> Self {
        Self {
            role,
            state: SessionState::Idle,
            room,
            local_participant,
            remote_participant,
            generation,
            pending: CandidateQueue::new(),
            remote_description_set: false,
            restart_attempted: false,
            terminal_notified: false,
            transport,
            capture,
            pipeline: None,
            chunker_config,
            sink,
        }
    }

    pub fn role(&self) -> CallRole {
        self.role
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn remote_participant(&self) -> Option<&str> {
        self.remote_participant.as_deref()
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending.len()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, SessionState::Closed | SessionState::Failed)
    }

    /// Initiator entry point: acquire media, construct the local offer, emit
    /// it. Capture failure aborts before any envelope is sent.
    pub async fn start(&mut self) -> Result<(), CallError> {
        debug_assert_eq!(self.role, CallRole::Initiator);

        self.start_capture().await?;

        self.state = SessionState::AwaitingLocalDescription;

        let sdp = match self.transport.create_offer().await {
            Ok(sdp) => sdp,
            Err(e) => {
                self.release_resources().await;
                self.state = SessionState::Failed;
                return Err(e);
            }
        };

        if let Err(e) = self.emit(SignalingEnvelope::Offer { sdp }).await {
            self.release_resources().await;
            self.state = SessionState::Failed;
            return Err(e);
        }
        self.state = SessionState::Negotiating;

        info!("Call session negotiating as initiator in {}", self.room);

        Ok(())
    }

    /// Responder entry point: acquire media, apply the received offer, emit
    /// the answer. Candidates queued before this point are applied as soon as
    /// the remote description is set.
    pub async fn accept_offer(&mut self, from: &str, sdp: &str) -> Result<(), CallError> {
        debug_assert_eq!(self.role, CallRole::Responder);

        self.remote_participant = Some(from.to_string());

        self.start_capture().await?;

        self.state = SessionState::AwaitingRemoteDescription;

        if let Err(e) = self.apply_remote_description(sdp).await {
            self.release_resources().await;
            self.state = SessionState::Failed;
            return Err(e);
        }

        let answer = match self.transport.create_answer().await {
            Ok(sdp) => sdp,
            Err(e) => {
                self.release_resources().await;
                self.state = SessionState::Failed;
                return Err(e);
            }
        };

        if let Err(e) = self.emit(SignalingEnvelope::Answer { sdp: answer }).await {
            self.release_resources().await;
            self.state = SessionState::Failed;
            return Err(e);
        }
        self.state = SessionState::Negotiating;

        info!(
            "Call session negotiating as responder in {} (peer {})",
            self.room, from
        );

        Ok(())
    }

    /// Process one inbound envelope. Terminal sessions are inert: every
    /// envelope is ignored.
    pub async fn handle_envelope(
        &mut self,
        from: &str,
        envelope: SignalingEnvelope,
    ) -> Option<SessionNotice> {
        if self.is_terminal() {
            return None;
        }

        if self.remote_participant.is_none() {
            self.remote_participant = Some(from.to_string());
        }

        match envelope {
            SignalingEnvelope::Offer { .. } => {
                // Renegotiation offers are resolved by the supervisor, which
                // replaces the session; one reaching here is out of sequence.
                warn!("Ignoring offer inside an active session in {}", self.room);
                None
            }

            SignalingEnvelope::Answer { sdp } => {
                let expecting = self.role == CallRole::Initiator
                    && self.state == SessionState::Negotiating
                    && !self.remote_description_set;

                if !expecting {
                    warn!(
                        "Ignoring out-of-sequence answer in {} (state {:?})",
                        self.room, self.state
                    );
                    return None;
                }

                if let Err(e) = self.apply_remote_description(&sdp).await {
                    return self.fail(e.to_string()).await;
                }

                None
            }

            SignalingEnvelope::Candidate { candidate } => {
                if self.remote_description_set {
                    if let Err(e) = self.transport.apply_candidate(&candidate).await {
                        warn!("Failed to apply candidate in {}: {}", self.room, e);
                    }
                } else {
                    // Normal race: candidate outran the description it needs
                    self.pending.enqueue(candidate);
                }
                None
            }

            SignalingEnvelope::Hangup => {
                info!("Remote peer hung up in {}", self.room);
                // Only one side's intent propagates: no hangup is echoed back
                self.release_resources().await;
                self.state = SessionState::Closed;
                self.terminal_notice(SessionNotice::RemoteEnded)
            }
        }
    }

    /// Process a connectivity report from the transport.
    pub async fn handle_transport_event(&mut self, event: TransportEvent) -> Option<SessionNotice> {
        if self.is_terminal() {
            return None;
        }

        match event {
            TransportEvent::Connected => {
                if self.state == SessionState::Negotiating {
                    self.state = SessionState::Connected;
                    info!("Call connected in {}", self.room);
                    Some(SessionNotice::Connected)
                } else {
                    None
                }
            }

            TransportEvent::Failed => {
                if !self.restart_attempted {
                    self.restart_attempted = true;
                    match self.transport.restart().await {
                        Ok(()) => {
                            info!("Connectivity failed in {}, restarting gathering", self.room);
                            self.state = SessionState::Negotiating;
                            return None;
                        }
                        Err(e) => {
                            warn!("Connectivity restart failed in {}: {}", self.room, e);
                        }
                    }
                }

                self.fail("peer connectivity failed".to_string()).await
            }
        }
    }

    /// Local hangup: emit one `Hangup` envelope and close.
    pub async fn hang_up(&mut self) {
        if self.is_terminal() {
            return;
        }

        if let Err(e) = self.emit(SignalingEnvelope::Hangup).await {
            warn!("Failed to send hangup for {}: {}", self.room, e);
        }

        self.release_resources().await;
        self.state = SessionState::Closed;
        info!("Call ended locally in {}", self.room);
    }

    /// Tear down without emitting anything, for supervisor-driven discard
    /// (renegotiation, peer disconnect, relay loss).
    pub async fn discard(&mut self) {
        if self.is_terminal() {
            return;
        }

        self.release_resources().await;
        self.state = SessionState::Closed;
    }

    async fn start_capture(&mut self) -> Result<(), CallError> {
        let frames = self.capture.start().await?;

        self.pipeline = Some(ChunkPipeline::spawn(
            frames,
            self.chunker_config.clone(),
            self.sink.clone(),
            self.local_participant.clone(),
            self.room.clone(),
        ));

        Ok(())
    }

    async fn apply_remote_description(&mut self, sdp: &str) -> Result<(), CallError> {
        self.transport.apply_remote_description(sdp).await?;
        self.remote_description_set = true;

        // Drain candidates that arrived ahead of the description, in receipt
        // order
        for candidate in self.pending.drain() {
            if let Err(e) = self.transport.apply_candidate(&candidate).await {
                warn!("Failed to apply queued candidate in {}: {}", self.room, e);
            }
        }

        Ok(())
    }

    async fn fail(&mut self, reason: String) -> Option<SessionNotice> {
        self.release_resources().await;
        self.state = SessionState::Failed;
        self.terminal_notice(SessionNotice::Failed(reason))
    }

    async fn release_resources(&mut self) {
        // Capture stops first so the frame channel closes and the pipeline
        // task can finish
        self.capture.stop().await;
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.shutdown().await;
        }
        self.pending.clear();
        self.transport.close().await;
    }

    fn terminal_notice(&mut self, notice: SessionNotice) -> Option<SessionNotice> {
        if self.terminal_notified {
            return None;
        }
        self.terminal_notified = true;
        Some(notice)
    }

    async fn emit(&self, envelope: SignalingEnvelope) -> Result<(), CallError> {
        self.sink
            .send_signal(&self.room, &self.local_participant, envelope)
            .await
            .map_err(|e| CallError::Negotiation(format!("signaling send failed: {}", e)))
    }
}
