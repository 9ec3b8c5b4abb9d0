use std::sync::Arc;
use futures::stream::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::session::{CallRole, CallSession, SessionNotice};
use super::transport::{TransportEvent, TransportFactory};
use crate::audio::{CaptureSource, ChunkerConfig};
use crate::error::CallError;
use crate::signaling::{
    RoomEvent, SignalMessage, SignalSink, SignalingChannel, SignalingEnvelope,
    TranscriptionMessage,
};

/// Creates one capture source per session.
pub type CaptureFactory = Box<dyn FnMut() -> Box<dyn CaptureSource> + Send>;

/// Owner-facing notifications from the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallNotice {
    Connected,
    PeerJoined { peer_id: String },
    PeerLeft { peer_id: String },
    RemoteEnded,
    Transcription { participant_id: String, text: String },
    Failed { reason: String },
    RelayLost,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorCommand {
    HangUp,
    Shutdown,
}

/// Per-room lifecycle owner: maps room events and inbound envelopes onto
/// creation and teardown of at most one [`CallSession`].
///
/// All session transitions happen inside this supervisor's actor loop, which
/// serializes them. Transport completions are tagged with the session
/// generation they belong to; completions for a torn-down generation are
/// dropped instead of mutating a successor session.
pub struct SessionSupervisor {
    room: String,
    username: String,
    chunker_config: ChunkerConfig,
    sink: Arc<dyn SignalSink>,
    transports: TransportFactory,
    captures: CaptureFactory,
    session: Option<CallSession>,
    generation: u64,
    transport_tx: mpsc::Sender<(u64, TransportEvent)>,
    transport_rx: Option<mpsc::Receiver<(u64, TransportEvent)>>,
    notices: mpsc::Sender<CallNotice>,
    transcript: Vec<TranscriptionMessage>,
}

impl SessionSupervisor {
    pub fn new(
        room: String,
        username: String,
        chunker_config: ChunkerConfig,
        sink: Arc<dyn SignalSink>,
        transports: TransportFactory,
        captures: CaptureFactory,
    ) -> (Self, mpsc::Receiver<CallNotice>) {
        let (transport_tx, transport_rx) = mpsc::channel(16);
        let (notices, notice_rx) = mpsc::channel(64);

        let supervisor = Self {
            room,
            username,
            chunker_config,
            sink,
            transports,
            captures,
            session: None,
            generation: 0,
            transport_tx,
            transport_rx: Some(transport_rx),
            notices,
            transcript: Vec::new(),
        };

        (supervisor, notice_rx)
    }

    pub fn session_state(&self) -> Option<super::session::SessionState> {
        self.session.as_ref().map(|s| s.state())
    }

    pub fn current_generation(&self) -> u64 {
        self.generation
    }

    /// Tagged transport event receiver, handed to the caller's select loop.
    pub fn take_transport_events(&mut self) -> Option<mpsc::Receiver<(u64, TransportEvent)>> {
        self.transport_rx.take()
    }

    /// Verify credentials and join the room. On success the initiator session
    /// is started; rejection surfaces before any session exists.
    pub async fn join(
        &mut self,
        channel: &SignalingChannel,
        password: &str,
    ) -> Result<(), CallError> {
        channel.verify_credentials(password).await?;
        channel.join_room(&self.room, &self.username).await?;

        self.start_initiator().await;
        Ok(())
    }

    /// Create and start an Initiator session, tearing nothing down: callers
    /// guarantee no live session exists.
    pub async fn start_initiator(&mut self) {
        let mut session = self.create_session(CallRole::Initiator, None);

        match session.start().await {
            Ok(()) => self.session = Some(session),
            Err(e) => {
                warn!("Failed to start call in {}: {}", self.room, e);
                self.notify(CallNotice::Failed {
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Route one inbound signaling message.
    pub async fn handle_signal(&mut self, message: SignalMessage) {
        if message.from == self.username {
            return;
        }

        match message.envelope {
            SignalingEnvelope::Offer { sdp } => {
                self.accept_offer(&message.from, &sdp).await;
            }
            envelope => {
                let notice = match self.session.as_mut() {
                    Some(session) => session.handle_envelope(&message.from, envelope).await,
                    None => {
                        debug!(
                            "Dropping {} envelope with no session in {}",
                            envelope.kind(),
                            self.room
                        );
                        None
                    }
                };

                self.forward_session_notice(notice);
                self.reap_terminal();
            }
        }
    }

    /// Route one room lifecycle event.
    pub async fn handle_room_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::PeerJoined { peer_id } => {
                if peer_id == self.username {
                    return;
                }

                info!("Peer {} joined room {}", peer_id, self.room);
                self.notify(CallNotice::PeerJoined {
                    peer_id: peer_id.clone(),
                });

                match &self.session {
                    // Stale duplicate while a call is live: never restart
                    // negotiation from here
                    Some(session) if !session.is_terminal() => {
                        debug!("Ignoring peer-joined during active session");
                    }
                    _ => {
                        self.session = None;
                        self.start_initiator().await;
                    }
                }
            }

            RoomEvent::PeerLeft { peer_id } => {
                info!("Peer {} left room {}", peer_id, self.room);

                if let Some(mut session) = self.session.take() {
                    session.discard().await;
                }

                self.notify(CallNotice::PeerLeft { peer_id });
            }

            RoomEvent::ConnectionLost => {
                warn!("Relay connection lost for room {}", self.room);

                if let Some(mut session) = self.session.take() {
                    session.discard().await;
                }

                self.notify(CallNotice::RelayLost);
            }

            RoomEvent::ConnectionRestored => {
                info!("Relay connection restored for room {}", self.room);
            }
        }
    }

    /// Route one tagged transport completion; stale generations are dropped.
    pub async fn handle_transport_event(&mut self, generation: u64, event: TransportEvent) {
        let notice = match self.session.as_mut() {
            Some(session) if session.generation() == generation => {
                session.handle_transport_event(event).await
            }
            _ => {
                debug!(
                    "Dropping transport event {:?} for stale generation {}",
                    event, generation
                );
                None
            }
        };

        self.forward_session_notice(notice);
        self.reap_terminal();
    }

    /// Record one transcription and forward it to the owner. Empty texts are
    /// dropped.
    pub fn handle_transcription(&mut self, message: TranscriptionMessage) {
        if message.text.trim().is_empty() {
            return;
        }

        self.transcript.push(message.clone());
        self.notify(CallNotice::Transcription {
            participant_id: message.participant_id,
            text: message.text,
        });
    }

    /// Local hangup: end the session, publish the transcript log, notify the
    /// owner.
    pub async fn hang_up(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.hang_up().await;
        }

        let transcript = std::mem::take(&mut self.transcript);
        if let Err(e) = self.sink.send_call_ended(&self.room, transcript).await {
            warn!("Failed to publish call-ended for {}: {}", self.room, e);
        }

        self.notify(CallNotice::Ended);
    }

    /// Actor loop: drives the supervisor from relay subscriptions, transport
    /// completions, and owner commands until `Shutdown`.
    pub async fn run(
        mut self,
        channel: SignalingChannel,
        mut commands: mpsc::Receiver<SupervisorCommand>,
    ) -> anyhow::Result<()> {
        let mut signals = channel.subscribe_signals(&self.room).await?;
        let mut events = channel.subscribe_room_events(&self.room).await?;
        let mut transcriptions = channel.subscribe_transcriptions(&self.room).await?;

        let mut transport_rx = match self.take_transport_events() {
            Some(rx) => rx,
            None => anyhow::bail!("transport event receiver already taken"),
        };

        info!("Session supervisor running for room {}", self.room);

        loop {
            tokio::select! {
                Some(msg) = signals.next() => {
                    match serde_json::from_slice::<SignalMessage>(&msg.payload) {
                        Ok(signal) => self.handle_signal(signal).await,
                        Err(e) => warn!("Ignoring malformed signal payload: {}", e),
                    }
                }

                Some(msg) = events.next() => {
                    match serde_json::from_slice::<RoomEvent>(&msg.payload) {
                        Ok(event) => self.handle_room_event(event).await,
                        Err(e) => warn!("Ignoring malformed room event: {}", e),
                    }
                }

                Some(msg) = transcriptions.next() => {
                    match serde_json::from_slice::<TranscriptionMessage>(&msg.payload) {
                        Ok(t) => self.handle_transcription(t),
                        Err(e) => warn!("Ignoring malformed transcription: {}", e),
                    }
                }

                Some((generation, event)) = transport_rx.recv() => {
                    self.handle_transport_event(generation, event).await;
                }

                command = commands.recv() => {
                    match command {
                        Some(SupervisorCommand::HangUp) => self.hang_up().await,
                        Some(SupervisorCommand::Shutdown) | None => break,
                    }
                }
            }
        }

        if let Some(mut session) = self.session.take() {
            session.discard().await;
        }

        info!("Session supervisor stopped for room {}", self.room);

        Ok(())
    }

    /// Inbound offer: any live session for the room is discarded first
    /// (renegotiation), then a fresh Responder session answers.
    async fn accept_offer(&mut self, from: &str, sdp: &str) {
        if let Some(mut old) = self.session.take() {
            if !old.is_terminal() {
                info!("Renegotiation offer from {}: replacing live session", from);
            }
            old.discard().await;
        }

        let mut session = self.create_session(CallRole::Responder, Some(from.to_string()));

        match session.accept_offer(from, sdp).await {
            Ok(()) => self.session = Some(session),
            Err(e) => {
                warn!("Failed to answer offer in {}: {}", self.room, e);
                self.notify(CallNotice::Failed {
                    reason: e.to_string(),
                });
            }
        }
    }

    fn create_session(&mut self, role: CallRole, remote: Option<String>) -> CallSession {
        self.generation += 1;
        let generation = self.generation;

        // Per-session event channel, forwarded with the generation tag so the
        // actor loop can drop completions from torn-down sessions
        let (event_tx, mut event_rx) = mpsc::channel(8);
        let shared = self.transport_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                if shared.send((generation, event)).await.is_err() {
                    break;
                }
            }
        });

        let transport = (self.transports)(event_tx);
        let capture = (self.captures)();

        CallSession::new(
            role,
            self.room.clone(),
            self.username.clone(),
            remote,
            generation,
            transport,
            capture,
            self.chunker_config.clone(),
            self.sink.clone(),
        )
    }

    fn forward_session_notice(&mut self, notice: Option<SessionNotice>) {
        let Some(notice) = notice else { return };

        let notice = match notice {
            SessionNotice::Connected => CallNotice::Connected,
            SessionNotice::RemoteEnded => CallNotice::RemoteEnded,
            SessionNotice::Failed(reason) => CallNotice::Failed { reason },
        };

        self.notify(notice);
    }

    fn reap_terminal(&mut self) {
        if self
            .session
            .as_ref()
            .map(|s| s.is_terminal())
            .unwrap_or(false)
        {
            self.session = None;
        }
    }

    fn notify(&self, notice: CallNotice) {
        if let Err(e) = self.notices.try_send(notice) {
            warn!("Dropping call notice, owner not keeping up: {}", e);
        }
    }
}
