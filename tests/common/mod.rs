// Shared test doubles for the signaling sink and the peer transport seam.

use std::sync::{Arc, Mutex};

use roomcall::call::PeerTransport;
use roomcall::error::CallError;
use roomcall::signaling::{SignalSink, SignalingEnvelope, TranscriptionMessage};

/// Records everything sent through the sink.
#[derive(Default)]
pub struct CollectorSink {
    pub signals: Mutex<Vec<(String, String, SignalingEnvelope)>>,
    pub chunks: Mutex<Vec<Vec<u8>>>,
    pub ended: Mutex<Vec<Vec<TranscriptionMessage>>>,
}

impl CollectorSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent_envelopes(&self) -> Vec<SignalingEnvelope> {
        self.signals
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, e)| e.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl SignalSink for CollectorSink {
    async fn send_signal(
        &self,
        room: &str,
        from: &str,
        envelope: SignalingEnvelope,
    ) -> anyhow::Result<()> {
        self.signals
            .lock()
            .unwrap()
            .push((room.to_string(), from.to_string(), envelope));
        Ok(())
    }

    async fn send_chunk(
        &self,
        _participant_id: &str,
        _room: &str,
        pcm_bytes: &[u8],
        _sample_rate: u32,
        _channels: u16,
    ) -> anyhow::Result<()> {
        self.chunks.lock().unwrap().push(pcm_bytes.to_vec());
        Ok(())
    }

    async fn send_call_ended(
        &self,
        _room: &str,
        transcript: Vec<TranscriptionMessage>,
    ) -> anyhow::Result<()> {
        self.ended.lock().unwrap().push(transcript);
        Ok(())
    }
}

/// Transport double that logs every operation in call order.
pub struct MockTransport {
    pub log: Arc<Mutex<Vec<String>>>,
    pub restart_succeeds: bool,
    remote_set: bool,
}

impl MockTransport {
    pub fn new(log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            log,
            restart_succeeds: false,
            remote_set: false,
        }
    }

    pub fn with_restart(log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            log,
            restart_succeeds: true,
            remote_set: false,
        }
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

#[async_trait::async_trait]
impl PeerTransport for MockTransport {
    async fn create_offer(&mut self) -> Result<String, CallError> {
        self.record("create_offer".to_string());
        Ok("sdp-offer".to_string())
    }

    async fn apply_remote_description(&mut self, sdp: &str) -> Result<(), CallError> {
        self.record(format!("remote:{}", sdp));
        self.remote_set = true;
        Ok(())
    }

    async fn create_answer(&mut self) -> Result<String, CallError> {
        if !self.remote_set {
            return Err(CallError::Negotiation("no remote offer".to_string()));
        }
        self.record("create_answer".to_string());
        Ok("sdp-answer".to_string())
    }

    async fn apply_candidate(&mut self, candidate: &str) -> Result<(), CallError> {
        self.record(format!("candidate:{}", candidate));
        Ok(())
    }

    async fn restart(&mut self) -> Result<(), CallError> {
        self.record("restart".to_string());
        if self.restart_succeeds {
            Ok(())
        } else {
            Err(CallError::Connectivity("restart unsupported".to_string()))
        }
    }

    async fn close(&mut self) {
        self.record("close".to_string());
    }
}
