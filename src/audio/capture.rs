use tokio::sync::mpsc;

use super::frame::AudioFrame;
use crate::error::CallError;

/// Audio capture seam.
///
/// A source delivers fixed-size frames on a fixed cadence through the
/// returned channel. Failure to acquire the source is terminal: the source
/// never retries internally, and the session owner must abort setup before
/// any envelope is sent.
#[async_trait::async_trait]
pub trait CaptureSource: Send + Sync {
    /// Start capturing audio.
    ///
    /// Returns a channel receiver that will receive audio frames.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CallError>;

    /// Stop capturing audio.
    async fn stop(&mut self);

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// In-process capture source. Acquisition always succeeds; frames arrive
/// only if a feeder pushes them through the handle returned by `start`.
/// Real microphone capture is an external collaborator wired by integrators.
pub struct ScriptedCapture {
    tx: Option<mpsc::Sender<AudioFrame>>,
    capacity: usize,
}

impl ScriptedCapture {
    pub fn new(capacity: usize) -> Self {
        Self {
            tx: None,
            capacity,
        }
    }

    /// Sender for pushing frames into the capture stream. `None` before
    /// `start` or after `stop`.
    pub fn sender(&self) -> Option<mpsc::Sender<AudioFrame>> {
        self.tx.clone()
    }
}

#[async_trait::async_trait]
impl CaptureSource for ScriptedCapture {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CallError> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.tx = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) {
        self.tx = None;
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Capture source that always fails to acquire, modeling denied microphone
/// permission.
pub struct DeniedCapture;

#[async_trait::async_trait]
impl CaptureSource for DeniedCapture {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CallError> {
        Err(CallError::Capture("microphone access denied".to_string()))
    }

    async fn stop(&mut self) {}

    fn name(&self) -> &str {
        "denied"
    }
}
