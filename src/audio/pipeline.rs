use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::chunker::{AudioChunker, ChunkerConfig};
use super::frame::{pcm_bytes, quantize, AudioFrame};
use crate::signaling::SignalSink;

/// Streams voice-activity-gated utterance chunks from a capture source to the
/// audio processor.
///
/// Runs independently of call negotiation: it only needs a stable
/// participant/room identity, not peer connectivity. Frames are consumed in
/// capture order, so chunk emission is monotonic in time.
pub struct ChunkPipeline {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ChunkPipeline {
    /// Spawn the pipeline task over a capture receiver.
    pub fn spawn(
        mut frames: mpsc::Receiver<AudioFrame>,
        config: ChunkerConfig,
        sink: Arc<dyn SignalSink>,
        participant_id: String,
        room: String,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = tokio::spawn(async move {
            info!("Audio chunk pipeline started for {}", participant_id);

            let gain = config.gain;
            let mut chunker = AudioChunker::new(config);
            let mut emitted = 0usize;

            while let Some(frame) = frames.recv().await {
                if stop_flag.load(Ordering::SeqCst) {
                    break;
                }

                let samples = quantize(&frame.samples, gain);

                if let Some(chunk) = chunker.push_frame(&samples) {
                    emitted += 1;

                    // Fire-and-forget: a lost chunk never stalls capture
                    if let Err(e) = sink
                        .send_chunk(
                            &participant_id,
                            &room,
                            &pcm_bytes(&chunk),
                            frame.sample_rate,
                            frame.channels,
                        )
                        .await
                    {
                        error!("Failed to publish audio chunk: {}", e);
                    }
                }
            }

            info!(
                "Audio chunk pipeline stopped for {} ({} chunks emitted)",
                participant_id, emitted
            );
        });

        Self { stop, handle }
    }

    /// Signal the task to stop and wait for it to finish. The capture source
    /// must be stopped (its sender dropped) first so the frame channel
    /// closes.
    pub async fn shutdown(self) {
        self.stop.store(true, Ordering::SeqCst);
        let _ = self.handle.await;
    }
}
