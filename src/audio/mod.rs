//! Audio capture seam, voice-activity gating, and the outbound chunk pipeline.

pub mod capture;
pub mod chunker;
pub mod frame;
pub mod pipeline;

pub use capture::{CaptureSource, DeniedCapture, ScriptedCapture};
pub use chunker::{AudioChunker, ChunkerConfig};
pub use frame::{pcm_bytes, quantize, AudioFrame};
pub use pipeline::ChunkPipeline;
