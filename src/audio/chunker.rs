//! Voice-activity gate and utterance assembly.
//!
//! Utterance boundaries are inferred purely from short-term energy: a frame
//! is voiced if any sample's magnitude exceeds the silence threshold. This
//! trades false positives (background noise produces a short useless chunk)
//! for low latency and no dependency on an external VAD model.

use tracing::debug;

/// Tuning for the voice-activity gate.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Amplitude above which a frame counts as voiced
    pub silence_threshold: i16,
    /// Consecutive silent frames that close an utterance. At ~78ms per
    /// 2048-sample frame at 16kHz/mono cadence, the default of 10 keeps a
    /// normal pause between sentences inside one chunk.
    pub max_trailing_silence_frames: usize,
    /// Gain applied before quantization
    pub gain: f32,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            silence_threshold: 500,
            max_trailing_silence_frames: 10,
            gain: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActivityState {
    Silent,
    Recording,
}

/// Assembles voice-activity-bounded utterance chunks from quantized frames.
///
/// A chunk is emitted iff the buffer is non-empty and the trailing-silence
/// counter reaches the configured threshold while recording; emission clears
/// the buffer and returns to `Silent`.
pub struct AudioChunker {
    config: ChunkerConfig,
    state: ActivityState,
    sample_buffer: Vec<i16>,
    trailing_silence: usize,
}

impl AudioChunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self {
            config,
            state: ActivityState::Silent,
            sample_buffer: Vec::new(),
            trailing_silence: 0,
        }
    }

    /// Feed one quantized frame; returns a completed utterance chunk when the
    /// trailing-silence threshold closes one.
    pub fn push_frame(&mut self, frame: &[i16]) -> Option<Vec<i16>> {
        let threshold = self.config.silence_threshold as i32;
        let voiced = frame.iter().any(|&s| (s as i32).abs() > threshold);

        if voiced {
            if self.state == ActivityState::Silent {
                self.state = ActivityState::Recording;
                self.sample_buffer.clear();
                self.trailing_silence = 0;
            }
            self.sample_buffer.extend_from_slice(frame);
            self.trailing_silence = 0;
            return None;
        }

        if self.state != ActivityState::Recording {
            return None;
        }

        self.trailing_silence += 1;

        if self.trailing_silence >= self.config.max_trailing_silence_frames {
            let chunk = std::mem::take(&mut self.sample_buffer);
            self.state = ActivityState::Silent;
            self.trailing_silence = 0;

            if chunk.is_empty() {
                return None;
            }

            debug!("Utterance chunk complete ({} samples)", chunk.len());
            return Some(chunk);
        }

        // Keep accumulating through short silence to capture trailing syllables
        self.sample_buffer.extend_from_slice(frame);
        None
    }

    /// Whether an utterance is currently being recorded.
    pub fn is_recording(&self) -> bool {
        self.state == ActivityState::Recording
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voiced(config: &ChunkerConfig) -> Vec<i16> {
        vec![config.silence_threshold + 100; 8]
    }

    fn silent() -> Vec<i16> {
        vec![0i16; 8]
    }

    #[test]
    fn test_all_silence_emits_nothing() {
        let mut chunker = AudioChunker::new(ChunkerConfig::default());
        for _ in 0..100 {
            assert!(chunker.push_frame(&silent()).is_none());
        }
        assert!(!chunker.is_recording());
    }

    #[test]
    fn test_chunk_emitted_after_trailing_silence() {
        let config = ChunkerConfig {
            max_trailing_silence_frames: 3,
            ..Default::default()
        };
        let v = voiced(&config);
        let mut chunker = AudioChunker::new(config);

        assert!(chunker.push_frame(&v).is_none());
        assert!(chunker.push_frame(&silent()).is_none());
        assert!(chunker.push_frame(&silent()).is_none());

        let chunk = chunker.push_frame(&silent()).expect("chunk should close");
        // Voiced frame plus the two silent frames appended below threshold
        assert_eq!(chunk.len(), 24);
        assert!(!chunker.is_recording());
    }

    #[test]
    fn test_voiced_frame_resets_trailing_count() {
        let config = ChunkerConfig {
            max_trailing_silence_frames: 3,
            ..Default::default()
        };
        let v = voiced(&config);
        let mut chunker = AudioChunker::new(config);

        chunker.push_frame(&v);
        chunker.push_frame(&silent());
        chunker.push_frame(&silent());
        // Speech resumes before the threshold: utterance continues
        assert!(chunker.push_frame(&v).is_none());
        assert!(chunker.is_recording());

        chunker.push_frame(&silent());
        chunker.push_frame(&silent());
        let chunk = chunker.push_frame(&silent()).expect("chunk should close");
        // Two voiced frames and four sub-threshold silent frames
        assert_eq!(chunk.len(), 48);
    }
}
