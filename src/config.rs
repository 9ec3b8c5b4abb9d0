use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub signaling: SignalingConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub ice: IceConfig,
}

#[derive(Debug, Deserialize)]
pub struct SignalingConfig {
    /// NATS relay URL, e.g. "nats://localhost:4222"
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Amplitude above which a frame counts as voiced
    pub silence_threshold: i16,
    /// Consecutive silent frames that close an utterance
    pub max_trailing_silence_frames: usize,
    /// Gain applied before quantization
    pub gain: f32,
}

#[derive(Debug, Deserialize)]
pub struct IceConfig {
    pub stun_servers: Vec<String>,
    pub candidate_pool_size: u8,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            silence_threshold: 500,
            max_trailing_silence_frames: 10,
            gain: 1.5,
        }
    }
}

impl Default for IceConfig {
    fn default() -> Self {
        Self {
            stun_servers: vec![
                "stun:stun.l.google.com:19302".to_string(),
                "stun:stun1.l.google.com:19302".to_string(),
                "stun:stun2.l.google.com:19302".to_string(),
                "stun:stun3.l.google.com:19302".to_string(),
            ],
            candidate_pool_size: 10,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
