//! Configuration module for loading TOML config files.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RunError;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    pub model: ModelConfig,
    pub synthesis: SynthesisConfig,
    pub mix: MixConfig,
}

/// Language-model settings for script generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// OpenAI-compatible API base URL.
    pub api_base: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model used to script the quiz audio.
    pub model: String,
    /// Sampling temperature for the scripting call.
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            temperature: 0.7,
        }
    }
}

/// Endpoints and timeouts for the audio synthesis collaborators.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Base URL of the TTS service.
    pub tts_url: String,
    /// Timeout for one TTS request, in seconds.
    pub tts_timeout_secs: u64,
    /// URL of the generative-music service.
    pub music_url: String,
    /// API key for the generative-music service.
    pub music_api_key: String,
    /// Timeout for one music generation request, in seconds.
    pub music_timeout_secs: u64,
    /// Timeout for fetching a generated audio URL, in seconds.
    pub download_timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            tts_url: "http://localhost:5000/".to_string(),
            tts_timeout_secs: 30,
            music_url: "https://fal.run/fal-ai/stable-audio".to_string(),
            music_api_key: String::new(),
            music_timeout_secs: 120,
            download_timeout_secs: 60,
        }
    }
}

/// Mixing knobs for the assembly pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    /// Speaker voice ID passed to the TTS service.
    pub speaker_id: u32,
    /// How much quieter music under dialogue plays, in dB.
    pub overlay_reduction_db: f32,
    /// How much quieter the looping BGM plays, in dB. Larger than the
    /// overlay reduction since the BGM runs under everything.
    pub bgm_reduction_db: f32,
    /// Length of the generated BGM clip that gets looped, in seconds.
    pub bgm_clip_secs: u32,
    /// Where per-run scratch directories are created. Defaults to the
    /// system temp directory.
    pub scratch_root: Option<PathBuf>,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            speaker_id: 33,
            overlay_reduction_db: 20.0,
            bgm_reduction_db: 26.0,
            bgm_clip_secs: 30,
            scratch_root: None,
        }
    }
}

impl QuizConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RunError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| RunError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_toml_str(&content)
    }

    /// Load configuration from string content.
    pub fn from_toml_str(content: &str) -> Result<Self, RunError> {
        toml::from_str(content)
            .map_err(|e| RunError::Config(format!("Failed to parse config: {}", e)))
    }
}
