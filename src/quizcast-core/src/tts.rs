//! Dialogue synthesis via a remote TTS service.

use std::time::Duration;

use async_trait::async_trait;

use crate::clip::AudioClip;
use crate::error::{RunError, SynthesisError};

/// Collaborator that turns one line of text into a spoken audio clip.
#[async_trait]
pub trait DialogueSource: Send + Sync {
    async fn synthesize(&self, text: &str, speaker_id: u32) -> Result<AudioClip, SynthesisError>;
}

/// HTTP client for the TTS service. One synchronous call per line, no
/// batching.
pub struct TtsClient {
    base_url: String,
    client: reqwest::Client,
}

impl TtsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RunError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RunError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

#[async_trait]
impl DialogueSource for TtsClient {
    async fn synthesize(&self, text: &str, speaker_id: u32) -> Result<AudioClip, SynthesisError> {
        let speaker = speaker_id.to_string();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("text", text), ("speaker_id", speaker.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;

        AudioClip::from_wav_bytes(&bytes).map_err(|e| {
            SynthesisError::Transport(format!("TTS reply was not a playable WAV stream: {}", e))
        })
    }
}
