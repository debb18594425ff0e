//! Music and SFX synthesis via a generative-audio service.
//!
//! The service replies with JSON naming an audio file that is either a
//! base64 `data:` URI (decoded inline) or an HTTP URL (fetched with a
//! second request).

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::clip::AudioClip;
use crate::error::{RunError, SynthesisError};

/// Diffusion steps requested per generation.
const GENERATION_STEPS: u32 = 50;

/// Collaborator that turns a text prompt into a music/SFX clip of roughly
/// the requested duration. The result may run a fraction longer than asked;
/// callers must not assume exact-duration output.
#[async_trait]
pub trait MusicSource: Send + Sync {
    async fn synthesize(
        &self,
        prompt: &str,
        duration_secs: u32,
    ) -> Result<AudioClip, SynthesisError>;
}

#[derive(Debug, Serialize)]
struct MusicRequest<'a> {
    prompt: &'a str,
    seconds_total: u32,
    steps: u32,
}

#[derive(Debug, Deserialize)]
struct MusicResponse {
    audio_file: Option<AudioFile>,
}

#[derive(Debug, Deserialize)]
struct AudioFile {
    url: String,
}

/// HTTP client for the generative-music service.
pub struct MusicClient {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
    download_client: reqwest::Client,
}

impl MusicClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        request_timeout: Duration,
        download_timeout: Duration,
    ) -> Result<Self, RunError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RunError::Config(format!("Failed to create HTTP client: {}", e)))?;

        // Generated audio is hosted separately; the fetch has its own timeout.
        let download_client = reqwest::Client::builder()
            .timeout(download_timeout)
            .build()
            .map_err(|e| RunError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            client,
            download_client,
        })
    }

    async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>, SynthesisError> {
        let response = self
            .download_client
            .get(url)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl MusicSource for MusicClient {
    async fn synthesize(
        &self,
        prompt: &str,
        duration_secs: u32,
    ) -> Result<AudioClip, SynthesisError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Key {}", self.api_key))
            .json(&MusicRequest {
                prompt,
                seconds_total: duration_secs,
                steps: GENERATION_STEPS,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: MusicResponse = response.json().await.map_err(|e| {
            SynthesisError::Transport(format!("music service reply was not valid JSON: {}", e))
        })?;

        let url = body.audio_file.map(|f| f.url).ok_or_else(|| {
            SynthesisError::Transport("music service reply named no audio file".to_string())
        })?;

        let bytes = if url.starts_with("data:") {
            decode_data_uri(&url)?
        } else {
            self.fetch_audio(&url).await?
        };

        AudioClip::from_wav_bytes(&bytes).map_err(|e| {
            SynthesisError::Transport(format!("generated audio was not a playable WAV: {}", e))
        })
    }
}

/// Decode the payload of a `data:[<mediatype>][;base64],<data>` URI.
fn decode_data_uri(uri: &str) -> Result<Vec<u8>, SynthesisError> {
    let payload = uri
        .split_once(',')
        .map(|(_, data)| data)
        .ok_or_else(|| SynthesisError::Transport("malformed data URI".to_string()))?;

    BASE64
        .decode(payload)
        .map_err(|e| SynthesisError::Transport(format!("could not decode inline audio: {}", e)))
}
