//! The validated audio script produced by the language model.
//!
//! Event shapes are classified once, at parse time. Anything that matches
//! neither known shape becomes [`Event::Invalid`] and is skipped with a
//! diagnostic during assembly instead of aborting the run.

use serde::Deserialize;
use serde_json::Value;

use crate::error::RunError;

/// One audio-producing unit within a track.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A spoken line with concurrent background music or SFX.
    Dialogue { dialogue: String, music: String },
    /// Standalone music or SFX with an explicit duration in whole seconds.
    Standalone { music: String, duration_secs: u32 },
    /// An object matching neither shape; skipped with a diagnostic.
    Invalid { reason: String },
}

impl Event {
    /// Classify one raw JSON event object into a closed variant.
    fn classify(value: &Value) -> Event {
        let Some(obj) = value.as_object() else {
            return Event::Invalid {
                reason: "event is not a JSON object".to_string(),
            };
        };

        let dialogue = obj.get("dialogue").and_then(Value::as_str);
        let music = obj.get("music").and_then(Value::as_str);

        match (dialogue, music) {
            (Some(dialogue), Some(music)) => Event::Dialogue {
                dialogue: dialogue.to_string(),
                music: music.to_string(),
            },
            (Some(_), None) => Event::Invalid {
                reason: "dialogue event is missing its music description".to_string(),
            },
            (None, Some(music)) => {
                if obj.contains_key("dialogue") {
                    return Event::Invalid {
                        reason: "dialogue field is present but is not a string".to_string(),
                    };
                }
                match obj.get("duration") {
                    Some(raw) => match raw.as_u64().and_then(|d| u32::try_from(d).ok()) {
                        Some(duration_secs) if duration_secs > 0 => Event::Standalone {
                            music: music.to_string(),
                            duration_secs,
                        },
                        _ => Event::Invalid {
                            reason: format!("duration must be a positive integer, got {raw}"),
                        },
                    },
                    None => Event::Invalid {
                        reason: "standalone music event is missing its duration".to_string(),
                    },
                }
            }
            (None, None) => Event::Invalid {
                reason: "event has neither dialogue nor music".to_string(),
            },
        }
    }
}

/// An ordered group of events; playback order is meaningful.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub events: Vec<Event>,
}

/// The validated model output: per-track events plus an optional description
/// of background music for the whole program.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioScript {
    pub overall_bgm: Option<String>,
    pub tracks: Vec<Track>,
}

/// Wire shape of the model reply, before event classification.
#[derive(Debug, Deserialize)]
struct RawScript {
    #[serde(default)]
    overall_bgm: Option<String>,
    script: Vec<Vec<Value>>,
}

impl AudioScript {
    /// Parse and validate a model reply.
    ///
    /// Fails with [`RunError::MalformedResponse`] when the reply is not JSON
    /// or lacks a `script` sequence-of-sequences; a parse failure never
    /// yields a partially-filled script.
    pub fn from_json(content: &str) -> Result<Self, RunError> {
        let raw: RawScript = serde_json::from_str(content)
            .map_err(|e| RunError::MalformedResponse(e.to_string()))?;

        let tracks = raw
            .script
            .iter()
            .map(|events| Track {
                events: events.iter().map(Event::classify).collect(),
            })
            .collect();

        Ok(Self {
            overall_bgm: raw.overall_bgm,
            tracks,
        })
    }

    /// Number of events across all tracks, invalid ones included.
    pub fn event_count(&self) -> usize {
        self.tracks.iter().map(|t| t.events.len()).sum()
    }
}
