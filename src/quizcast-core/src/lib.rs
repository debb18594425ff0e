//! QuizCast Core Library
//!
//! Orchestrates generation of multi-track audio quizzes: prompts a language
//! model for a structured audio script, synthesizes dialogue and music via
//! remote services, and composites everything into mixed audio output.

pub mod assemble;
pub mod clip;
pub mod config;
pub mod error;
pub mod music;
pub mod prompt;
pub mod script;
pub mod scriptgen;
pub mod tts;

pub use assemble::{Assembler, Assembly};
pub use clip::AudioClip;
pub use config::{MixConfig, ModelConfig, QuizConfig, SynthesisConfig};
pub use error::{RunError, SynthesisError};
pub use music::{MusicClient, MusicSource};
pub use prompt::{PromptPair, ScriptRequest, build_prompt};
pub use script::{AudioScript, Event, Track};
pub use scriptgen::ScriptGenerator;
pub use tts::{DialogueSource, TtsClient};
