//! The audio assembly pipeline.
//!
//! Walks a validated [`AudioScript`] one track and one event at a time,
//! dispatches each event to the dialogue and music collaborators, and
//! concatenates the results into the final mix. Event-level failures degrade
//! the run but never abort it; the pipeline always produces as much audio
//! as it can.

use std::path::Path;

use crate::clip::AudioClip;
use crate::config::MixConfig;
use crate::error::RunError;
use crate::music::MusicSource;
use crate::script::{AudioScript, Event};
use crate::tts::DialogueSource;

/// Output of one assembly run.
#[derive(Debug)]
pub struct Assembly {
    /// All tracks concatenated in script order.
    pub main_mix: AudioClip,
    /// The main mix with looping background music underneath, when the
    /// script described BGM and its synthesis succeeded.
    pub bgm_mix: Option<AudioClip>,
    /// True when at least one event-level synthesis step failed.
    pub degraded: bool,
    /// Human-readable notes on every skipped or degraded event.
    pub diagnostics: Vec<String>,
}

/// Drives the assembly of one script into mixed audio.
pub struct Assembler<'a> {
    dialogue: &'a dyn DialogueSource,
    music: &'a dyn MusicSource,
    config: &'a MixConfig,
}

impl<'a> Assembler<'a> {
    pub fn new(
        dialogue: &'a dyn DialogueSource,
        music: &'a dyn MusicSource,
        config: &'a MixConfig,
    ) -> Self {
        Self {
            dialogue,
            music,
            config,
        }
    }

    /// Assemble the whole script into a main mix and an optional BGM mix.
    ///
    /// Intermediate per-event clips are written into a scratch directory
    /// scoped to this run; the directory is removed on every exit path.
    pub async fn assemble(&self, script: &AudioScript) -> Result<Assembly, RunError> {
        let scratch = match &self.config.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                tempfile::Builder::new().prefix("quizcast-run").tempdir_in(root)?
            }
            None => tempfile::Builder::new().prefix("quizcast-run").tempdir()?,
        };

        // Dropping `scratch` removes the run directory no matter how we exit.
        self.assemble_in(script, scratch.path()).await
    }

    async fn assemble_in(
        &self,
        script: &AudioScript,
        scratch: &Path,
    ) -> Result<Assembly, RunError> {
        let mut main_mix: Option<AudioClip> = None;
        let mut degraded = false;
        let mut diagnostics = Vec::new();

        for (track_idx, track) in script.tracks.iter().enumerate() {
            let mut track_buf: Option<AudioClip> = None;

            for (event_idx, event) in track.events.iter().enumerate() {
                match event {
                    Event::Dialogue { dialogue, music } => {
                        let mut clip = match self
                            .dialogue
                            .synthesize(dialogue, self.config.speaker_id)
                            .await
                        {
                            Ok(clip) => clip,
                            Err(e) => {
                                degraded = true;
                                diagnostics.push(format!(
                                    "track {track_idx} event {event_idx}: dialogue synthesis failed, skipping event: {e}"
                                ));
                                continue;
                            }
                        };

                        // The music service only accepts whole seconds, so
                        // round the measured dialogue duration up.
                        let music_secs = clip.duration_ms().div_ceil(1000) as u32;

                        match self.music.synthesize(music, music_secs).await {
                            Ok(mut music_clip) => {
                                music_clip.apply_gain_db(-self.config.overlay_reduction_db);
                                clip.overlay(&music_clip);
                            }
                            Err(e) => {
                                degraded = true;
                                diagnostics.push(format!(
                                    "track {track_idx} event {event_idx}: music synthesis failed, keeping dialogue only: {e}"
                                ));
                            }
                        }

                        persist_clip(scratch, track_idx, event_idx, &clip)?;
                        append_to(&mut track_buf, clip);
                    }
                    Event::Standalone {
                        music,
                        duration_secs,
                    } => match self.music.synthesize(music, *duration_secs).await {
                        Ok(clip) => {
                            persist_clip(scratch, track_idx, event_idx, &clip)?;
                            append_to(&mut track_buf, clip);
                        }
                        Err(e) => {
                            degraded = true;
                            diagnostics.push(format!(
                                "track {track_idx} event {event_idx}: music synthesis failed, skipping event: {e}"
                            ));
                        }
                    },
                    Event::Invalid { reason } => {
                        diagnostics.push(format!(
                            "track {track_idx} event {event_idx}: skipping invalid event: {reason}"
                        ));
                    }
                }
            }

            if let Some(buf) = track_buf {
                append_to(&mut main_mix, buf);
            }
        }

        let main_mix = main_mix.ok_or(RunError::EmptyMix)?;

        let bgm_mix = match &script.overall_bgm {
            Some(description) => {
                match self
                    .music
                    .synthesize(description, self.config.bgm_clip_secs)
                    .await
                {
                    Ok(bgm) if bgm.duration_ms() > 0 => {
                        let loops = main_mix.duration_ms().div_ceil(bgm.duration_ms());
                        let mut looped = bgm.repeated(loops as u32);
                        looped.truncate_to_ms(main_mix.duration_ms());
                        looped.apply_gain_db(-self.config.bgm_reduction_db);

                        let mut mixed = main_mix.clone();
                        mixed.overlay(&looped);
                        Some(mixed)
                    }
                    Ok(_) => {
                        degraded = true;
                        diagnostics
                            .push("background music clip came back empty, skipping BGM mix".to_string());
                        None
                    }
                    Err(e) => {
                        degraded = true;
                        diagnostics.push(format!(
                            "background music synthesis failed, skipping BGM mix: {e}"
                        ));
                        None
                    }
                }
            }
            None => None,
        };

        Ok(Assembly {
            main_mix,
            bgm_mix,
            degraded,
            diagnostics,
        })
    }
}

/// Write one produced event clip into the run's scratch directory. A write
/// failure here is run-scoped storage trouble, not an event-level hiccup.
fn persist_clip(
    scratch: &Path,
    track_idx: usize,
    event_idx: usize,
    clip: &AudioClip,
) -> Result<(), RunError> {
    let path = scratch.join(format!("track{track_idx:02}_event{event_idx:02}.wav"));
    clip.save_wav(path)?;
    Ok(())
}

fn append_to(buffer: &mut Option<AudioClip>, clip: AudioClip) {
    match buffer {
        Some(buf) => buf.append(&clip),
        None => *buffer = Some(clip),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SynthesisError;
    use crate::script::Track;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // 1000 Hz keeps durations exact: one sample per millisecond.
    const RATE: u32 = 1000;

    struct StubDialogue {
        duration_ms: u64,
    }

    #[async_trait]
    impl DialogueSource for StubDialogue {
        async fn synthesize(
            &self,
            _text: &str,
            _speaker_id: u32,
        ) -> Result<AudioClip, SynthesisError> {
            Ok(AudioClip::silent(self.duration_ms, RATE))
        }
    }

    struct FailingDialogue;

    #[async_trait]
    impl DialogueSource for FailingDialogue {
        async fn synthesize(
            &self,
            _text: &str,
            _speaker_id: u32,
        ) -> Result<AudioClip, SynthesisError> {
            Err(SynthesisError::Timeout)
        }
    }

    /// Returns exactly the requested duration and records every request.
    struct StubMusic {
        requests: Mutex<Vec<u32>>,
    }

    impl StubMusic {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MusicSource for StubMusic {
        async fn synthesize(
            &self,
            _prompt: &str,
            duration_secs: u32,
        ) -> Result<AudioClip, SynthesisError> {
            self.requests.lock().unwrap().push(duration_secs);
            Ok(AudioClip::silent(duration_secs as u64 * 1000, RATE))
        }
    }

    struct FailingMusic;

    #[async_trait]
    impl MusicSource for FailingMusic {
        async fn synthesize(
            &self,
            _prompt: &str,
            _duration_secs: u32,
        ) -> Result<AudioClip, SynthesisError> {
            Err(SynthesisError::Service { status: 503 })
        }
    }

    fn dialogue_event(text: &str) -> Event {
        Event::Dialogue {
            dialogue: text.to_string(),
            music: "soft pad".to_string(),
        }
    }

    fn standalone_event(secs: u32) -> Event {
        Event::Standalone {
            music: "chime".to_string(),
            duration_secs: secs,
        }
    }

    fn script_of(tracks: Vec<Vec<Event>>) -> AudioScript {
        AudioScript {
            overall_bgm: None,
            tracks: tracks
                .into_iter()
                .map(|events| Track { events })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_dialogue_duration_rounds_music_request_up() {
        let dialogue = StubDialogue { duration_ms: 4200 };
        let music = StubMusic::new();
        let config = MixConfig::default();
        let assembler = Assembler::new(&dialogue, &music, &config);

        let script = script_of(vec![vec![dialogue_event("hi")]]);
        let result = assembler.assemble(&script).await.unwrap();

        assert_eq!(music.requested(), vec![5]);
        // Overlay never stretches past the dialogue.
        assert_eq!(result.main_mix.duration_ms(), 4200);
        assert!(!result.degraded);
    }

    #[tokio::test]
    async fn test_music_failure_falls_back_to_dialogue_only() {
        let dialogue = StubDialogue { duration_ms: 3000 };
        let music = FailingMusic;
        let config = MixConfig::default();
        let assembler = Assembler::new(&dialogue, &music, &config);

        let script = script_of(vec![vec![dialogue_event("hi")]]);
        let result = assembler.assemble(&script).await.unwrap();

        assert_eq!(result.main_mix.duration_ms(), 3000);
        assert!(result.degraded);
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn test_dialogue_failure_skips_event_but_not_track() {
        let dialogue = FailingDialogue;
        let music = StubMusic::new();
        let config = MixConfig::default();
        let assembler = Assembler::new(&dialogue, &music, &config);

        let script = script_of(vec![vec![dialogue_event("hi"), standalone_event(2)]]);
        let result = assembler.assemble(&script).await.unwrap();

        assert_eq!(result.main_mix.duration_ms(), 2000);
        assert!(result.degraded);
    }

    #[tokio::test]
    async fn test_tracks_concatenate_in_order() {
        let dialogue = StubDialogue { duration_ms: 1000 };
        let music = StubMusic::new();
        let config = MixConfig::default();
        let assembler = Assembler::new(&dialogue, &music, &config);

        let script = script_of(vec![
            vec![dialogue_event("a"), standalone_event(3)],
            vec![standalone_event(2)],
        ]);
        let result = assembler.assemble(&script).await.unwrap();

        // 1000 + 3000 + 2000, in script order.
        assert_eq!(result.main_mix.duration_ms(), 6000);
        assert_eq!(music.requested(), vec![1, 3, 2]);
    }

    #[tokio::test]
    async fn test_invalid_event_contributes_nothing_and_one_diagnostic() {
        let dialogue = StubDialogue { duration_ms: 1000 };
        let music = StubMusic::new();
        let config = MixConfig::default();
        let assembler = Assembler::new(&dialogue, &music, &config);

        let script = script_of(vec![vec![
            Event::Invalid {
                reason: "duration must be a positive integer, got 0".to_string(),
            },
            standalone_event(2),
        ]]);
        let result = assembler.assemble(&script).await.unwrap();

        assert_eq!(result.main_mix.duration_ms(), 2000);
        assert_eq!(result.diagnostics.len(), 1);
        assert!(!result.degraded);
    }

    #[tokio::test]
    async fn test_bgm_loops_and_trims_to_main_mix_length() {
        let dialogue = StubDialogue { duration_ms: 1000 };
        let music = StubMusic::new();
        let config = MixConfig::default();
        let assembler = Assembler::new(&dialogue, &music, &config);

        let mut script = script_of(vec![vec![standalone_event(125)]]);
        script.overall_bgm = Some("gentle ukulele loop".to_string());

        let result = assembler.assemble(&script).await.unwrap();

        assert_eq!(result.main_mix.duration_ms(), 125_000);
        let bgm_mix = result.bgm_mix.expect("BGM mix should be present");
        assert_eq!(bgm_mix.duration_ms(), 125_000);
        // One 125 s standalone request plus the 30 s BGM clip.
        assert_eq!(music.requested(), vec![125, 30]);
    }

    #[tokio::test]
    async fn test_bgm_failure_leaves_main_mix_intact() {
        let dialogue = StubDialogue { duration_ms: 2000 };
        let music = FailingMusic;
        let config = MixConfig::default();
        let assembler = Assembler::new(&dialogue, &music, &config);

        let mut script = script_of(vec![vec![dialogue_event("hi")]]);
        script.overall_bgm = Some("gentle pad".to_string());

        let result = assembler.assemble(&script).await.unwrap();
        assert_eq!(result.main_mix.duration_ms(), 2000);
        assert!(result.bgm_mix.is_none());
        assert!(result.degraded);
    }

    #[tokio::test]
    async fn test_empty_script_is_a_run_error() {
        let dialogue = StubDialogue { duration_ms: 1000 };
        let music = StubMusic::new();
        let config = MixConfig::default();
        let assembler = Assembler::new(&dialogue, &music, &config);

        let script = script_of(vec![]);
        let err = assembler.assemble(&script).await.unwrap_err();
        assert!(matches!(err, RunError::EmptyMix));
    }

    #[tokio::test]
    async fn test_all_events_failing_is_a_run_error() {
        let dialogue = FailingDialogue;
        let music = FailingMusic;
        let config = MixConfig::default();
        let assembler = Assembler::new(&dialogue, &music, &config);

        let script = script_of(vec![vec![dialogue_event("hi"), standalone_event(2)]]);
        let err = assembler.assemble(&script).await.unwrap_err();
        assert!(matches!(err, RunError::EmptyMix));
    }

    #[tokio::test]
    async fn test_scratch_directory_removed_on_success_and_failure() {
        let root = tempfile::tempdir().unwrap();
        let dialogue = StubDialogue { duration_ms: 1000 };
        let music = StubMusic::new();
        let config = MixConfig {
            scratch_root: Some(root.path().to_path_buf()),
            ..MixConfig::default()
        };
        let assembler = Assembler::new(&dialogue, &music, &config);

        let script = script_of(vec![vec![dialogue_event("hi")]]);
        assembler.assemble(&script).await.unwrap();
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);

        // A failing run cleans up too.
        let err_script = script_of(vec![]);
        assembler.assemble(&err_script).await.unwrap_err();
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
