//! Prompt construction for the script-generation model.
//!
//! Pure string assembly: a [`ScriptRequest`] goes in, a system/user prompt
//! pair comes out. No I/O happens here.

/// Input for one quiz generation run.
#[derive(Debug, Clone)]
pub struct ScriptRequest {
    /// The dialogue script with track divisions.
    pub script: String,
    /// Optional theme (e.g., "Solar System").
    pub quiz_theme: Option<String>,
    /// Optional mood (e.g., "Playful").
    pub mood: Option<String>,
    /// Optional target age (e.g., "Children").
    pub target_age: Option<String>,
}

impl ScriptRequest {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            quiz_theme: None,
            mood: None,
            target_age: None,
        }
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.quiz_theme = Some(theme.into());
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn with_target_age(mut self, age: impl Into<String>) -> Self {
        self.target_age = Some(age.into());
        self
    }
}

/// A system/user prompt pair ready to send to the model.
#[derive(Debug, Clone)]
pub struct PromptPair {
    pub system_prompt: String,
    pub user_prompt: String,
}

/// Build the model request for a script. Deterministic; optional metadata
/// falls back to documented defaults.
pub fn build_prompt(request: &ScriptRequest) -> PromptPair {
    let quiz_theme = request.quiz_theme.as_deref().unwrap_or("Educational Quiz");
    let mood = request.mood.as_deref().unwrap_or("Playful and Engaging");
    let target_age = request.target_age.as_deref().unwrap_or("Children");

    let user_prompt = format!(
        r#"# Music and Sound Effects Generation for Educational Audio Quiz

## Script:
{script}

## Quiz Theme: {quiz_theme}
## Overall Mood: {mood}
## Target Audience: {target_age}

Create appropriate music and sound effects descriptions for each track in this audio quiz script. The music should enhance the educational experience while keeping the listeners engaged. Generate the response following the JSON structure provided in the system instructions.
"#,
        script = request.script,
    );

    PromptPair {
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_prompt,
    }
}

const SYSTEM_PROMPT: &str = r#"You are an expert audio designer specializing in creating music and sound effects for educational audio content.

Your task is to create appropriate music and sound effect descriptions for an audio quiz script based on the user's input. Follow these guidelines precisely:

1.  **Overall Background Music (BGM):**
    *   Create a description for consistent background music (BGM) that fits the provided theme, mood, and target audience.
    *   The BGM should be subtle enough not to overpower the dialogue but present enough to maintain engagement.
    *   Specify style, instrumentation, tempo (e.g., upbeat but gentle), and overall feeling.

2.  **Track-Specific Audio (`script` array):**
    *   The `script` key in the JSON output must contain a list of lists. Each inner list represents a "track" from the input script (corresponding to track_1, track_2, etc.).
    *   Each track (inner list) contains one or more dictionary objects representing audio events within that track.
    *   **Dialogue Event:** If an event includes dialogue, the dictionary MUST contain:
        *   `"dialogue"`: The exact dialogue text provided in the input script for that segment.
        *   `"music"`: A description of the background music or sound effect that should play *concurrently* with this specific dialogue line. This might be a continuation of the overall BGM, a variation, or a specific SFX cue.
    *   **Standalone Music/SFX Event:** If an event is purely musical or a sound effect without concurrent dialogue, the dictionary MUST contain:
        *   `"music"`: A description of the standalone music piece (e.g., intro jingle, thinking music, answer reveal fanfare) or sound effect (e.g., ticking clock, correct answer chime, transition swoosh).
        *   `"duration"`: An integer representing the duration of this standalone audio event in seconds. This key MUST NOT be present if the `"dialogue"` key is present.
    *   Ensure the audio described for each track element logically enhances the content (e.g., intro music, question background, thinking pause, result sounds).

3.  **Music/SFX Description Quality:**
    *   Descriptions must be specific and actionable for an audio generation system or sound designer. Mention style (e.g., light orchestral, quirky electronic, ambient), instruments (e.g., ukulele, synth pads, xylophone), tempo (e.g., allegro, lento), mood (e.g., mysterious, celebratory, focused), and specific SFX sounds (e.g., gentle 'ding', cartoon 'boing', futuristic 'whoosh').
    *   Keep the target audience and overall mood in mind for all descriptions.

4.  **Output Format:**
    *   You MUST reply ONLY with a valid JSON object.
    *   Do not include any explanatory text before or after the JSON object.
    *   The JSON object must strictly adhere to the structure exemplified below:
        ```json
        {
          "overall_bgm": "DESCRIPTION",
          "script": [
             [ {"dialogue": "TEXT", "music": "DESC"}, {"music": "DESC", "duration": N (mandtory)} ],
             [ {"music": "DESC", "duration": N} ]
          ]
        }

        THE DURATION IS MANDATORY IF YOU HAVE JUST THE MUSIC FIELD AS ELEMENT

        ```

REPLY ONLY AS A VALID JSON OBJECT.
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_when_metadata_absent() {
        let request = ScriptRequest::new("track_1:\n- Hello!");
        let prompts = build_prompt(&request);
        assert!(prompts.user_prompt.contains("Quiz Theme: Educational Quiz"));
        assert!(prompts.user_prompt.contains("Overall Mood: Playful and Engaging"));
        assert!(prompts.user_prompt.contains("Target Audience: Children"));
    }

    #[test]
    fn test_metadata_overrides_defaults() {
        let request = ScriptRequest::new("track_1:\n- Hello!")
            .with_theme("Solar System")
            .with_mood("Exciting")
            .with_target_age("8-12");
        let prompts = build_prompt(&request);
        assert!(prompts.user_prompt.contains("Quiz Theme: Solar System"));
        assert!(prompts.user_prompt.contains("Overall Mood: Exciting"));
        assert!(prompts.user_prompt.contains("Target Audience: 8-12"));
    }

    #[test]
    fn test_script_text_embedded_verbatim() {
        let request = ScriptRequest::new("track_1:\n- Welcome explorers!");
        let prompts = build_prompt(&request);
        assert!(prompts.user_prompt.contains("track_1:\n- Welcome explorers!"));
    }

    #[test]
    fn test_system_prompt_states_duration_rule() {
        let prompts = build_prompt(&ScriptRequest::new("x"));
        assert!(prompts
            .system_prompt
            .contains("THE DURATION IS MANDATORY IF YOU HAVE JUST THE MUSIC FIELD"));
        assert!(prompts.system_prompt.contains("valid JSON object"));
    }

    #[test]
    fn test_build_prompt_is_deterministic() {
        let request = ScriptRequest::new("track_1:\n- Hi").with_theme("Animals");
        let a = build_prompt(&request);
        let b = build_prompt(&request);
        assert_eq!(a.system_prompt, b.system_prompt);
        assert_eq!(a.user_prompt, b.user_prompt);
    }
}
