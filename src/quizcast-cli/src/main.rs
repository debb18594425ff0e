//! QuizCast CLI - Audio Quiz Generator
//!
//! A command-line tool that turns a free-form quiz script into a fully
//! mixed audio program with synthesized dialogue, music cues, and optional
//! looping background music.

use clap::Parser;
use colored::Colorize;
use quizcast_core::{
    Assembler, MusicClient, QuizConfig, RunError, ScriptRequest, ScriptGenerator, TtsClient,
    build_prompt,
};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "quizcast",
    version,
    about = "Audio Quiz Generator - script, voice, and mix a quiz with AI",
    long_about = "A CLI tool that asks a language model to script an audio quiz, \
synthesizes dialogue and music via remote services, and composites the result \
into mixed WAV output."
)]
struct Cli {
    /// Path to the quiz script file (track_1:, track_2:, ... sections)
    #[arg(value_name = "SCRIPT_FILE")]
    script: Option<PathBuf>,

    /// Inline script text instead of a file
    #[arg(short, long, value_name = "TEXT", conflicts_with = "script")]
    text: Option<String>,

    /// Quiz theme (e.g., "Solar System Exploration")
    #[arg(long, value_name = "THEME")]
    theme: Option<String>,

    /// Overall mood (e.g., "Exciting and Educational")
    #[arg(long, value_name = "MOOD")]
    mood: Option<String>,

    /// Target audience (e.g., "Children (8-12 years)")
    #[arg(long, value_name = "AGE")]
    age: Option<String>,

    /// Directory for the exported audio files
    #[arg(short, long, default_value = "output", value_name = "DIR")]
    output_dir: PathBuf,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Language model used to script the audio
    #[arg(short, long, value_name = "MODEL")]
    model: Option<String>,
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), RunError> {
    let mut config = match &cli.config {
        Some(path) => QuizConfig::load(path)?,
        None => QuizConfig::default(),
    };

    apply_env_overrides(&mut config);

    if let Some(model) = cli.model {
        config.model.model = model;
    }

    if config.model.api_key.is_empty() {
        eprintln!(
            "{}",
            "Warning: OPENAI_API_KEY not set. Script generation may fail.".yellow()
        );
    }

    // Read the raw script
    let script_text = match (&cli.script, &cli.text) {
        (Some(path), _) => std::fs::read_to_string(path)?,
        (None, Some(text)) => text.clone(),
        (None, None) => {
            return Err(RunError::Request(
                "either a script file or --text must be provided".to_string(),
            ));
        }
    };

    if script_text.trim().is_empty() {
        return Err(RunError::Request("the quiz script is empty".to_string()));
    }

    let mut request = ScriptRequest::new(script_text);
    if let Some(theme) = cli.theme {
        request = request.with_theme(theme);
    }
    if let Some(mood) = cli.mood {
        request = request.with_mood(mood);
    }
    if let Some(age) = cli.age {
        request = request.with_target_age(age);
    }

    // Print header
    println!();
    println!("{}", "═".repeat(70).bright_blue());
    println!(
        "{}",
        format!("  {} - Audio Quiz Generator", "QuizCast".bold())
            .bright_blue()
            .bold()
    );
    println!("{}", "═".repeat(70).bright_blue());
    println!();
    println!(
        "{} {}",
        "Theme:".bold(),
        request.quiz_theme.as_deref().unwrap_or("Educational Quiz")
    );
    println!(
        "{} {}",
        "Model:".bold(),
        config.model.model.as_str().dimmed()
    );
    println!();

    // 1. Prompt the model for the structured audio script
    println!("{}", "▶ Scripting audio events...".bright_cyan());
    let prompts = build_prompt(&request);
    let generator = ScriptGenerator::new(config.model.clone());
    let script = generator.generate(&prompts).await?;

    println!(
        "  {} tracks, {} events{}",
        script.tracks.len(),
        script.event_count(),
        if script.overall_bgm.is_some() {
            ", with background music"
        } else {
            ""
        }
    );

    // 2. Assemble the mix
    println!("{}", "▶ Synthesizing and mixing audio...".bright_cyan());
    let tts = TtsClient::new(
        config.synthesis.tts_url.clone(),
        Duration::from_secs(config.synthesis.tts_timeout_secs),
    )?;
    let music = MusicClient::new(
        config.synthesis.music_url.clone(),
        config.synthesis.music_api_key.clone(),
        Duration::from_secs(config.synthesis.music_timeout_secs),
        Duration::from_secs(config.synthesis.download_timeout_secs),
    )?;

    let assembler = Assembler::new(&tts, &music, &config.mix);
    let assembly = assembler.assemble(&script).await?;

    for diagnostic in &assembly.diagnostics {
        eprintln!("  {} {}", "!".yellow().bold(), diagnostic.yellow());
    }

    // 3. Export
    std::fs::create_dir_all(&cli.output_dir)?;

    let main_path = cli.output_dir.join("quiz_mix.wav");
    assembly.main_mix.save_wav(&main_path)?;
    println!(
        "  {} {} ({:.1} s)",
        "Saved".bold(),
        main_path.display(),
        assembly.main_mix.duration_ms() as f64 / 1000.0
    );

    if let Some(bgm_mix) = &assembly.bgm_mix {
        let bgm_path = cli.output_dir.join("quiz_mix_bgm.wav");
        bgm_mix.save_wav(&bgm_path)?;
        println!("  {} {}", "Saved".bold(), bgm_path.display());
    }

    println!();
    println!("{}", "═".repeat(70).bright_blue());
    if assembly.degraded {
        println!(
            "{}",
            "  Quiz generated with some degraded events (see notes above)."
                .yellow()
                .bold()
        );
    } else {
        println!("{}", "  Quiz generated successfully.".bright_green().bold());
    }
    println!("{}", "═".repeat(70).bright_blue());
    println!();

    Ok(())
}

/// Environment variables take precedence over the config file.
fn apply_env_overrides(config: &mut QuizConfig) {
    if let Ok(base) = env::var("OPENAI_API_BASE").or_else(|_| env::var("OPENAI_BASE_URL")) {
        config.model.api_base = base;
    }
    if let Ok(key) = env::var("OPENAI_API_KEY") {
        config.model.api_key = key;
    }
    if let Ok(key) = env::var("FAL_API_KEY") {
        config.synthesis.music_api_key = key;
    }
    if let Ok(url) = env::var("TTS_API_URL") {
        config.synthesis.tts_url = url;
    }
}
