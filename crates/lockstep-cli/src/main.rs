//! Lockstep CLI
//!
//! Headless front end over the caption engine and the player bridge.

mod demo;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use lockstep_lib::core::captions::{format_transcript, parse_srt, Cue, TranscriptLine};
use lockstep_lib::core::settings::{PlayerSettings, SettingsManager};
use lockstep_lib::core::sync::{CaptionRenderer, CaptionSynchronizer};
use lockstep_lib::core::TimeSec;

#[derive(Parser)]
#[command(name = "lockstep", version, about = "Caption tooling and player bridge demo")]
struct Cli {
    /// Settings file (defaults are used when missing)
    #[arg(long, global = true, env = "LOCKSTEP_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse an SRT file and print its cues as JSON
    Parse {
        file: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
    /// Render a JSON transcript ([{text, start, duration}]) as captions
    Format {
        transcript: PathBuf,
        #[arg(long, default_value = "srt")]
        format: String,
    },
    /// Report the active cue for each playback time sample
    At {
        file: PathBuf,
        #[arg(required = true, allow_negative_numbers = true)]
        times: Vec<TimeSec>,
    },
    /// Run a host/surface session against a simulated media element
    Demo(demo::DemoArgs),
}

fn init_tracing() {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn load_settings(path: Option<&Path>) -> PlayerSettings {
    match path {
        Some(path) => SettingsManager::with_path(path.to_path_buf()).load(),
        None => PlayerSettings::default(),
    }
}

fn read_srt(path: &Path) -> Result<Vec<Cue>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_srt(&content))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

/// Records transitions so `at` can report them
#[derive(Default)]
struct TransitionLog {
    changed: bool,
}

impl CaptionRenderer for TransitionLog {
    fn render(&mut self, _index: usize, _cue: &Cue) {
        self.changed = true;
    }

    fn clear(&mut self) {
        self.changed = true;
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Sample<'a> {
    time: TimeSec,
    changed: bool,
    cue_index: Option<usize>,
    cue: Option<&'a Cue>,
}

fn run_at(file: &Path, times: &[TimeSec]) -> Result<()> {
    let cues = read_srt(file)?;
    let mut sync = CaptionSynchronizer::new(cues, TransitionLog::default());

    for &time in times {
        sync.renderer_mut().changed = false;
        sync.update(time);

        let sample = Sample {
            time,
            changed: sync.renderer().changed,
            cue_index: sync.current_index(),
            cue: sync.current_cue(),
        };
        print_json(&sample, false)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Parse { file, pretty } => {
            let cues = read_srt(&file)?;
            tracing::info!("Parsed {} cues from {}", cues.len(), file.display());
            print_json(&cues, pretty)?;
        }
        Command::Format { transcript, format } => {
            let content = std::fs::read_to_string(&transcript)
                .with_context(|| format!("failed to read {}", transcript.display()))?;
            let lines: Vec<TranscriptLine> = serde_json::from_str(&content)
                .with_context(|| format!("invalid transcript {}", transcript.display()))?;
            let rendered = format_transcript(&lines, &format)?;
            print!("{rendered}");
        }
        Command::At { file, times } => run_at(&file, &times)?,
        Command::Demo(args) => {
            let settings = load_settings(cli.settings.as_deref());
            demo::run(args, settings).await?;
        }
    }

    Ok(())
}
