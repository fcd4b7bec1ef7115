//! virtuoso - terminal keyboard synthesizer
//!
//! Run with: cargo run -- [--config virtuoso.toml] [--melody melody.json]

mod app;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;
use virtuoso_synth::{
    chord::ChordProfile,
    config::Settings,
    instrument::InstrumentKind,
    melody::{JsonMelodySource, Melody, MelodySource},
    synth::VoiceEngine,
};

use app::App;

#[derive(Debug, Parser)]
#[command(name = "virtuoso", about = "Polyphonic keyboard synthesizer for the terminal")]
struct Args {
    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// triangle, sine, square or sawtooth
    #[arg(long)]
    instrument: Option<String>,

    /// none, major, minor, power or diminished
    #[arg(long)]
    chord: Option<String>,

    /// Melody to play with Enter (JSON)
    #[arg(long)]
    melody: Option<PathBuf>,

    /// Write logs here (the terminal is in raw mode)
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Some(path) = &args.log {
        let file = File::create(path).wrap_err("failed to create log file")?;
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .wrap_err_with(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(id) = &args.instrument {
        settings.instrument = InstrumentKind::from_id(id);
    }
    if let Some(id) = &args.chord {
        settings.chord = ChordProfile::from_id(id);
    }

    let melody = args.melody.and_then(load_melody);

    let mut engine = VoiceEngine::new(settings);
    let audio = engine.init_default();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .wrap_err("failed to build runtime")?;
    let local = tokio::task::LocalSet::new();

    let app = App::new(engine, melody, audio);
    let terminal = ratatui::init();
    let result = local.block_on(&runtime, app.run(terminal));
    ratatui::restore();
    result
}

/// Any read or parse failure leaves the app without a melody.
fn load_melody(path: PathBuf) -> Option<Melody> {
    let source = JsonMelodySource::new(move |_prompt: &str| std::fs::read_to_string(&path));
    source.generate("file")
}
