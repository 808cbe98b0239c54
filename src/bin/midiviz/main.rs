//! midiviz - Terminal MIDI note visualizer
//!
//! Run with: cargo run --bin midiviz

mod app;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use app::Midiviz;
use midi_visualizer::config::Settings;
use midi_visualizer::visual::{ColorScheme, VisualizationStyle};

#[derive(Parser, Debug)]
#[command(name = "midiviz", version, about = "Visualize MIDI notes in the terminal")]
struct Args {
    /// Visualization style
    #[arg(long, value_enum)]
    style: Option<StyleArg>,

    /// Color scheme for new notes
    #[arg(long, value_enum)]
    scheme: Option<SchemeArg>,

    /// Fade speed multiplier (0.5 - 2.0)
    #[arg(long)]
    speed: Option<f32>,

    /// Hide the background grid
    #[arg(long)]
    no_grid: bool,

    /// Start with sound muted
    #[arg(long)]
    mute: bool,

    /// Don't open an audio device at all
    #[arg(long)]
    no_audio: bool,

    /// Name the virtual MIDI endpoints are registered under
    #[arg(long, default_value = "MIDI Visualizer")]
    client_name: String,

    /// Settings file (defaults to the per-user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log output; the terminal belongs to the UI
    #[arg(long, default_value = "midiviz.log")]
    log_file: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StyleArg {
    Circles,
    Bars,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemeArg {
    Rainbow,
    Fire,
    Ocean,
}

impl From<StyleArg> for VisualizationStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Circles => VisualizationStyle::Circles,
            StyleArg::Bars => VisualizationStyle::Bars,
        }
    }
}

impl From<SchemeArg> for ColorScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Rainbow => ColorScheme::Rainbow,
            SchemeArg::Fire => ColorScheme::Fire,
            SchemeArg::Ocean => ColorScheme::Ocean,
        }
    }
}

impl Args {
    /// Command line flags override whatever was saved.
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(style) = self.style {
            settings.style = style.into();
        }
        if let Some(scheme) = self.scheme {
            settings.color_scheme = scheme.into();
        }
        if let Some(speed) = self.speed {
            settings.set_animation_speed(speed);
        }
        if self.no_grid {
            settings.show_grid = false;
        }
        if self.mute {
            settings.sound_enabled = false;
        }
    }
}

fn init_logging(path: &PathBuf) -> EyreResult<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("midi_visualizer=info,midiviz=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let settings_path = args.config.clone().or_else(Settings::default_path);
    let mut settings = match &settings_path {
        Some(path) => Settings::load_from(path).unwrap_or_else(|e| {
            warn!(error = %e, path = %path.display(), "ignoring unreadable settings");
            Settings::default()
        }),
        None => Settings::default(),
    };
    args.apply_to(&mut settings);
    info!(?settings, "starting");

    let settings = Midiviz::new(&args.client_name)
        .settings(settings)
        .audio(!args.no_audio)
        .run()?;

    if let Some(path) = settings_path {
        if let Err(e) = settings.save_to(&path) {
            warn!(error = %e, "failed to save settings");
        }
    }
    Ok(())
}
