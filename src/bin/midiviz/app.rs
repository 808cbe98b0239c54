//! Midiviz - application builder and runner

use std::io::stdout;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::execute;
use crossterm::terminal::supports_keyboard_enhancement;
use tracing::{info, warn};

use midi_visualizer::audio::{AudioEngine, Instrument, SilentInstrument, DEFAULT_VOICES};
use midi_visualizer::config::Settings;
use midi_visualizer::session::Session;

use super::ui::UiApp;

/// Main application builder
pub struct Midiviz {
    client_name: String,
    settings: Settings,
    audio: bool,
    voices: usize,
}

impl Midiviz {
    pub fn new(client_name: &str) -> Self {
        Self {
            client_name: client_name.to_string(),
            settings: Settings::default(),
            audio: true,
            voices: DEFAULT_VOICES,
        }
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Open an audio device for the note echo
    pub fn audio(mut self, enabled: bool) -> Self {
        self.audio = enabled;
        self
    }

    /// Run until the user quits. Returns the settings as last adjusted.
    pub fn run(self) -> EyreResult<Settings> {
        let mut scope = None;
        let mut sample_rate = None;

        let instrument: Box<dyn Instrument> = if self.audio {
            match AudioEngine::start(self.voices) {
                Ok(mut engine) => {
                    scope = engine.take_scope();
                    sample_rate = Some(engine.sample_rate());
                    Box::new(engine)
                }
                Err(e) => {
                    warn!(error = %e, "audio unavailable, continuing silently");
                    Box::new(SilentInstrument)
                }
            }
        } else {
            Box::new(SilentInstrument)
        };

        let session = Session::open(&self.client_name, instrument, self.settings);
        if let Some(e) = session.setup_error() {
            warn!(error = %e, "virtual endpoints unavailable");
        }

        let mut terminal = ratatui::init();

        // Key release events only exist with the enhanced protocol
        let key_release = matches!(supports_keyboard_enhancement(), Ok(true));
        if key_release {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        info!(key_release, "terminal ready");

        let mut app = UiApp::new(session, scope, sample_rate, key_release);
        let result = app.run(&mut terminal);

        if key_release {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        ratatui::restore();

        let settings = app.finish();
        result.map(|()| settings)
    }
}
