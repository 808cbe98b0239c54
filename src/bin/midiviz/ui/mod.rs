//! TUI module for midiviz
//!
//! Draws the active notes, the on-screen keyboard and the synth output, and
//! turns key presses into outgoing MIDI notes.

mod bars;
mod circles;
mod keyboard;
mod scope;
mod status;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;
use tracing::debug;

use midi_visualizer::audio::Instrument;
use midi_visualizer::config::Settings;
use midi_visualizer::sequencing::notes::C4;
use midi_visualizer::session::Session;
use midi_visualizer::visual::VisualizationStyle;

use bars::render_bars;
use circles::render_circles;
use keyboard::render_keyboard;
use scope::render_scope;
use status::render_status;

/// Audio visualization buffer size
const VIS_BUFFER_SIZE: usize = 1024;

/// Redraw interval (~60fps)
const FRAME: Duration = Duration::from_millis(16);

/// Without release reporting, a key counts as lifted this long after its
/// last press or auto-repeat. Longer than the usual OS repeat delay, so a
/// held key is not re-struck before auto-repeat kicks in.
const AUTO_RELEASE: Duration = Duration::from_millis(600);

const KEY_VELOCITY: u8 = 100;

/// Computer keys for C4..B4, piano-style across two rows.
const KEY_MAP: [char; 12] = ['a', 'w', 's', 'e', 'd', 'f', 't', 'g', 'y', 'h', 'u', 'j'];

fn key_pitch(c: char) -> Option<u8> {
    let c = c.to_ascii_lowercase();
    KEY_MAP.iter().position(|&k| k == c).map(|i| C4 + i as u8)
}

pub struct UiApp {
    session: Session<Box<dyn Instrument>>,
    /// Rendered synth output, if audio is running
    scope: Option<Consumer<f32>>,
    sample_rate: Option<f32>,
    audio_buffer: Vec<f32>,
    /// On-screen keys held down, with the last time each was seen
    held: HashMap<u8, Instant>,
    /// Whether the terminal reports key releases
    key_release: bool,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        session: Session<Box<dyn Instrument>>,
        scope: Option<Consumer<f32>>,
        sample_rate: Option<f32>,
        key_release: bool,
    ) -> Self {
        Self {
            session,
            scope,
            sample_rate,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            held: HashMap::new(),
            key_release,
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            let now = Instant::now();
            self.expire_held_keys(now);
            self.session.update(now);
            self.poll_audio();

            terminal.draw(|frame| self.render(frame, now))?;

            if event::poll(FRAME)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key, Instant::now());
                }
            }
        }

        Ok(())
    }

    /// Release held keys, tear the session down and hand back the settings.
    pub fn finish(&mut self) -> Settings {
        let held: Vec<u8> = self.held.drain().map(|(pitch, _)| pitch).collect();
        for pitch in held {
            self.session.release_key(pitch);
        }
        self.session.teardown();
        self.session.settings().clone()
    }

    fn poll_audio(&mut self) {
        let Some(scope) = self.scope.as_mut() else {
            return;
        };
        while let Ok(sample) = scope.pop() {
            self.audio_buffer.push(sample);
        }
        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
    }

    fn expire_held_keys(&mut self, now: Instant) {
        if self.key_release {
            return;
        }
        let expired: Vec<u8> = self
            .held
            .iter()
            .filter(|&(_, &seen)| now.duration_since(seen) >= AUTO_RELEASE)
            .map(|(&pitch, _)| pitch)
            .collect();
        for pitch in expired {
            self.held.remove(&pitch);
            self.session.release_key(pitch);
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if let KeyCode::Char(c) = key.code {
            if let Some(pitch) = key_pitch(c) {
                self.handle_note_key(pitch, key.kind, now);
                return;
            }
        }

        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('p') => self.session.play_demo(now),
            KeyCode::Char('v') => self.session.cycle_style(),
            KeyCode::Char('c') => self.session.cycle_color_scheme(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.session.step_animation_speed(1),
            KeyCode::Char('-') => self.session.step_animation_speed(-1),
            KeyCode::Char('b') => self.session.toggle_grid(),
            KeyCode::Char('m') => self.session.toggle_sound(),
            _ => {}
        }
    }

    fn handle_note_key(&mut self, pitch: u8, kind: KeyEventKind, now: Instant) {
        match kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                // Auto-repeat arrives as more presses; only the first sounds
                if self.held.insert(pitch, now).is_none() {
                    debug!(pitch, "key down");
                    self.session.press_key(pitch, KEY_VELOCITY);
                }
            }
            KeyEventKind::Release => {
                if self.held.remove(&pitch).is_some() {
                    self.session.release_key(pitch);
                }
            }
        }
    }

    fn render(&self, frame: &mut Frame, now: Instant) {
        let area = frame.area();
        let scope_height = if self.scope.is_some() { 8 } else { 0 };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),            // Status bar
                Constraint::Min(8),               // Visualizer
                Constraint::Length(6),            // Keyboard
                Constraint::Length(scope_height), // Oscilloscope
                Constraint::Length(1),            // Help bar
            ])
            .split(area);

        let notes = self.session.active_notes(now);
        let settings = self.session.settings();

        render_status(frame, chunks[0], &self.session, self.sample_rate, notes.len());

        match settings.style {
            VisualizationStyle::Circles => render_circles(frame, chunks[1], &notes, settings.show_grid),
            VisualizationStyle::Bars => render_bars(frame, chunks[1], &notes, settings.show_grid),
        }

        render_keyboard(frame, chunks[2], &notes, &KEY_MAP);

        if self.scope.is_some() {
            render_scope(frame, chunks[3], &self.audio_buffer, &notes, settings.sound_enabled);
        }

        let help = Paragraph::new(
            " [A-J] Play  [P] Demo  [V] Style  [C] Colors  [+/-] Speed  [B] Grid  [M] Sound  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[4]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_row_maps_to_one_octave() {
        assert_eq!(key_pitch('a'), Some(60));
        assert_eq!(key_pitch('w'), Some(61));
        assert_eq!(key_pitch('J'), Some(71));
        assert_eq!(key_pitch('q'), None);
        assert_eq!(key_pitch('p'), None);
    }

    #[test]
    fn held_key_outlasts_os_repeat_delay() {
        use midi_visualizer::audio::SilentInstrument;

        let t0 = Instant::now();
        let session: Session<Box<dyn Instrument>> =
            Session::loopback(Box::new(SilentInstrument), Settings::default());
        let mut app = UiApp::new(session, None, None, false);

        app.handle_note_key(C4, KeyEventKind::Press, t0);
        app.expire_held_keys(t0 + Duration::from_millis(550));
        assert!(app.held.contains_key(&C4));

        // first auto-repeat refreshes the key
        app.handle_note_key(C4, KeyEventKind::Repeat, t0 + Duration::from_millis(550));
        app.expire_held_keys(t0 + Duration::from_millis(1100));
        assert!(app.held.contains_key(&C4));

        app.expire_held_keys(t0 + Duration::from_millis(550) + AUTO_RELEASE);
        assert!(app.held.is_empty());
    }
}
