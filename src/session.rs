//! Top-level owner of one visualizer session.
//!
//! A `Session` ties the port, the note queue, the dispatcher, the demo
//! sequencer and the instrument together. Everything in here runs on the
//! presentation thread; the only other thread involved is the platform's
//! MIDI delivery thread, which never gets further than the `NoteSink`.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::audio::Instrument;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::io::midi::NoteEvent;
use crate::io::port::{note_channel, MidiPort, NoteReceiver, NoteSink, NOTE_QUEUE_SIZE};
use crate::sequencing::demo::{DemoAction, DemoSequencer};
use crate::visual::dispatcher::NoteDispatcher;
use crate::visual::note::NoteSnapshot;
use crate::visual::style::{ColorScheme, VisualizationStyle};

pub struct Session<I: Instrument> {
    port: MidiPort,
    events: NoteReceiver,
    dispatcher: NoteDispatcher,
    demo: DemoSequencer,
    instrument: I,
    settings: Settings,
    /// Why the platform endpoints could not be created, if they could not
    setup_error: Option<Error>,
    torn_down: bool,
}

impl<I: Instrument> Session<I> {
    /// Wrap an already opened port. `events` must be the receiving half of
    /// the channel whose sink the port was given.
    pub fn new(port: MidiPort, events: NoteReceiver, instrument: I, settings: Settings) -> Self {
        let settings = settings.sanitized();
        let dispatcher = NoteDispatcher::with_style(settings.color_scheme, settings.animation_speed);

        Self {
            port,
            events,
            dispatcher,
            demo: DemoSequencer::new(),
            instrument,
            settings,
            setup_error: None,
            torn_down: false,
        }
    }

    /// Register virtual endpoints under `client_name`.
    ///
    /// If the platform refuses, the session still runs: locally generated
    /// notes loop back and the failure is kept for `setup_error()`.
    pub fn open(client_name: &str, instrument: I, settings: Settings) -> Self {
        let (sink, events) = note_channel(NOTE_QUEUE_SIZE);
        let port = MidiPort::open(client_name, sink.clone());
        Self::from_port_result(port, sink, events, instrument, settings)
    }

    /// Build from the outcome of opening a port. On failure the session
    /// falls back to a loopback port on `sink`.
    pub fn from_port_result(
        port: Result<MidiPort>,
        sink: NoteSink,
        events: NoteReceiver,
        instrument: I,
        settings: Settings,
    ) -> Self {
        match port {
            Ok(port) => Self::new(port, events, instrument, settings),
            Err(e) => {
                warn!(error = %e, "MIDI setup failed, running loopback only");
                let mut session = Self::new(MidiPort::loopback(sink), events, instrument, settings);
                session.setup_error = Some(e);
                session
            }
        }
    }

    /// A session with no platform endpoints at all.
    pub fn loopback(instrument: I, settings: Settings) -> Self {
        let (sink, events) = note_channel(NOTE_QUEUE_SIZE);
        Self::new(MidiPort::loopback(sink), events, instrument, settings)
    }

    pub fn setup_error(&self) -> Option<&Error> {
        self.setup_error.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.port.is_connected()
    }

    pub fn port(&self) -> &MidiPort {
        &self.port
    }

    pub fn dispatcher(&self) -> &NoteDispatcher {
        &self.dispatcher
    }

    pub fn instrument(&self) -> &I {
        &self.instrument
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_demo_playing(&self) -> bool {
        self.demo.is_playing()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // Outbound path. Nothing here touches the dispatcher directly; the
    // visual only follows once the loopback copy is drained in `update`.

    pub fn press_key(&mut self, pitch: u8, velocity: u8) {
        if self.torn_down {
            return;
        }
        self.port.send_note_on(pitch, velocity);
    }

    pub fn release_key(&mut self, pitch: u8) {
        if self.torn_down {
            return;
        }
        self.port.send_note_off(pitch);
    }

    /// Start the demo, replacing one that is already running.
    pub fn play_demo(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        let actions = self.demo.start(now);
        self.perform(actions);
    }

    pub fn stop_demo(&mut self) {
        let actions = self.demo.stop();
        self.perform(actions);
    }

    fn perform(&mut self, actions: Vec<DemoAction>) {
        for action in actions {
            match action {
                DemoAction::NoteOn { pitch, velocity } => self.port.send_note_on(pitch, velocity),
                DemoAction::NoteOff { pitch } => self.port.send_note_off(pitch),
            }
        }
    }

    /// One presentation tick: advance the demo, apply queued note events in
    /// arrival order, then fire fade timers that are due.
    ///
    /// Returns the number of note events applied.
    pub fn update(&mut self, now: Instant) -> usize {
        if self.torn_down {
            return 0;
        }

        let actions = self.demo.poll(now);
        self.perform(actions);

        let mut applied = 0;
        while let Some(event) = self.events.try_recv() {
            self.apply(event, now);
            applied += 1;
        }

        let removed = self.dispatcher.fire_due(now);
        if !removed.is_empty() {
            debug!(?removed, "fades finished");
        }

        applied
    }

    fn apply(&mut self, event: NoteEvent, now: Instant) {
        self.dispatcher.apply(event, now);

        if !self.settings.sound_enabled {
            return;
        }
        match event {
            NoteEvent::NoteOn { pitch, velocity } => self.instrument.play_note(pitch, velocity),
            NoteEvent::NoteOff { pitch } => self.instrument.stop_note(pitch),
        }
    }

    /// Earliest instant at which `update` has timed work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.dispatcher.next_deadline(), self.demo.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn active_notes(&self, now: Instant) -> Vec<NoteSnapshot> {
        self.dispatcher.snapshot(now)
    }

    pub fn set_style(&mut self, style: VisualizationStyle) {
        self.settings.style = style;
    }

    pub fn cycle_style(&mut self) {
        self.set_style(self.settings.style.next());
    }

    /// Takes effect for notes started after this call.
    pub fn set_color_scheme(&mut self, scheme: ColorScheme) {
        self.settings.color_scheme = scheme;
        self.dispatcher.set_color_scheme(scheme);
    }

    pub fn cycle_color_scheme(&mut self) {
        self.set_color_scheme(self.settings.color_scheme.next());
    }

    /// Takes effect at the next NoteOff.
    pub fn set_animation_speed(&mut self, speed: f32) {
        self.settings.set_animation_speed(speed);
        self.dispatcher.set_animation_speed(self.settings.animation_speed);
    }

    pub fn step_animation_speed(&mut self, steps: i32) {
        self.settings.step_animation_speed(steps);
        self.dispatcher.set_animation_speed(self.settings.animation_speed);
    }

    pub fn toggle_grid(&mut self) {
        self.settings.show_grid = !self.settings.show_grid;
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        if self.settings.sound_enabled && !enabled {
            self.instrument.all_notes_off();
        }
        self.settings.sound_enabled = enabled;
    }

    pub fn toggle_sound(&mut self) {
        self.set_sound_enabled(!self.settings.sound_enabled);
    }

    /// Stop the demo, cancel every fade timer, drop every note, silence the
    /// instrument, then release the MIDI endpoints. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        self.stop_demo();
        self.dispatcher.teardown();
        self.instrument.all_notes_off();
        self.port.close();

        info!("session torn down");
    }
}

impl<I: Instrument> Drop for Session<I> {
    fn drop(&mut self) {
        self.teardown();
    }
}
