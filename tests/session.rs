use std::thread;
use std::time::{Duration, Instant};

use midi_visualizer::audio::Instrument;
use midi_visualizer::config::Settings;
use midi_visualizer::error::Error;
use midi_visualizer::io::converter::note_name;
use midi_visualizer::io::midi::{decode, NoteEvent};
use midi_visualizer::io::port::{deliver, note_channel, MidiPort};
use midi_visualizer::session::Session;
use midi_visualizer::visual::{velocity_to_radius, NoteDispatcher, NoteState, BASE_FADE};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Play(u8, u8),
    Stop(u8),
    AllOff,
}

#[derive(Default)]
struct RecordingInstrument {
    calls: Vec<Call>,
}

impl Instrument for RecordingInstrument {
    fn play_note(&mut self, pitch: u8, velocity: u8) {
        self.calls.push(Call::Play(pitch, velocity));
    }

    fn stop_note(&mut self, pitch: u8) {
        self.calls.push(Call::Stop(pitch));
    }

    fn all_notes_off(&mut self) {
        self.calls.push(Call::AllOff);
    }
}

fn session() -> Session<RecordingInstrument> {
    Session::loopback(RecordingInstrument::default(), Settings::default())
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn retrigger_leaves_one_note_styled_by_the_latest_velocity() {
    let t0 = Instant::now();
    for pitch in 0..=127u8 {
        for (v, v2) in [(1, 127), (127, 1), (64, 64), (0, 90)] {
            let mut d = NoteDispatcher::new();
            d.apply(NoteEvent::NoteOn { pitch, velocity: v }, t0);
            d.apply(NoteEvent::NoteOn { pitch, velocity: v2 }, t0);

            assert_eq!(d.len(), 1);
            let note = d.get(pitch).unwrap();
            assert_eq!(note.velocity, v2);
            assert_eq!(note.radius, velocity_to_radius(v2));
            assert_eq!(d.timer_count(), 0);
        }
    }
}

#[test]
fn retrigger_during_fade_survives_the_original_deadline() {
    let t0 = Instant::now();
    let mut s = session();

    s.press_key(60, 100);
    s.update(t0);
    s.release_key(60);
    s.update(t0 + ms(100));
    assert_eq!(s.dispatcher().state(60), NoteState::FadingOut);

    s.press_key(60, 80);
    s.update(t0 + ms(200));

    s.update(t0 + ms(100) + BASE_FADE);
    s.update(t0 + BASE_FADE * 3);

    let notes = s.active_notes(t0 + BASE_FADE * 3);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].pitch, 60);
    assert_eq!(notes[0].velocity, 80);
    assert_eq!(notes[0].opacity, 1.0);
}

#[test]
fn uncontested_fade_removes_note_after_exactly_the_fade_duration() {
    let t0 = Instant::now();
    let mut s = session();

    s.press_key(64, 90);
    s.release_key(64);
    s.update(t0);
    assert_eq!(s.dispatcher().state(64), NoteState::FadingOut);

    s.update(t0 + BASE_FADE - ms(1));
    assert_eq!(s.dispatcher().state(64), NoteState::FadingOut);

    s.update(t0 + BASE_FADE);
    assert_eq!(s.dispatcher().state(64), NoteState::Idle);
    assert!(s.dispatcher().pending_timer(64).is_none());
    assert!(s.next_deadline().is_none());
}

#[test]
fn zero_velocity_note_on_decodes_as_note_off() {
    let events: Vec<_> = decode(&[0x90, 60, 0]).collect();
    assert_eq!(events, vec![NoteEvent::NoteOff { pitch: 60 }]);
}

#[test]
fn truncated_trailing_message_keeps_the_valid_prefix() {
    let events: Vec<_> = decode(&[0x90, 60, 100, 0x80, 60]).collect();
    assert_eq!(
        events,
        vec![NoteEvent::NoteOn {
            pitch: 60,
            velocity: 100
        }]
    );
}

#[test]
fn radius_is_monotonic_and_bounded() {
    assert_eq!(velocity_to_radius(0), 10.0);
    assert_eq!(velocity_to_radius(127), 50.0);
    for v in 0..127u8 {
        assert!(velocity_to_radius(v + 1) > velocity_to_radius(v));
    }
}

#[test]
fn reference_note_names() {
    assert_eq!(note_name(60), "C4");
    assert_eq!(note_name(69), "A4");
    assert_eq!(note_name(71), "B4");
}

#[test]
fn inbound_buffers_cross_threads_in_order() {
    let t0 = Instant::now();
    let (sink, events) = note_channel(64);
    let port = MidiPort::loopback(sink.clone());
    let mut s = Session::new(port, events, RecordingInstrument::default(), Settings::default());

    let delivery = thread::spawn(move || {
        deliver(&[0x90, 60, 100, 0x90, 64, 90], &sink);
        deliver(&[0x80, 60, 0, 0xF8, 67, 1], &sink);
    });
    delivery.join().unwrap();

    // 0x80 running status carries over the clock byte: 67 is released too
    assert_eq!(s.update(t0), 4);
    assert_eq!(s.dispatcher().state(60), NoteState::FadingOut);
    assert_eq!(s.dispatcher().state(64), NoteState::Sounding);
    assert_eq!(s.dispatcher().state(67), NoteState::Idle);
    assert_eq!(
        s.instrument().calls,
        vec![Call::Play(60, 100), Call::Play(64, 90), Call::Stop(60), Call::Stop(67)]
    );
}

#[test]
fn muted_session_does_not_echo() {
    let t0 = Instant::now();
    let mut s = session();
    s.press_key(60, 100);
    s.update(t0);

    s.toggle_sound();
    s.press_key(62, 100);
    s.update(t0);

    assert_eq!(s.instrument().calls, vec![Call::Play(60, 100), Call::AllOff]);
    // visuals keep following
    assert_eq!(s.dispatcher().state(62), NoteState::Sounding);
}

#[test]
fn demo_plays_through_the_loopback() {
    let t0 = Instant::now();
    let mut s = session();

    s.play_demo(t0);
    s.update(t0);
    assert!(s.is_demo_playing());
    assert_eq!(s.dispatcher().state(60), NoteState::Sounding);

    s.update(t0 + ms(500));
    assert_eq!(s.dispatcher().state(60), NoteState::FadingOut);

    s.update(t0 + ms(600));
    assert_eq!(s.dispatcher().state(64), NoteState::Sounding);
    assert_eq!(s.dispatcher().get(64).unwrap().velocity, 80);
}

#[test]
fn restarting_the_demo_keeps_pitches_paired() {
    let t0 = Instant::now();
    let mut s = session();

    s.play_demo(t0);
    s.update(t0 + ms(650)); // E4 sounding
    s.play_demo(t0 + ms(700));
    s.update(t0 + ms(700));

    assert_eq!(s.dispatcher().state(64), NoteState::FadingOut);
    assert_eq!(s.dispatcher().state(60), NoteState::Sounding);
}

#[test]
fn speed_change_shortens_the_next_fade_only() {
    let t0 = Instant::now();
    let mut s = session();
    s.press_key(60, 100);
    s.press_key(62, 100);
    s.release_key(60);
    s.update(t0);

    s.set_animation_speed(2.0);
    s.release_key(62);
    s.update(t0);

    s.update(t0 + ms(1000));
    assert_eq!(s.dispatcher().state(62), NoteState::Idle);
    assert_eq!(s.dispatcher().state(60), NoteState::FadingOut);
}

#[test]
fn teardown_clears_state_and_silences() {
    let t0 = Instant::now();
    let mut s = session();
    s.play_demo(t0);
    s.press_key(70, 100);
    s.release_key(70);
    s.update(t0);
    assert!(s.next_deadline().is_some());

    s.teardown();

    assert!(!s.is_demo_playing());
    assert!(s.active_notes(t0).is_empty());
    assert_eq!(s.dispatcher().timer_count(), 0);
    assert_eq!(s.instrument().calls.last(), Some(&Call::AllOff));
    assert!(!s.port().is_connected());

    s.teardown();
    assert_eq!(
        s.instrument().calls.iter().filter(|c| **c == Call::AllOff).count(),
        1
    );
}

#[test]
fn refused_endpoints_fall_back_to_loopback() {
    let t0 = Instant::now();
    let (sink, events) = note_channel(16);
    let refused = Err(Error::PortUnavailable("no MIDI service".into()));
    let mut s = Session::from_port_result(
        refused,
        sink,
        events,
        RecordingInstrument::default(),
        Settings::default(),
    );

    assert!(!s.is_connected());
    assert!(matches!(s.setup_error(), Some(Error::PortUnavailable(_))));

    s.press_key(64, 90);
    assert_eq!(s.update(t0), 1);
    assert_eq!(s.dispatcher().state(64), NoteState::Sounding);
    assert_eq!(s.instrument().calls, vec![Call::Play(64, 90)]);
}

#[test]
fn opened_port_has_no_setup_error() {
    let (sink, events) = note_channel(16);
    let port = Ok(MidiPort::loopback(sink.clone()));
    let s = Session::from_port_result(
        port,
        sink,
        events,
        RecordingInstrument::default(),
        Settings::default(),
    );
    assert!(s.setup_error().is_none());
}
