//! Virtual MIDI endpoint pair and the thread hop into the presentation loop.
//!
//! - Inbound: platform MIDI thread -> decoder -> `NoteSink` (bounded channel)
//! - Outbound: `send_note_on`/`send_note_off` -> virtual source, plus a
//!   loopback copy into the same `NoteSink`
//!
//! Nothing here touches note lifecycle state. The receiving end of the
//! channel is drained on the presentation thread only.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use midir::{MidiInputConnection, MidiOutputConnection};
use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::io::converter::{note_off_message, note_on_message};
use crate::io::midi::{decode, NoteEvent};

/// Capacity of the note queue between delivery and presentation contexts.
pub const NOTE_QUEUE_SIZE: usize = 1024;

/// Producer half of the note queue. Cheap to clone; safe on any thread.
#[derive(Clone)]
pub struct NoteSink {
    tx: Sender<NoteEvent>,
}

impl NoteSink {
    /// Enqueue one event. Returns false if it was dropped (queue full or
    /// the presentation side has gone away).
    pub fn send(&self, event: NoteEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(?event, "note queue full, dropping event");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                trace!("note queue disconnected");
                false
            }
        }
    }
}

/// Consumer half of the note queue, owned by the presentation loop.
pub struct NoteReceiver {
    rx: Receiver<NoteEvent>,
}

impl NoteReceiver {
    /// Pop one pending event without blocking.
    pub fn try_recv(&self) -> Option<NoteEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drain every pending event in arrival order.
    pub fn drain(&self) -> impl Iterator<Item = NoteEvent> + '_ {
        self.rx.try_iter()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

pub fn note_channel(capacity: usize) -> (NoteSink, NoteReceiver) {
    let (tx, rx) = bounded(capacity);
    (NoteSink { tx }, NoteReceiver { rx })
}

/// Decode a raw buffer and forward its events, in order, to `sink`.
///
/// This is what runs on the platform delivery thread. Returns the number of
/// events forwarded.
pub fn deliver(bytes: &[u8], sink: &NoteSink) -> usize {
    let mut forwarded = 0;
    for event in decode(bytes) {
        if sink.send(event) {
            forwarded += 1;
        }
    }
    forwarded
}

/// One virtual input/output endpoint pair.
///
/// When the platform refuses the endpoints the port runs loopback-only:
/// outgoing messages are not transmitted anywhere but still reach the sink.
pub struct MidiPort {
    client_name: String,
    sink: NoteSink,
    /// Virtual source other applications listen to (we transmit on it)
    source: Option<MidiOutputConnection>,
    /// Virtual destination other applications send to (we receive on it)
    destination: Option<MidiInputConnection<NoteSink>>,
}

impl MidiPort {
    /// Register the virtual endpoint pair with the platform MIDI service.
    ///
    /// Fails with `Error::PortUnavailable` if the client or either endpoint
    /// cannot be created.
    pub fn open(client_name: &str, sink: NoteSink) -> Result<Self> {
        let (source, destination) = open_endpoints(client_name, sink.clone())?;
        info!(client = client_name, "virtual MIDI endpoints registered");

        Ok(Self {
            client_name: client_name.to_string(),
            sink,
            source: Some(source),
            destination: Some(destination),
        })
    }

    /// A port with no platform endpoints. Outgoing notes only loop back.
    pub fn loopback(sink: NoteSink) -> Self {
        Self {
            client_name: String::new(),
            sink,
            source: None,
            destination: None,
        }
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// True while at least one platform endpoint is registered.
    pub fn is_connected(&self) -> bool {
        self.source.is_some() || self.destination.is_some()
    }

    /// Send a Note On on channel 0.
    pub fn send_note_on(&mut self, pitch: u8, velocity: u8) {
        self.send_note_on_channel(0, pitch, velocity);
    }

    /// Send a Note Off on channel 0.
    pub fn send_note_off(&mut self, pitch: u8) {
        self.send_note_off_channel(0, pitch);
    }

    /// Pitch and velocity must be 7-bit values; anything else is logged
    /// and dropped rather than wrapped.
    pub fn send_note_on_channel(&mut self, channel: u8, pitch: u8, velocity: u8) {
        match note_on_message(channel, pitch, velocity) {
            Some(message) => self.send(&message),
            None => warn!(pitch, velocity, "note on out of MIDI range, not sent"),
        }
    }

    pub fn send_note_off_channel(&mut self, channel: u8, pitch: u8) {
        match note_off_message(channel, pitch) {
            Some(message) => self.send(&message),
            None => warn!(pitch, "note off out of MIDI range, not sent"),
        }
    }

    fn send(&mut self, message: &[u8]) {
        self.transmit(message);
        self.loop_back(message);
    }

    fn transmit(&mut self, message: &[u8]) {
        let Some(source) = self.source.as_mut() else {
            return;
        };
        if let Err(e) = source.send(message) {
            warn!(error = %e, "failed to transmit MIDI message");
        }
    }

    // Decoding our own bytes keeps loopback identical to what a listener
    // would see, including the velocity-0 rule.
    fn loop_back(&self, message: &[u8]) {
        for event in decode(message) {
            debug!(?event, "loopback");
            self.sink.send(event);
        }
    }

    /// Release the virtual source, then the virtual destination. The MIDI
    /// client goes with the last connection. Safe to call repeatedly.
    pub fn close(&mut self) {
        let had_endpoints = self.is_connected();

        if let Some(source) = self.source.take() {
            drop(source.close());
        }
        if let Some(destination) = self.destination.take() {
            drop(destination.close());
        }

        if had_endpoints {
            info!(client = %self.client_name, "virtual MIDI endpoints released");
        }
    }
}

impl Drop for MidiPort {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(unix)]
fn open_endpoints(
    client_name: &str,
    sink: NoteSink,
) -> Result<(MidiOutputConnection, MidiInputConnection<NoteSink>)> {
    use midir::os::unix::{VirtualInput, VirtualOutput};
    use midir::{Ignore, MidiInput, MidiOutput};

    let output = MidiOutput::new(client_name)?;
    let source = output.create_virtual(&format!("{client_name} Source"))?;

    let mut input = MidiInput::new(client_name)?;
    input.ignore(Ignore::All);
    let destination = input.create_virtual(
        &format!("{client_name} Destination"),
        |_timestamp, message, sink: &mut NoteSink| {
            deliver(message, sink);
        },
        sink,
    )?;

    Ok((source, destination))
}

#[cfg(not(unix))]
fn open_endpoints(
    _client_name: &str,
    _sink: NoteSink,
) -> Result<(MidiOutputConnection, MidiInputConnection<NoteSink>)> {
    Err(crate::error::Error::PortUnavailable(
        "virtual MIDI endpoints are not supported on this platform".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn send_loops_back_to_sink() {
        let (sink, events) = note_channel(16);
        let mut port = MidiPort::loopback(sink);

        port.send_note_on(60, 100);
        port.send_note_off(60);

        let got: Vec<_> = events.drain().collect();
        assert_eq!(
            got,
            vec![
                NoteEvent::NoteOn {
                    pitch: 60,
                    velocity: 100
                },
                NoteEvent::NoteOff { pitch: 60 },
            ]
        );
    }

    #[test]
    fn zero_velocity_send_loops_back_as_note_off() {
        let (sink, events) = note_channel(4);
        let mut port = MidiPort::loopback(sink);
        port.send_note_on(64, 0);
        assert_eq!(events.try_recv(), Some(NoteEvent::NoteOff { pitch: 64 }));
    }

    #[test]
    fn delivery_thread_preserves_buffer_order() {
        let (sink, events) = note_channel(64);

        let handle = thread::spawn(move || {
            deliver(&[0x90, 60, 100, 0x90, 64, 90, 0x80, 60, 0], &sink)
                + deliver(&[0x90, 67, 80], &sink)
        });
        assert_eq!(handle.join().unwrap(), 4);

        let pitches: Vec<u8> = events.drain().map(|e| e.pitch()).collect();
        assert_eq!(pitches, vec![60, 64, 60, 67]);
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (sink, events) = note_channel(1);
        assert_eq!(deliver(&[0x90, 60, 1, 0x90, 61, 1], &sink), 1);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn out_of_range_pitch_is_not_wrapped() {
        let (sink, events) = note_channel(4);
        let mut port = MidiPort::loopback(sink);
        port.send_note_on(200, 100);
        port.send_note_on(60, 130);
        port.send_note_off(128);
        assert!(events.is_empty());

        port.send_note_on(127, 1);
        assert_eq!(
            events.try_recv(),
            Some(NoteEvent::NoteOn {
                pitch: 127,
                velocity: 1
            })
        );
    }

    #[test]
    fn close_is_idempotent() {
        let (sink, _events) = note_channel(4);
        let mut port = MidiPort::loopback(sink);
        assert!(!port.is_connected());
        port.close();
        port.close();
        // still usable for loopback after close
        port.send_note_off(60);
    }
}
