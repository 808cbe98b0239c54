use rtrb::Consumer;

use crate::{
    graph::node::GraphNode,
    synth::{message::SynthMessage, voice::Voice},
    MAX_BLOCK_SIZE,
};

/// Fixed-size polyphonic synth fed by a lock-free queue.
///
/// Lives on the audio thread: `render_block` drains pending messages, then
/// mixes every busy voice. No allocation after construction.
pub struct PolySynth<P: GraphNode> {
    voices: Vec<Voice<P>>,
    rx: Consumer<SynthMessage>,
    scratch: Vec<f32>,
    /// Samples rendered so far; orders voices by age for stealing
    clock: u64,
}

impl<P: GraphNode> PolySynth<P> {
    /// `make_voice` is called once per slot.
    pub fn new(
        sample_rate: f32,
        max_voices: usize,
        make_voice: impl Fn() -> P,
        rx: Consumer<SynthMessage>,
    ) -> Self {
        let voices = (0..max_voices.max(1))
            .map(|_| Voice::new(make_voice(), sample_rate))
            .collect();

        Self {
            voices,
            rx,
            scratch: vec![0.0; MAX_BLOCK_SIZE],
            clock: 0,
        }
    }

    /// Apply one message immediately (normally messages arrive via the queue).
    pub fn handle(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::Play { pitch, velocity } => {
                let idx = self.allocate(pitch);
                self.voices[idx].start(pitch, velocity, self.clock);
            }
            SynthMessage::Stop { pitch } => {
                for voice in &mut self.voices {
                    if voice.is_held() && voice.pitch() == Some(pitch) {
                        voice.release();
                    }
                }
            }
            SynthMessage::Silence => {
                for voice in &mut self.voices {
                    voice.release();
                }
            }
        }
    }

    pub fn render_block(&mut self, out: &mut [f32]) {
        while let Ok(msg) = self.rx.pop() {
            self.handle(msg);
        }

        out.fill(0.0);
        let len = out.len().min(self.scratch.len());
        let (mix, scratch) = (&mut out[..len], &mut self.scratch[..len]);
        for voice in &mut self.voices {
            voice.render_into(mix, scratch);
        }

        self.clock += out.len() as u64;
    }

    /// Voices that are held or still ringing out.
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_free()).count()
    }

    /// Same pitch first, then a free slot, then the oldest releasing voice,
    /// then the oldest voice of all.
    fn allocate(&self, pitch: u8) -> usize {
        if let Some(idx) = self.voices.iter().position(|v| v.pitch() == Some(pitch)) {
            return idx;
        }
        if let Some(idx) = self.voices.iter().position(|v| v.is_free()) {
            return idx;
        }

        let oldest = |releasing_only: bool| {
            self.voices
                .iter()
                .enumerate()
                .filter(|(_, v)| !releasing_only || v.is_releasing())
                .min_by_key(|(_, v)| v.started_at())
                .map(|(idx, _)| idx)
        };

        oldest(true).or_else(|| oldest(false)).unwrap_or(0)
    }
}
