/// Sound effects: short procedural chimes played through rodio.
///
/// Every effect is synthesized once at startup into an in-memory WAV
/// buffer and played fire-and-forget on its own detached Sink.
///
/// Build without the "sound" feature to get the silent stub below.

use crate::sim::event::GameEvent;

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use tracing::{debug, warn};

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::PI * 2.0;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        place: Arc<Vec<u8>>,
        erase: Arc<Vec<u8>>,
        wrong: Arc<Vec<u8>>,
        win: Arc<Vec<u8>>,
        hint: Arc<Vec<u8>>,
        denied: Arc<Vec<u8>>,
        pack_done: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };
            debug!("sound effects ready");

            fn wav(notes: &[Note]) -> Arc<Vec<u8>> {
                Arc::new(make_wav(&render(notes)))
            }
            Some(SoundEngine {
                _stream: stream,
                handle,
                place: wav(&[Note::new(880.0, 0.04, 0.2)]),
                erase: wav(&[Note::new(520.0, 0.04, 0.15)]),
                wrong: wav(&[Note::new(196.0, 0.09, 0.3), Note::new(165.0, 0.14, 0.3)]),
                win: wav(&[
                    Note::new(523.0, 0.08, 0.25),
                    Note::new(659.0, 0.08, 0.25),
                    Note::new(784.0, 0.08, 0.25),
                    Note::new(1047.0, 0.22, 0.25),
                ]),
                hint: wav(&[Note::new(1319.0, 0.05, 0.18), Note::new(1760.0, 0.09, 0.18)]),
                denied: wav(&[Note::new(110.0, 0.12, 0.35)]),
                pack_done: wav(&[
                    Note::new(784.0, 0.1, 0.25),
                    Note::new(1047.0, 0.1, 0.25),
                    Note::new(1319.0, 0.1, 0.25),
                    Note::new(1568.0, 0.35, 0.25),
                ]),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_place(&self) { self.play(&self.place); }
        pub fn play_erase(&self) { self.play(&self.erase); }
        pub fn play_wrong(&self) { self.play(&self.wrong); }
        pub fn play_win(&self) { self.play(&self.win); }
        pub fn play_hint(&self) { self.play(&self.hint); }
        pub fn play_denied(&self) { self.play(&self.denied); }
        pub fn play_pack_done(&self) { self.play(&self.pack_done); }
    }

    // ════════════════════════════════════════════════════════════
    //  Synthesis
    // ════════════════════════════════════════════════════════════

    #[derive(Clone, Copy)]
    pub(super) struct Note {
        freq: f32,
        secs: f32,
        volume: f32,
    }

    impl Note {
        pub(super) const fn new(freq: f32, secs: f32, volume: f32) -> Self {
            Note { freq, secs, volume }
        }
    }

    /// Notes back to back; sine plus a soft octave, with a decaying envelope.
    pub(super) fn render(notes: &[Note]) -> Vec<f32> {
        let mut out = Vec::new();
        for note in notes {
            let n = (SAMPLE_RATE as f32 * note.secs) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - i as f32 / n as f32).powf(0.7);
                let wave = (t * note.freq * TAU).sin() * 0.75 + (t * note.freq * 2.0 * TAU).sin() * 0.25;
                out.push(wave * env * note.volume);
            }
        }
        out
    }

    /// 16-bit mono PCM WAV.
    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let data_len = samples.len() as u32 * 2;
        let mut buf = Vec::with_capacity(44 + data_len as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_len).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes()); // byte rate
        buf.extend_from_slice(&2u16.to_le_bytes()); // block align
        buf.extend_from_slice(&16u16.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_len.to_le_bytes());
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_place(&self) {}
    pub fn play_erase(&self) {}
    pub fn play_wrong(&self) {}
    pub fn play_win(&self) {}
    pub fn play_hint(&self) {}
    pub fn play_denied(&self) {}
    pub fn play_pack_done(&self) {}
}

/// Play the effect for each event. A win that ends the pack plays once.
pub fn play_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    let pack_done = events.iter().any(|e| matches!(e, GameEvent::PackComplete { .. }));
    for event in events {
        match event {
            GameEvent::LetterPlaced { .. } => sfx.play_place(),
            GameEvent::LetterRemoved { .. } => sfx.play_erase(),
            GameEvent::WrongAttempt => sfx.play_wrong(),
            GameEvent::HintApplied { .. } => sfx.play_hint(),
            GameEvent::LevelWon { .. } | GameEvent::LevelSkipped { .. } if !pack_done => sfx.play_win(),
            GameEvent::PackComplete { .. } => sfx.play_pack_done(),
            GameEvent::InsufficientFunds { .. }
            | GameEvent::AccessDenied { .. }
            | GameEvent::InvalidLevel { .. }
            | GameEvent::SaveFailed => sfx.play_denied(),
            _ => {}
        }
    }
}
