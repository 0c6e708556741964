use encore_ports::types::{Seconds, Tick};
use serde::{Deserialize, Serialize};

/// One sounding pitch with onset and offset in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub id: u32,
    pub pitch: u8,
    pub pitch_name: String,
    pub velocity: u8,
    pub start_time: Seconds,
    pub end_time: Seconds,
    pub duration: Seconds,
    pub channel: u8,
    pub track_index: usize,
}

impl NoteEvent {
    pub fn new(
        id: u32,
        pitch: u8,
        velocity: u8,
        start_time: Seconds,
        end_time: Seconds,
        channel: u8,
        track_index: usize,
    ) -> Self {
        Self {
            id,
            pitch,
            pitch_name: crate::pitch::pitch_name(pitch),
            velocity,
            start_time,
            end_time,
            duration: end_time - start_time,
            channel,
            track_index,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub notes: Vec<NoteEvent>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoPoint {
    pub tick: Tick,
    pub us_per_quarter: u32,
}

/// Structural facts about a decode that affect how far its timing can be trusted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DecodeDiagnostics {
    /// No tempo event at tick 0; 120 BPM was assumed up to the first one.
    pub tempo_defaulted: bool,
    /// No time signature event was found; 4/4 was assumed.
    pub time_signature_defaulted: bool,
    /// Header uses SMPTE timecode instead of ticks per quarter note.
    pub timecode_timing: bool,
    /// Note-ons never closed by a note-off; dropped.
    pub unclosed_notes: u32,
    /// Note-offs with no open note on the same channel and pitch.
    pub orphan_note_offs: u32,
    /// Note pairs that closed at or before their onset; dropped.
    pub zero_length_notes: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecodedMidi {
    pub format: u16,
    pub ppq: u16,
    pub notes: Vec<NoteEvent>,
    pub tracks: Vec<Track>,
    pub duration: Seconds,
    pub tempo_bpm: f64,
    pub time_signature: TimeSignature,
    pub tempo_map: Vec<TempoPoint>,
    pub diagnostics: DecodeDiagnostics,
}

impl DecodedMidi {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Latest end time across `notes`, 0 when empty.
pub fn notes_duration(notes: &[NoteEvent]) -> Seconds {
    notes.iter().map(|n| n.end_time).fold(0.0, f64::max)
}
