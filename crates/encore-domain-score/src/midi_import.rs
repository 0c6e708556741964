use crate::model::{DecodeDiagnostics, DecodedMidi, NoteEvent, TimeSignature, Track};
use crate::tempo::{
    bpm_from_us_per_quarter, build_tempo_map, timecode_ppq_and_tempo, TempoMap,
    DEFAULT_US_PER_QUARTER,
};
use encore_ports::types::Tick;
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::{debug, warn};

const HEADER_MAGIC: &[u8; 4] = b"MThd";
const HEADER_MIN_LEN: u32 = 6;

#[derive(thiserror::Error, Debug)]
pub enum MidiImportError {
    #[error("format error: {0}")]
    Format(String),
    #[error("decoded midi contains no notes")]
    EmptyInput,
}

/// Input accepted by [`decode`]: raw SMF bytes or an already decoded value.
#[derive(Clone, Debug)]
pub enum MidiSource {
    Bytes(Vec<u8>),
    Decoded(DecodedMidi),
}

impl From<Vec<u8>> for MidiSource {
    fn from(bytes: Vec<u8>) -> Self {
        MidiSource::Bytes(bytes)
    }
}

impl From<DecodedMidi> for MidiSource {
    fn from(decoded: DecodedMidi) -> Self {
        MidiSource::Decoded(decoded)
    }
}

pub fn decode(source: MidiSource) -> Result<DecodedMidi, MidiImportError> {
    match source {
        MidiSource::Bytes(bytes) => decode_bytes(&bytes),
        MidiSource::Decoded(decoded) => {
            debug!(notes = decoded.notes.len(), "midi source already decoded");
            Ok(decoded)
        }
    }
}

/// Fails with [`MidiImportError::EmptyInput`] when nothing was decoded.
pub fn require_notes(decoded: &DecodedMidi) -> Result<(), MidiImportError> {
    if decoded.is_empty() {
        return Err(MidiImportError::EmptyInput);
    }
    Ok(())
}

pub fn decode_bytes(data: &[u8]) -> Result<DecodedMidi, MidiImportError> {
    check_header(data)?;
    let smf = Smf::parse(data).map_err(|e| MidiImportError::Format(e.to_string()))?;

    let mut diagnostics = DecodeDiagnostics::default();
    let (ppq, tempo_override) = match smf.header.timing {
        Timing::Metrical(ticks) => (ticks.as_int(), None),
        Timing::Timecode(fps, ticks_per_frame) => {
            diagnostics.timecode_timing = true;
            let (ppq, us_per_quarter) = timecode_ppq_and_tempo(fps, ticks_per_frame);
            (ppq, Some(us_per_quarter))
        }
    };
    let format = match smf.header.format {
        Format::SingleTrack => 0,
        Format::Parallel => 1,
        Format::Sequential => 2,
    };

    let mut tempo_points: BTreeMap<Tick, u32> = BTreeMap::new();
    let mut time_signature: Option<(Tick, TimeSignature)> = None;
    let mut track_names: Vec<String> = Vec::with_capacity(smf.tracks.len());
    let mut pending: Vec<PendingNote> = Vec::new();

    for (track_index, track) in smf.tracks.iter().enumerate() {
        let mut tick: Tick = 0;
        let mut name: Option<String> = None;
        let mut pairer = NotePairer::new(track_index);

        for event in track {
            tick += event.delta.as_int() as Tick;
            match &event.kind {
                TrackEventKind::Midi { channel, message } => {
                    let channel = channel.as_int();
                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            pairer.open(tick, channel, key.as_int(), vel.as_int());
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            pairer.close(tick, channel, key.as_int(), &mut pending);
                        }
                        _ => {}
                    }
                }
                TrackEventKind::Meta(MetaMessage::Tempo(us_per_quarter)) => {
                    tempo_points.insert(tick, us_per_quarter.as_int());
                }
                TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, denom_pow, _, _)) => {
                    let earlier = time_signature.map_or(true, |(at, _)| tick < at);
                    if earlier {
                        time_signature = Some((
                            tick,
                            TimeSignature {
                                numerator: *numerator,
                                denominator: 2u32.saturating_pow(*denom_pow as u32),
                            },
                        ));
                    }
                }
                TrackEventKind::Meta(MetaMessage::TrackName(raw)) if name.is_none() => {
                    name = Some(String::from_utf8_lossy(raw).trim().to_string());
                }
                _ => {}
            }
        }

        diagnostics.orphan_note_offs += pairer.orphan_note_offs;
        diagnostics.unclosed_notes += pairer.unclosed();
        track_names.push(name.unwrap_or_default());
    }

    // the first tempo the file states, not a default inserted ahead of it
    let first_tempo = tempo_override
        .or_else(|| tempo_points.values().next().copied())
        .unwrap_or(DEFAULT_US_PER_QUARTER);
    let (tempo_map, tempo_defaulted) = build_tempo_map(tempo_points, tempo_override);
    diagnostics.tempo_defaulted = tempo_defaulted;
    diagnostics.time_signature_defaulted = time_signature.is_none();
    let clock = TempoMap::new(ppq, &tempo_map);

    let mut notes = Vec::with_capacity(pending.len());
    // pairs were emitted at note-off time; restore note-on order per track
    pending.sort_by_key(|note| (note.track_index, note.order));
    for note in pending {
        let start_time = clock.seconds_at(note.start_tick);
        let end_time = clock.seconds_at(note.end_tick);
        if end_time <= start_time {
            diagnostics.zero_length_notes += 1;
            continue;
        }
        notes.push(NoteEvent::new(
            0,
            note.pitch,
            note.velocity,
            start_time,
            end_time,
            note.channel,
            note.track_index,
        ));
    }

    // stable sort keeps track/note order for equal onsets
    notes.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    for (id, note) in notes.iter_mut().enumerate() {
        note.id = id as u32;
    }

    let mut tracks: Vec<Track> = track_names
        .into_iter()
        .map(|name| Track {
            name,
            notes: Vec::new(),
        })
        .collect();
    for note in &notes {
        tracks[note.track_index].notes.push(note.clone());
    }

    if diagnostics.tempo_defaulted {
        debug!("no tempo event at tick 0, assuming 120 BPM until the first one");
    }
    if diagnostics.time_signature_defaulted {
        debug!("no time signature event found, assuming 4/4");
    }
    if diagnostics.unclosed_notes > 0 || diagnostics.zero_length_notes > 0 {
        warn!(
            unclosed = diagnostics.unclosed_notes,
            zero_length = diagnostics.zero_length_notes,
            "dropped notes without a usable note-off"
        );
    }

    let decoded = DecodedMidi {
        format,
        ppq,
        duration: crate::model::notes_duration(&notes),
        notes,
        tracks,
        tempo_bpm: bpm_from_us_per_quarter(first_tempo),
        time_signature: time_signature.map(|(_, ts)| ts).unwrap_or_default(),
        tempo_map,
        diagnostics,
    };

    debug!(
        tracks = decoded.tracks.len(),
        notes = decoded.notes.len(),
        ppq,
        tempo_bpm = decoded.tempo_bpm,
        duration = decoded.duration,
        "decoded midi"
    );

    Ok(decoded)
}

/// Bounds-checked probe of the `MThd` chunk before handing the buffer to midly.
fn check_header(data: &[u8]) -> Result<(), MidiImportError> {
    let magic = data
        .get(0..4)
        .ok_or_else(|| MidiImportError::Format("buffer too short for header chunk".to_string()))?;
    if magic != HEADER_MAGIC {
        return Err(MidiImportError::Format("missing MThd header chunk".to_string()));
    }
    let len = read_u32_be(data, 4)?;
    if len < HEADER_MIN_LEN {
        return Err(MidiImportError::Format(format!(
            "header chunk length {len} is shorter than {HEADER_MIN_LEN}"
        )));
    }
    let end = 8usize.saturating_add(len as usize);
    if data.len() < end {
        return Err(MidiImportError::Format(format!(
            "header chunk truncated: need {end} bytes, have {}",
            data.len()
        )));
    }
    Ok(())
}

fn read_u32_be(data: &[u8], offset: usize) -> Result<u32, MidiImportError> {
    let bytes = data
        .get(offset..offset + 4)
        .ok_or_else(|| MidiImportError::Format(format!("truncated at byte {offset}")))?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[derive(Clone, Copy, Debug)]
struct OpenNote {
    tick: Tick,
    velocity: u8,
    order: usize,
}

#[derive(Clone, Copy, Debug)]
struct PendingNote {
    start_tick: Tick,
    end_tick: Tick,
    pitch: u8,
    velocity: u8,
    channel: u8,
    track_index: usize,
    order: usize,
}

/// Pairs note-ons with note-offs inside one track, oldest open note first.
struct NotePairer {
    track_index: usize,
    open: HashMap<(u8, u8), VecDeque<OpenNote>>,
    next_order: usize,
    orphan_note_offs: u32,
}

impl NotePairer {
    fn new(track_index: usize) -> Self {
        Self {
            track_index,
            open: HashMap::new(),
            next_order: 0,
            orphan_note_offs: 0,
        }
    }

    fn open(&mut self, tick: Tick, channel: u8, pitch: u8, velocity: u8) {
        self.open
            .entry((channel, pitch))
            .or_default()
            .push_back(OpenNote {
                tick,
                velocity,
                order: self.next_order,
            });
        self.next_order += 1;
    }

    fn close(&mut self, tick: Tick, channel: u8, pitch: u8, out: &mut Vec<PendingNote>) {
        let Some(started) = self
            .open
            .get_mut(&(channel, pitch))
            .and_then(|queue| queue.pop_front())
        else {
            self.orphan_note_offs += 1;
            return;
        };
        out.push(PendingNote {
            start_tick: started.tick,
            end_tick: tick,
            pitch,
            velocity: started.velocity,
            channel,
            track_index: self.track_index,
            order: started.order,
        });
    }

    fn unclosed(&self) -> u32 {
        self.open.values().map(|queue| queue.len() as u32).sum()
    }
}
