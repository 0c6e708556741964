use encore_core::{
    compare_paths, compare_sources, export_report_bundle, load_source, CoreError, Side,
};
use encore_domain_score::{MidiImportError, MidiSource};
use encore_ports::storage::SettingsDto;
use midly::num::{u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("encore-{name}-{nanos}"))
}

fn note_event(delta: u32, key: u8, vel: u8) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            },
        },
    }
}

/// Scale fragment with uneven rhythm: (key, onset delta, length) in ticks at 480 ppq.
fn phrase_midi(notes: &[(u8, u32, u32)]) -> Vec<u8> {
    let mut track = vec![TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(500_000))),
    }];
    for &(key, gap, len) in notes {
        track.push(note_event(gap, key, 90));
        track.push(note_event(len, key, 0));
    }
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header: Header {
            format: Format::SingleTrack,
            timing: Timing::Metrical(480.into()),
        },
        tracks: vec![track],
    };
    let mut data = Vec::new();
    smf.write(&mut data).expect("midi write should succeed");
    data
}

fn phrase() -> Vec<u8> {
    phrase_midi(&[
        (60, 0, 240),
        (62, 0, 480),
        (64, 120, 240),
        (65, 0, 120),
        (67, 240, 960),
    ])
}

#[test]
fn identical_files_score_perfectly_and_export_reloadable_bundle() {
    let dir = temp_path("bundle");
    std::fs::create_dir_all(&dir).expect("temp dir");
    let midi_path = dir.join("take.mid");
    std::fs::write(&midi_path, phrase()).expect("write midi");

    let outcome = compare_paths(&midi_path, &midi_path, &SettingsDto::default())
        .expect("compare should succeed");
    assert_eq!(outcome.report.matched_count, 5);
    assert!((outcome.report.overall_score - 1.0).abs() < 1e-9);

    let out_dir = dir.join("report");
    export_report_bundle(&out_dir, &outcome).expect("export should succeed");
    for name in [
        "report.json",
        "generated.json",
        "reference.json",
        "app_version.json",
        "platform.json",
    ] {
        assert!(out_dir.join(name).exists(), "{name} missing");
    }

    let cached = load_source(&out_dir.join("generated.json")).expect("load cached");
    assert!(matches!(cached, MidiSource::Decoded(_)));
    let again = compare_sources(
        cached,
        MidiSource::Bytes(phrase()),
        &SettingsDto::default(),
    )
    .expect("compare should succeed");
    assert_eq!(again.generated, outcome.generated);
    assert_eq!(again.report.metrics, outcome.report.metrics);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn shifted_performance_loses_timing_but_keeps_notes() {
    let reference = phrase();
    // every onset 48 ticks (0.05 s) late
    let generated = phrase_midi(&[
        (60, 48, 240),
        (62, 0, 480),
        (64, 120, 240),
        (65, 0, 120),
        (67, 240, 960),
    ]);

    let outcome = compare_sources(
        MidiSource::Bytes(generated),
        MidiSource::Bytes(reference),
        &SettingsDto::default(),
    )
    .expect("compare should succeed");

    assert_eq!(outcome.report.matched_count, 5);
    assert!((outcome.report.metrics.note_accuracy - 1.0).abs() < 1e-9);
    assert!((outcome.report.metrics.timing_accuracy - 0.5).abs() < 1e-9);
    assert!((outcome.report.mean_onset_delta - 0.05).abs() < 1e-9);
    assert!(outcome.report.overall_score < 1.0);
}

#[test]
fn malformed_reference_is_reported_with_its_side() {
    let err = compare_sources(
        MidiSource::Bytes(phrase()),
        MidiSource::Bytes(b"not a midi file at all".to_vec()),
        &SettingsDto::default(),
    )
    .expect_err("compare should fail");

    assert!(matches!(
        err,
        CoreError::Import {
            side: Side::Reference,
            source: MidiImportError::Format(_),
        }
    ));
}

#[test]
fn empty_input_fails_only_when_required() {
    let empty = phrase_midi(&[]);
    let mut settings = SettingsDto::default();

    let outcome = compare_sources(
        MidiSource::Bytes(empty.clone()),
        MidiSource::Bytes(phrase()),
        &settings,
    )
    .expect("compare should succeed");
    assert_eq!(outcome.report.metrics.recall, 0.0);

    settings.require_non_empty = true;
    let err = compare_sources(
        MidiSource::Bytes(empty),
        MidiSource::Bytes(phrase()),
        &settings,
    )
    .expect_err("compare should fail");
    assert!(matches!(
        err,
        CoreError::Import {
            side: Side::Generated,
            source: MidiImportError::EmptyInput,
        }
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_source(&temp_path("missing").with_extension("mid")).expect_err("should fail");
    assert!(matches!(err, CoreError::Io(_)));
}
