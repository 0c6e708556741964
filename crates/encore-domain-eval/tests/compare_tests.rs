use encore_domain_eval::{compare, match_notes, rhythm_accuracy, CompareError, ComparisonReport};
use encore_domain_score::NoteEvent;
use encore_ports::settings::{CompareSettings, MatchTolerances, MatchWeights, Metric};

fn note(id: u32, pitch: u8, start: f64, duration: f64, velocity: u8) -> NoteEvent {
    NoteEvent::new(id, pitch, velocity, start, start + duration, 0, 0)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn melody() -> Vec<NoteEvent> {
    vec![
        note(0, 60, 0.0, 0.5, 80),
        note(1, 64, 0.0, 0.5, 72),
        note(2, 62, 0.5, 0.25, 90),
        note(3, 65, 0.75, 0.25, 85),
        note(4, 67, 1.0, 1.0, 100),
        note(5, 72, 2.25, 0.5, 64),
        note(6, 59, 3.0, 0.4, 70),
    ]
}

fn assert_in_unit_range(report: &ComparisonReport) {
    for metric in Metric::ALL {
        let value = report.metrics.get(metric);
        assert!(
            (0.0..=1.0).contains(&value),
            "{} out of range: {value}",
            metric.name()
        );
    }
    assert!((0.0..=1.0).contains(&report.overall_score));
}

#[test]
fn self_comparison_is_perfect() {
    let notes = melody();
    let report = compare(&notes, &notes.clone(), &CompareSettings::default())
        .expect("compare should succeed");

    assert_eq!(report.matched_count, notes.len());
    assert_eq!(report.unmatched_generated_count, 0);
    assert_eq!(report.unmatched_reference_count, 0);
    assert!(close(report.metrics.note_accuracy, 1.0));
    assert!(close(report.metrics.timing_accuracy, 1.0));
    assert!(close(report.metrics.rhythm_accuracy, 1.0));
    assert!(close(report.metrics.velocity_accuracy, 1.0));
    assert!(close(report.metrics.duration_accuracy, 1.0));
    assert!(close(report.metrics.pitch_class_similarity, 1.0));
    assert!(close(report.metrics.density_similarity, 1.0));
    assert!(close(report.metrics.polyphony_similarity, 1.0));
    assert!(close(report.metrics.range_overlap, 1.0));
    assert!(close(report.overall_score, 1.0));
    assert!(close(report.mean_onset_delta, 0.0));
    assert_in_unit_range(&report);
}

#[test]
fn empty_reference_scores_zero_recall_without_failing() {
    let report =
        compare(&melody(), &[], &CompareSettings::default()).expect("compare should succeed");

    assert_eq!(report.matched_count, 0);
    assert_eq!(report.metrics.recall, 0.0);
    assert_eq!(report.metrics.note_accuracy, 0.0);
    assert_eq!(report.metrics.rhythm_accuracy, 0.0);
    assert_eq!(report.metrics.range_overlap, 0.0);
    assert_eq!(report.unmatched_generated_count, melody().len());
    assert_in_unit_range(&report);
}

#[test]
fn both_empty_is_all_zero() {
    let report = compare(&[], &[], &CompareSettings::default()).expect("compare should succeed");
    for metric in Metric::ALL {
        assert_eq!(report.metrics.get(metric), 0.0);
    }
    assert_eq!(report.overall_score, 0.0);
}

#[test]
fn single_near_onset_pair() {
    let generated = vec![note(0, 60, 0.0, 0.5, 80)];
    let reference = vec![note(0, 60, 0.05, 0.5, 80)];
    let report = compare(&generated, &reference, &CompareSettings::default())
        .expect("compare should succeed");

    assert_eq!(report.matched_count, 1);
    assert!(close(report.matches[0].timing_error, 0.05));
    assert!(close(report.metrics.timing_accuracy, 0.5));
    assert!(close(report.metrics.precision, 1.0));
    assert!(close(report.metrics.recall, 1.0));
    assert!(close(report.metrics.note_accuracy, 1.0));
    // too few matches for an interval correlation
    assert_eq!(report.metrics.rhythm_accuracy, 0.0);
    assert_in_unit_range(&report);
}

#[test]
fn disjoint_pitch_classes_have_zero_similarity() {
    let white: Vec<NoteEvent> = [60u8, 62, 64, 65, 67, 69, 71]
        .iter()
        .enumerate()
        .map(|(i, &p)| note(i as u32, p, i as f64 * 0.5, 0.4, 80))
        .collect();
    let black: Vec<NoteEvent> = [61u8, 63, 66, 68, 70]
        .iter()
        .enumerate()
        .map(|(i, &p)| note(i as u32, p, i as f64 * 0.5, 0.4, 80))
        .collect();

    let report =
        compare(&white, &black, &CompareSettings::default()).expect("compare should succeed");
    assert_eq!(report.metrics.pitch_class_similarity, 0.0);
    assert_eq!(report.matched_count, 0);
    assert_in_unit_range(&report);
}

#[test]
fn late_performance_reports_positive_onset_delta() {
    let reference = melody();
    let generated: Vec<NoteEvent> = reference
        .iter()
        .map(|n| note(n.id, n.pitch, n.start_time + 0.02, n.duration, n.velocity))
        .collect();

    let report = compare(&generated, &reference, &CompareSettings::default())
        .expect("compare should succeed");
    assert_eq!(report.matched_count, reference.len());
    assert!(close(report.mean_onset_delta, 0.02));
    assert!(close(report.metrics.timing_accuracy, 0.8));
    assert!(close(report.metrics.rhythm_accuracy, 1.0));
}

#[test]
fn even_rhythm_at_a_different_tempo_still_agrees() {
    let reference: Vec<NoteEvent> = (0..4).map(|i| note(i, 60, i as f64 * 0.5, 0.25, 80)).collect();
    let generated: Vec<NoteEvent> = (0..4)
        .map(|i| note(i, 60, i as f64 * 0.5 + 0.01 * i as f64, 0.25, 80))
        .collect();

    let set = match_notes(
        &generated,
        &reference,
        &MatchTolerances::default(),
        &MatchWeights::default(),
    );
    assert_eq!(set.matches.len(), 4);
    // reference intervals are constant, generated ones are too (0.51 each)
    assert!(close(rhythm_accuracy(&set.matches), 1.0));
}

#[test]
fn invalid_settings_are_rejected() {
    let mut settings = CompareSettings::default();
    settings.tolerances.timing_seconds = -1.0;
    let err = compare(&melody(), &melody(), &settings).expect_err("compare should fail");
    assert!(matches!(err, CompareError::Config(_)));
}

#[test]
fn noisy_transcription_stays_in_range() {
    let reference = melody();
    let generated = vec![
        note(0, 60, 0.03, 0.45, 60),
        note(1, 61, 0.02, 0.3, 110),
        note(2, 62, 0.56, 0.4, 90),
        note(3, 67, 1.08, 0.7, 127),
        note(4, 48, 1.5, 2.0, 20),
        note(5, 72, 2.2, 0.1, 64),
        note(6, 84, 4.5, 0.5, 64),
    ];

    let report = compare(&generated, &reference, &CompareSettings::default())
        .expect("compare should succeed");
    assert_eq!(
        report.matched_count + report.unmatched_generated_count,
        generated.len()
    );
    assert_eq!(
        report.matched_count + report.unmatched_reference_count,
        reference.len()
    );
    assert!(report.overall_score < 1.0);
    assert_in_unit_range(&report);
}

#[test]
fn extremely_long_note_still_scores_within_range() {
    // about what a 1 ppq file at the slowest tempo yields for one held note
    let notes = vec![note(0, 60, 0.0, 4.5e9, 80), note(1, 64, 1.0, 0.5, 80)];
    let report = compare(&notes, &notes.clone(), &CompareSettings::default())
        .expect("compare should succeed");

    assert!(close(report.metrics.density_similarity, 1.0));
    assert!(close(report.metrics.polyphony_similarity, 1.0));
    assert_in_unit_range(&report);
}

#[test]
fn short_self_comparison_has_no_rhythm_score() {
    let notes = vec![note(0, 60, 0.0, 0.5, 80), note(1, 62, 0.5, 0.5, 80)];
    let report = compare(&notes, &notes.clone(), &CompareSettings::default())
        .expect("compare should succeed");

    assert_eq!(report.matched_count, 2);
    assert!(close(report.metrics.note_accuracy, 1.0));
    assert_eq!(report.metrics.rhythm_accuracy, 0.0);
    // everything but the rhythm weight
    assert!(close(report.overall_score, 0.85));
}

#[test]
fn even_against_uneven_rhythm_is_neutral() {
    let generated: Vec<NoteEvent> = (0..4)
        .map(|i| note(i, 60 + i as u8, i as f64 * 0.5, 0.25, 80))
        .collect();
    let reference = vec![
        note(0, 60, 0.0, 0.25, 80),
        note(1, 61, 0.5, 0.25, 80),
        note(2, 62, 1.05, 0.25, 80),
        note(3, 63, 1.5, 0.25, 80),
    ];
    let matched = match_notes(
        &generated,
        &reference,
        &MatchTolerances::default(),
        &MatchWeights::default(),
    );

    assert_eq!(matched.matches.len(), 4);
    assert_eq!(rhythm_accuracy(&matched.matches), 0.5);
}
