use encore_domain_score::NoteEvent;
use encore_ports::settings::{MatchTolerances, MatchWeights};
use encore_ports::types::{clamp01, Seconds, VELOCITY_MAX};
use serde::{Deserialize, Serialize};
use tracing::debug;

const TIME_COST: f64 = 2.0;
const PITCH_COST: f64 = 0.1;
const DURATION_COST: f64 = 0.5;

const PITCH_SCALE_SEMITONES: f64 = 12.0;
const MIN_DURATION_SCALE: Seconds = 0.05;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteMatch {
    pub generated: NoteEvent,
    pub reference: NoteEvent,
    /// Generated onset minus reference onset; negative means early.
    pub onset_delta: Seconds,
    pub timing_error: Seconds,
    pub pitch_error: u8,
    pub velocity_error: u8,
    pub duration_error: Seconds,
    pub quality: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct MatchSet {
    pub matches: Vec<NoteMatch>,
    pub unmatched_generated: Vec<NoteEvent>,
    pub unmatched_reference: Vec<NoteEvent>,
}

/// Greedy one-to-one alignment of `generated` onto `reference`.
///
/// Both slices are expected in chronological order. Generated notes are visited
/// in order and each takes the closest still-available reference note inside the
/// tolerances, so an earlier note can claim a reference that a later note would
/// have fit better. Ties keep the earliest reference note.
pub fn match_notes(
    generated: &[NoteEvent],
    reference: &[NoteEvent],
    tolerances: &MatchTolerances,
    weights: &MatchWeights,
) -> MatchSet {
    let mut consumed = vec![false; reference.len()];
    let mut matches = Vec::new();
    let mut unmatched_generated = Vec::new();

    for note in generated {
        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in reference.iter().enumerate() {
            if consumed[idx] {
                continue;
            }
            let dt = (note.start_time - candidate.start_time).abs();
            let dp = note.pitch.abs_diff(candidate.pitch);
            if dt > tolerances.timing_seconds || dp > tolerances.pitch_semitones {
                continue;
            }
            let dd = (note.duration - candidate.duration).abs();
            let cost = TIME_COST * dt + PITCH_COST * dp as f64 + DURATION_COST * dd;
            if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                best = Some((idx, cost));
            }
        }

        match best {
            Some((idx, _)) => {
                consumed[idx] = true;
                matches.push(build_match(note, &reference[idx], tolerances, weights));
            }
            None => unmatched_generated.push(note.clone()),
        }
    }

    let unmatched_reference: Vec<NoteEvent> = reference
        .iter()
        .zip(&consumed)
        .filter(|(_, used)| !**used)
        .map(|(note, _)| note.clone())
        .collect();

    debug!(
        generated = generated.len(),
        reference = reference.len(),
        matched = matches.len(),
        "matched notes"
    );

    MatchSet {
        matches,
        unmatched_generated,
        unmatched_reference,
    }
}

fn build_match(
    generated: &NoteEvent,
    reference: &NoteEvent,
    tolerances: &MatchTolerances,
    weights: &MatchWeights,
) -> NoteMatch {
    let onset_delta = generated.start_time - reference.start_time;
    let timing_error = onset_delta.abs();
    let pitch_error = generated.pitch.abs_diff(reference.pitch);
    let velocity_error = generated.velocity.abs_diff(reference.velocity);
    let duration_error = (generated.duration - reference.duration).abs();

    let timing_quality = if tolerances.timing_seconds > 0.0 {
        clamp01(1.0 - timing_error / tolerances.timing_seconds)
    } else if timing_error == 0.0 {
        1.0
    } else {
        0.0
    };
    let pitch_quality = clamp01(1.0 - pitch_error as f64 / PITCH_SCALE_SEMITONES);
    let velocity_quality = clamp01(1.0 - velocity_error as f64 / VELOCITY_MAX as f64);
    let duration_scale = reference.duration.max(MIN_DURATION_SCALE);
    let duration_quality = clamp01(1.0 - duration_error / duration_scale);

    let total = weights.sum();
    let quality = if total > 0.0 {
        clamp01(
            (weights.timing * timing_quality
                + weights.pitch * pitch_quality
                + weights.velocity * velocity_quality
                + weights.duration * duration_quality)
                / total,
        )
    } else {
        0.0
    };

    NoteMatch {
        generated: generated.clone(),
        reference: reference.clone(),
        onset_delta,
        timing_error,
        pitch_error,
        velocity_error,
        duration_error,
        quality,
    }
}
