//! Independent similarity measures between a generated and a reference note set.
//!
//! Every function returns a value in `[0, 1]` and falls back to an explicit value
//! instead of dividing by zero, so callers can compute any subset on any input.

use crate::matcher::{MatchSet, NoteMatch};
use encore_domain_score::{notes_duration, pitch_class, NoteEvent};
use encore_ports::settings::{CompareSettings, Metric};
use encore_ports::types::{clamp01, Seconds, VELOCITY_MAX};
use serde::{Deserialize, Serialize};

const VARIANCE_EPSILON: f64 = 1e-12;
const MIN_RHYTHM_MATCHES: usize = 3;
const BIN_EPSILON: f64 = 1e-9;

/// Upper bound on the length of a density or polyphony series.
pub const MAX_BINS: usize = 100_000;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct SimilarityMetrics {
    pub precision: f64,
    pub recall: f64,
    pub note_accuracy: f64,
    pub timing_accuracy: f64,
    pub rhythm_accuracy: f64,
    pub velocity_accuracy: f64,
    pub duration_accuracy: f64,
    pub pitch_class_similarity: f64,
    pub density_similarity: f64,
    pub polyphony_similarity: f64,
    pub range_overlap: f64,
}

impl SimilarityMetrics {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Precision => self.precision,
            Metric::Recall => self.recall,
            Metric::NoteAccuracy => self.note_accuracy,
            Metric::TimingAccuracy => self.timing_accuracy,
            Metric::RhythmAccuracy => self.rhythm_accuracy,
            Metric::VelocityAccuracy => self.velocity_accuracy,
            Metric::DurationAccuracy => self.duration_accuracy,
            Metric::PitchClassSimilarity => self.pitch_class_similarity,
            Metric::DensitySimilarity => self.density_similarity,
            Metric::PolyphonySimilarity => self.polyphony_similarity,
            Metric::RangeOverlap => self.range_overlap,
        }
    }
}

pub fn compute_metrics(
    generated: &[NoteEvent],
    reference: &[NoteEvent],
    matched: &MatchSet,
    settings: &CompareSettings,
) -> SimilarityMetrics {
    let count = matched.matches.len();
    let precision = precision(count, generated.len());
    let recall = recall(count, reference.len());

    SimilarityMetrics {
        precision,
        recall,
        note_accuracy: f1(precision, recall),
        timing_accuracy: timing_accuracy(&matched.matches, settings.tolerances.timing_seconds),
        rhythm_accuracy: rhythm_accuracy(&matched.matches),
        velocity_accuracy: velocity_accuracy(&matched.matches),
        duration_accuracy: duration_accuracy(&matched.matches),
        pitch_class_similarity: pitch_class_similarity(generated, reference),
        density_similarity: density_similarity(generated, reference, settings.bins.density_seconds),
        polyphony_similarity: polyphony_similarity(
            generated,
            reference,
            settings.bins.polyphony_seconds,
        ),
        range_overlap: range_overlap(generated, reference),
    }
}

pub fn precision(matched: usize, generated: usize) -> f64 {
    clamp01(matched as f64 / generated.max(1) as f64)
}

pub fn recall(matched: usize, reference: usize) -> f64 {
    clamp01(matched as f64 / reference.max(1) as f64)
}

/// Harmonic mean of precision and recall.
pub fn f1(precision: f64, recall: f64) -> f64 {
    let sum = precision + recall;
    if sum <= 0.0 {
        return 0.0;
    }
    clamp01(2.0 * precision * recall / sum)
}

pub fn timing_accuracy(matches: &[NoteMatch], tolerance: Seconds) -> f64 {
    let Some(mean_error) = mean(matches.iter().map(|m| m.timing_error)) else {
        return 0.0;
    };
    if tolerance <= 0.0 {
        return if mean_error == 0.0 { 1.0 } else { 0.0 };
    }
    clamp01(1.0 - mean_error / tolerance)
}

/// Correlation of inter-onset intervals between matched generated and reference onsets.
pub fn rhythm_accuracy(matches: &[NoteMatch]) -> f64 {
    if matches.len() < MIN_RHYTHM_MATCHES {
        return 0.0;
    }
    let generated = inter_onset_intervals(matches.iter().map(|m| m.generated.start_time));
    let reference = inter_onset_intervals(matches.iter().map(|m| m.reference.start_time));
    if generated.len() < 2 || reference.len() < 2 {
        return 0.0;
    }

    match (z_scores(&generated), z_scores(&reference)) {
        (Some(a), Some(b)) => {
            let r = a.iter().zip(&b).map(|(x, y)| x * y).sum::<f64>() / a.len() as f64;
            clamp01((r.clamp(-1.0, 1.0) + 1.0) / 2.0)
        }
        // both interval sequences are even: the rhythms agree up to tempo
        (None, None) => 1.0,
        // correlation with a constant sequence is undefined; treat it as none
        _ => 0.5,
    }
}

pub fn velocity_accuracy(matches: &[NoteMatch]) -> f64 {
    mean(matches.iter().map(|m| m.velocity_error as f64))
        .map_or(0.0, |err| clamp01(1.0 - err / VELOCITY_MAX as f64))
}

pub fn duration_accuracy(matches: &[NoteMatch]) -> f64 {
    let (Some(mean_error), Some(mean_reference)) = (
        mean(matches.iter().map(|m| m.duration_error)),
        mean(matches.iter().map(|m| m.reference.duration)),
    ) else {
        return 0.0;
    };
    if mean_reference <= 0.0 {
        return 0.0;
    }
    clamp01(1.0 - mean_error / mean_reference)
}

/// Cosine similarity of 12-bin pitch-class histograms.
pub fn pitch_class_similarity(a: &[NoteEvent], b: &[NoteEvent]) -> f64 {
    let ha = pitch_class_histogram(a);
    let hb = pitch_class_histogram(b);
    let dot: f64 = ha.iter().zip(&hb).map(|(x, y)| x * y).sum();
    let norm_a = ha.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = hb.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    clamp01(dot / (norm_a * norm_b))
}

pub fn pitch_class_histogram(notes: &[NoteEvent]) -> [f64; 12] {
    let mut histogram = [0.0; 12];
    for note in notes {
        histogram[pitch_class(note.pitch)] += 1.0;
    }
    histogram
}

/// Similarity of note-onset counts per `bin_seconds` bin.
pub fn density_similarity(a: &[NoteEvent], b: &[NoteEvent], bin_seconds: Seconds) -> f64 {
    let Some((bins, width)) = bin_grid(a, b, bin_seconds) else {
        return 0.0;
    };
    series_similarity(
        &onset_density(a, bins, width),
        &onset_density(b, bins, width),
    )
}

/// Similarity of how many notes sound during each `bin_seconds` bin.
pub fn polyphony_similarity(a: &[NoteEvent], b: &[NoteEvent], bin_seconds: Seconds) -> f64 {
    let Some((bins, width)) = bin_grid(a, b, bin_seconds) else {
        return 0.0;
    };
    series_similarity(
        &polyphony_curve(a, bins, width),
        &polyphony_curve(b, bins, width),
    )
}

pub fn onset_density(notes: &[NoteEvent], bins: usize, bin_seconds: Seconds) -> Vec<f64> {
    let mut series = vec![0.0; bins];
    if bins == 0 {
        return series;
    }
    for note in notes {
        let idx = bin_index(note.start_time, bin_seconds).min(bins - 1);
        series[idx] += 1.0;
    }
    series
}

pub fn polyphony_curve(notes: &[NoteEvent], bins: usize, bin_seconds: Seconds) -> Vec<f64> {
    if bins == 0 {
        return Vec::new();
    }
    // +1 where a note enters, -1 after its last bin; a prefix sum gives the counts
    let mut deltas = vec![0.0; bins + 1];
    for note in notes {
        let first = bin_index(note.start_time, bin_seconds).min(bins - 1);
        let last = (bins_to_cover(note.end_time, bin_seconds) as usize)
            .saturating_sub(1)
            .clamp(first, bins - 1);
        deltas[first] += 1.0;
        deltas[last + 1] -= 1.0;
    }
    let mut sounding = 0.0;
    deltas[..bins]
        .iter()
        .map(|delta| {
            sounding += delta;
            sounding
        })
        .collect()
}

/// Inclusive pitch-range intersection over union.
pub fn range_overlap(a: &[NoteEvent], b: &[NoteEvent]) -> f64 {
    let (Some((a_lo, a_hi)), Some((b_lo, b_hi))) = (pitch_range(a), pitch_range(b)) else {
        return 0.0;
    };
    let lo = a_lo.max(b_lo) as i32;
    let hi = a_hi.min(b_hi) as i32;
    let intersection = (hi - lo + 1).max(0) as f64;
    let union = (a_hi.max(b_hi) as i32 - a_lo.min(b_lo) as i32 + 1) as f64;
    clamp01(intersection / union)
}

fn pitch_range(notes: &[NoteEvent]) -> Option<(u8, u8)> {
    let lo = notes.iter().map(|n| n.pitch).min()?;
    let hi = notes.iter().map(|n| n.pitch).max()?;
    Some((lo, hi))
}

/// Bin count and width covering the longer input. Spans needing more than
/// [`MAX_BINS`] bins get wider bins instead.
fn bin_grid(a: &[NoteEvent], b: &[NoteEvent], bin_seconds: Seconds) -> Option<(usize, Seconds)> {
    let span = notes_duration(a).max(notes_duration(b));
    if !span.is_finite() || span <= 0.0 || bin_seconds <= 0.0 {
        return None;
    }
    let bins = bins_to_cover(span, bin_seconds);
    if bins > MAX_BINS as f64 {
        return Some((MAX_BINS, span / MAX_BINS as f64));
    }
    Some(((bins as usize).max(1), bin_seconds))
}

/// Bins needed to reach `time`, ignoring division noise just above a boundary.
fn bins_to_cover(time: Seconds, bin_seconds: Seconds) -> f64 {
    (time / bin_seconds - BIN_EPSILON).ceil()
}

fn bin_index(time: Seconds, bin_seconds: Seconds) -> usize {
    (time.max(0.0) / bin_seconds + BIN_EPSILON).floor() as usize
}

/// `1 - mean absolute error` after scaling each series by its own maximum.
fn series_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let a = max_normalized(a);
    let b = max_normalized(b);
    let mae = a.iter().zip(&b).map(|(x, y)| (x - y).abs()).sum::<f64>() / a.len() as f64;
    clamp01(1.0 - mae)
}

fn max_normalized(series: &[f64]) -> Vec<f64> {
    let max = series.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return series.to_vec();
    }
    series.iter().map(|x| x / max).collect()
}

fn inter_onset_intervals(onsets: impl Iterator<Item = Seconds>) -> Vec<Seconds> {
    let onsets: Vec<Seconds> = onsets.collect();
    onsets.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Population z-scores, or `None` when the sequence has no variance.
fn z_scores(values: &[f64]) -> Option<Vec<f64>> {
    let mean = mean(values.iter().copied())?;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
    if variance <= VARIANCE_EPSILON {
        return None;
    }
    let std_dev = variance.sqrt();
    Some(values.iter().map(|x| (x - mean) / std_dev).collect())
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), x| (sum + x, count + 1));
    (count > 0).then(|| sum / count as f64)
}
