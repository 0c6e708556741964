use crate::aggregate::overall_score;
use crate::matcher::{match_notes, NoteMatch};
use crate::metrics::{compute_metrics, SimilarityMetrics};
use encore_domain_score::NoteEvent;
use encore_ports::settings::{CompareSettings, ConfigError};
use encore_ports::types::Seconds;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(thiserror::Error, Debug)]
pub enum CompareError {
    #[error("invalid comparison settings: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub overall_score: f64,
    pub metrics: SimilarityMetrics,
    pub generated_count: usize,
    pub reference_count: usize,
    pub matched_count: usize,
    pub unmatched_generated_count: usize,
    pub unmatched_reference_count: usize,
    /// Mean signed onset offset of matched notes; negative means the performance runs early.
    pub mean_onset_delta: Seconds,
    pub matches: Vec<NoteMatch>,
    pub unmatched_generated: Vec<NoteEvent>,
    pub unmatched_reference: Vec<NoteEvent>,
    pub settings: CompareSettings,
}

/// Aligns `generated` against `reference` and scores the result.
pub fn compare(
    generated: &[NoteEvent],
    reference: &[NoteEvent],
    settings: &CompareSettings,
) -> Result<ComparisonReport, CompareError> {
    settings.validate()?;

    let matched = match_notes(
        generated,
        reference,
        &settings.tolerances,
        &settings.match_weights,
    );
    let metrics = compute_metrics(generated, reference, &matched, settings);
    let overall_score = overall_score(&metrics, &settings.score_weights);

    let mean_onset_delta = if matched.matches.is_empty() {
        0.0
    } else {
        matched.matches.iter().map(|m| m.onset_delta).sum::<f64>() / matched.matches.len() as f64
    };

    debug!(
        overall_score,
        note_accuracy = metrics.note_accuracy,
        timing_accuracy = metrics.timing_accuracy,
        "comparison scored"
    );

    Ok(ComparisonReport {
        overall_score,
        metrics,
        generated_count: generated.len(),
        reference_count: reference.len(),
        matched_count: matched.matches.len(),
        unmatched_generated_count: matched.unmatched_generated.len(),
        unmatched_reference_count: matched.unmatched_reference.len(),
        mean_onset_delta,
        matches: matched.matches,
        unmatched_generated: matched.unmatched_generated,
        unmatched_reference: matched.unmatched_reference,
        settings: settings.clone(),
    })
}
