use crate::metrics::SimilarityMetrics;
use encore_ports::settings::ScoreWeights;
use encore_ports::types::clamp01;

/// Weighted mean of the metrics named in `weights`; 0 when the weights sum to 0.
pub fn overall_score(metrics: &SimilarityMetrics, weights: &ScoreWeights) -> f64 {
    let (weighted, total) = weights
        .iter()
        .filter(|(_, weight)| *weight > 0.0)
        .fold((0.0, 0.0), |(weighted, total), (metric, weight)| {
            (weighted + weight * metrics.get(metric), total + weight)
        });
    if total <= 0.0 {
        return 0.0;
    }
    clamp01(weighted / total)
}
