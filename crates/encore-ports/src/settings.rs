use crate::types::Seconds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_timing_seconds() -> Seconds {
    0.1
}

fn default_velocity_tolerance() -> u8 {
    127
}

fn default_density_bin_seconds() -> Seconds {
    1.0
}

fn default_polyphony_bin_seconds() -> Seconds {
    0.1
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} tolerance must be a finite value >= 0, got {value}")]
    NegativeTolerance { name: &'static str, value: f64 },
    #[error("weight for {name} must be a finite value >= 0, got {value}")]
    InvalidWeight { name: String, value: f64 },
    #[error("{name} bin width must be a finite value > 0, got {value}")]
    InvalidBinWidth { name: &'static str, value: f64 },
}

/// Gates a generated note must pass to be paired with a reference note.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTolerances {
    #[serde(default = "default_timing_seconds")]
    pub timing_seconds: Seconds,
    pub pitch_semitones: u8,
    /// Not used as a matching gate yet.
    #[serde(default = "default_velocity_tolerance")]
    pub velocity: u8,
}

impl Default for MatchTolerances {
    fn default() -> Self {
        Self {
            timing_seconds: default_timing_seconds(),
            pitch_semitones: 0,
            velocity: default_velocity_tolerance(),
        }
    }
}

/// Per-factor weights of a single match's quality.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchWeights {
    pub timing: f64,
    pub pitch: f64,
    pub velocity: f64,
    pub duration: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            timing: 0.5,
            pitch: 0.2,
            velocity: 0.1,
            duration: 0.2,
        }
    }
}

impl MatchWeights {
    pub fn sum(&self) -> f64 {
        self.timing + self.pitch + self.velocity + self.duration
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Precision,
    Recall,
    NoteAccuracy,
    TimingAccuracy,
    RhythmAccuracy,
    VelocityAccuracy,
    DurationAccuracy,
    PitchClassSimilarity,
    DensitySimilarity,
    PolyphonySimilarity,
    RangeOverlap,
}

impl Metric {
    pub const ALL: [Metric; 11] = [
        Metric::Precision,
        Metric::Recall,
        Metric::NoteAccuracy,
        Metric::TimingAccuracy,
        Metric::RhythmAccuracy,
        Metric::VelocityAccuracy,
        Metric::DurationAccuracy,
        Metric::PitchClassSimilarity,
        Metric::DensitySimilarity,
        Metric::PolyphonySimilarity,
        Metric::RangeOverlap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Precision => "precision",
            Metric::Recall => "recall",
            Metric::NoteAccuracy => "note_accuracy",
            Metric::TimingAccuracy => "timing_accuracy",
            Metric::RhythmAccuracy => "rhythm_accuracy",
            Metric::VelocityAccuracy => "velocity_accuracy",
            Metric::DurationAccuracy => "duration_accuracy",
            Metric::PitchClassSimilarity => "pitch_class_similarity",
            Metric::DensitySimilarity => "density_similarity",
            Metric::PolyphonySimilarity => "polyphony_similarity",
            Metric::RangeOverlap => "range_overlap",
        }
    }
}

/// Weight map for the overall score. Metrics without an entry do not contribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreWeights(pub BTreeMap<Metric, f64>);

impl Default for ScoreWeights {
    fn default() -> Self {
        Self(BTreeMap::from([
            (Metric::NoteAccuracy, 0.30),
            (Metric::TimingAccuracy, 0.20),
            (Metric::RhythmAccuracy, 0.15),
            (Metric::VelocityAccuracy, 0.10),
            (Metric::DurationAccuracy, 0.10),
            (Metric::PitchClassSimilarity, 0.075),
            (Metric::DensitySimilarity, 0.05),
            (Metric::PolyphonySimilarity, 0.025),
            (Metric::RangeOverlap, 0.0),
        ]))
    }
}

impl ScoreWeights {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0.get(&metric).copied()
    }

    pub fn set(&mut self, metric: Metric, weight: f64) {
        self.0.insert(metric, weight);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.0.iter().map(|(metric, weight)| (*metric, *weight))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinWidths {
    #[serde(default = "default_density_bin_seconds")]
    pub density_seconds: Seconds,
    #[serde(default = "default_polyphony_bin_seconds")]
    pub polyphony_seconds: Seconds,
}

impl Default for BinWidths {
    fn default() -> Self {
        Self {
            density_seconds: default_density_bin_seconds(),
            polyphony_seconds: default_polyphony_bin_seconds(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CompareSettings {
    pub tolerances: MatchTolerances,
    pub match_weights: MatchWeights,
    pub score_weights: ScoreWeights,
    pub bins: BinWidths,
}

impl CompareSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timing = self.tolerances.timing_seconds;
        if !timing.is_finite() || timing < 0.0 {
            return Err(ConfigError::NegativeTolerance {
                name: "timing",
                value: timing,
            });
        }

        let match_weights = [
            ("match.timing", self.match_weights.timing),
            ("match.pitch", self.match_weights.pitch),
            ("match.velocity", self.match_weights.velocity),
            ("match.duration", self.match_weights.duration),
        ];
        for (name, value) in match_weights {
            check_weight(name, value)?;
        }
        for (metric, value) in self.score_weights.iter() {
            check_weight(metric.name(), value)?;
        }

        check_bin_width("density", self.bins.density_seconds)?;
        check_bin_width("polyphony", self.bins.polyphony_seconds)?;
        Ok(())
    }
}

fn check_weight(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeight {
            name: name.to_string(),
            value,
        })
    }
}

fn check_bin_width(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidBinWidth { name, value })
    }
}
