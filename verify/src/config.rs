use serde::{Deserialize, Serialize};

use crate::VerifyError;

/// How an embedding pair is turned into a similarity.
///
/// The choice belongs to the embedding source: angle-compared features use
/// `Cosine`, models trained with a contrastive or triplet objective use
/// `Distance`. One engine uses one strategy for every comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Cosine similarity; negative similarities score 0.
    #[default]
    Cosine,
    /// `1 / (1 + euclidean_distance)`.
    Distance,
}

/// Which value sample verification compares against `aggregate_threshold`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregatePolicy {
    /// Mean of all scored samples.
    #[default]
    Mean,
    /// Score of the sample submitted at `index` (0-based). When no sample
    /// was submitted there, or it could not be scored, the first scored
    /// sample stands in.
    Representative { index: usize },
}

/// Controls engine behavior. All thresholds are percentages and inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub strategy: Strategy,

    /// Minimum score for each individual sample. Default: 80.
    pub sample_threshold: f64,

    /// Minimum aggregate score across samples. Default: 80.
    pub aggregate_threshold: f64,

    pub aggregate: AggregatePolicy,

    /// Minimum best-candidate score for catalog identification. Default: 60.
    pub identity_threshold: f64,

    /// Expected embedding dimension. 0 accepts any, as long as the two
    /// sides of each comparison agree.
    pub dim: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Cosine,
            sample_threshold: 80.0,
            aggregate_threshold: 80.0,
            aggregate: AggregatePolicy::Mean,
            identity_threshold: 60.0,
            dim: 0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), VerifyError> {
        for (name, value) in [
            ("sample_threshold", self.sample_threshold),
            ("aggregate_threshold", self.aggregate_threshold),
            ("identity_threshold", self.identity_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(VerifyError::InvalidConfig(format!(
                    "{name} must be within [0, 100], got {value}"
                )));
            }
        }
        Ok(())
    }
}
