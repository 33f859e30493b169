use rollcall_vecmath::Embedding;
use serde::Deserialize;
use tracing::debug;

use crate::{EmbeddingSource, ExtractError, Region};

/// Reads precomputed embeddings encoded as JSON.
///
/// Accepted payloads:
///
/// ```text
/// [0.1, 0.2, ...]                  one region
/// [[0.1, ...], null, [0.3, ...]]   several regions; null marks a failed one
/// []                               nothing detected
/// ```
#[derive(Debug, Default, Clone)]
pub struct JsonEmbeddingSource {
    dim: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    One(Vec<f32>),
    Many(Vec<Option<Vec<f32>>>),
}

impl JsonEmbeddingSource {
    /// `dim` is reported by [`EmbeddingSource::dimension`]; 0 if unknown.
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl EmbeddingSource for JsonEmbeddingSource {
    fn extract(&self, input: &[u8]) -> Result<Vec<Region>, ExtractError> {
        let payload: Payload = serde_json::from_slice(input)
            .map_err(|e| ExtractError::ExtractionFailed(format!("invalid embedding json: {e}")))?;

        let raw = match payload {
            Payload::One(v) if v.is_empty() => Vec::new(),
            Payload::One(v) => vec![Some(v)],
            Payload::Many(vs) => vs,
        };

        let regions: Vec<Region> = raw
            .into_iter()
            .map(|v| match v {
                Some(values) => match Embedding::new(values) {
                    Ok(e) => Region::Embedded(e),
                    Err(e) => Region::Failed {
                        reason: e.to_string(),
                    },
                },
                None => Region::Failed {
                    reason: "region not embedded".into(),
                },
            })
            .collect();
        debug!(regions = regions.len(), "json embeddings decoded");
        Ok(regions)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
