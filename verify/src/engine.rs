use rollcall_vecmath::{Embedding, VecMathError, check_vector};
use serde::Serialize;
use tracing::{debug, warn};

use crate::scorer::round2;
use crate::{AggregatePolicy, EngineConfig, Scorer, VerifyError};

/// One probe sample submitted for verification (e.g. a document page).
#[derive(Debug, Clone)]
pub enum Sample {
    Embedded(Embedding),
    /// The sample produced no usable embedding upstream.
    Unreadable { reason: String },
}

/// Aggregate outcome of verifying samples against a reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub identity_id: Option<String>,

    /// Scores of the usable samples, in submission order.
    pub per_sample_scores: Vec<f64>,

    pub aggregate_score: f64,

    pub matched: bool,

    /// 1-indexed positions of samples scoring below `sample_threshold`.
    pub failed_samples: Vec<usize>,

    /// 1-indexed positions of samples that could not be scored.
    pub unreadable_samples: Vec<usize>,
}

/// A catalog candidate and its score against a probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub id: String,
    pub score: f64,
}

/// Result of identifying one probe against a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    /// Highest-scoring candidate, whether or not it cleared the threshold.
    /// `None` when no candidate could be scored.
    pub best: Option<Match>,

    /// True when `best` scored at or above `identity_threshold`.
    pub matched: bool,

    /// Ids of candidates excluded because their embedding was malformed
    /// relative to the probe.
    pub skipped: Vec<String>,
}

impl Identification {
    /// The accepted candidate, if any.
    pub fn accepted(&self) -> Option<&Match> {
        self.best.as_ref().filter(|_| self.matched)
    }
}

/// Applies acceptance policy on top of a [`Scorer`].
#[derive(Debug, Clone)]
pub struct Engine {
    cfg: EngineConfig,
    scorer: Scorer,
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Result<Self, VerifyError> {
        cfg.validate()?;
        let scorer = Scorer::new(cfg.strategy);
        Ok(Self { cfg, scorer })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Verifies `samples` against a single `reference`.
    ///
    /// A malformed reference fails the whole call with
    /// [`VerifyError::InvalidEmbedding`]; so does a reference whose length
    /// matches none of the embedded samples. Otherwise unreadable or
    /// malformed samples are excluded and reported in `unreadable_samples`.
    /// Fails with [`VerifyError::NoSamples`] when nothing could be scored.
    pub fn verify(&self, reference: &Embedding, samples: &[Sample]) -> Result<Verdict, VerifyError> {
        self.check_dim(reference)?;
        check_vector(reference)?;
        if samples.is_empty() {
            return Err(VerifyError::NoSamples);
        }

        let mut scores = Vec::with_capacity(samples.len());
        let mut embedded = 0;
        let mut mismatch = None;
        for (i, sample) in samples.iter().enumerate() {
            let score = match sample {
                Sample::Embedded(emb) => {
                    embedded += 1;
                    match self.scorer.score(reference, emb) {
                        Ok(score) => {
                            debug!(sample = i + 1, score, "sample scored");
                            Some(score)
                        }
                        Err(e) => {
                            warn!(sample = i + 1, error = %e, "sample excluded");
                            if let VerifyError::InvalidEmbedding(
                                m @ VecMathError::DimensionMismatch { .. },
                            ) = e
                            {
                                mismatch.get_or_insert((m, 0)).1 += 1;
                            }
                            None
                        }
                    }
                }
                Sample::Unreadable { reason } => {
                    warn!(sample = i + 1, reason = %reason, "sample unreadable");
                    None
                }
            };
            scores.push(score);
        }

        // No embedded sample shares the reference's length.
        if let Some((m, count)) = mismatch {
            if count == embedded {
                return Err(m.into());
            }
        }

        self.evaluate_scores(&scores)
    }

    /// Applies the sample policy to precomputed scores. `None` marks a
    /// sample that could not be scored.
    pub fn evaluate_scores(&self, scores: &[Option<f64>]) -> Result<Verdict, VerifyError> {
        let mut per_sample_scores = Vec::with_capacity(scores.len());
        let mut failed_samples = Vec::new();
        let mut unreadable_samples = Vec::new();

        for (i, score) in scores.iter().enumerate() {
            match score {
                Some(s) => {
                    if *s < self.cfg.sample_threshold {
                        failed_samples.push(i + 1);
                    }
                    per_sample_scores.push(*s);
                }
                None => unreadable_samples.push(i + 1),
            }
        }

        if per_sample_scores.is_empty() {
            return Err(VerifyError::NoSamples);
        }

        let aggregate_score = match self.cfg.aggregate {
            AggregatePolicy::Mean => {
                round2(per_sample_scores.iter().sum::<f64>() / per_sample_scores.len() as f64)
            }
            AggregatePolicy::Representative { index } => match scores.get(index) {
                Some(Some(s)) => *s,
                _ => per_sample_scores[0],
            },
        };

        let matched =
            failed_samples.is_empty() && aggregate_score >= self.cfg.aggregate_threshold;

        Ok(Verdict {
            identity_id: None,
            per_sample_scores,
            aggregate_score,
            matched,
            failed_samples,
            unreadable_samples,
        })
    }

    /// Finds the best-scoring candidate for `probe`.
    ///
    /// Candidates whose embedding cannot be compared with the probe are
    /// skipped; the rest still compete. Not finding a match is a normal
    /// outcome, not an error. Fails only if the probe itself is malformed.
    pub fn identify<'a, I>(&self, probe: &Embedding, candidates: I) -> Result<Identification, VerifyError>
    where
        I: IntoIterator<Item = (&'a str, &'a Embedding)>,
    {
        self.check_dim(probe)?;
        check_vector(probe)?;

        let mut best: Option<Match> = None;
        let mut skipped = Vec::new();

        for (id, emb) in candidates {
            let score = match self.scorer.score(probe, emb) {
                Ok(s) => s,
                Err(e) => {
                    warn!(candidate = id, error = %e, "candidate excluded");
                    skipped.push(id.to_string());
                    continue;
                }
            };
            debug!(candidate = id, score, "candidate scored");

            let better = match &best {
                None => true,
                Some(b) => score > b.score || (score == b.score && id < b.id.as_str()),
            };
            if better {
                best = Some(Match {
                    id: id.to_string(),
                    score,
                });
            }
        }

        let matched = best
            .as_ref()
            .is_some_and(|b| b.score >= self.cfg.identity_threshold);

        Ok(Identification {
            best,
            matched,
            skipped,
        })
    }

    fn check_dim(&self, emb: &Embedding) -> Result<(), VerifyError> {
        if self.cfg.dim != 0 && emb.dim() != self.cfg.dim {
            return Err(VecMathError::DimensionMismatch {
                expected: self.cfg.dim,
                got: emb.dim(),
            }
            .into());
        }
        Ok(())
    }
}
