use rollcall_vecmath::{cosine_similarity, distance_to_similarity, euclidean_distance};

use crate::{Strategy, VerifyError};

/// Outcome of a single pair comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    /// Similarity as a percentage in `[0, 100]`, rounded to 2 decimals.
    pub score: f64,
    pub matched: bool,
}

/// Scores embedding pairs with a fixed [`Strategy`].
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    strategy: Strategy,
}

impl Scorer {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Similarity of `a` and `b` as a percentage in `[0, 100]`.
    pub fn score(&self, a: &[f32], b: &[f32]) -> Result<f64, VerifyError> {
        let sim = match self.strategy {
            Strategy::Cosine => cosine_similarity(a, b)?.max(0.0),
            Strategy::Distance => distance_to_similarity(euclidean_distance(a, b)?),
        };
        Ok(to_percent(sim))
    }

    /// Scores the pair and gates it on an inclusive `threshold`.
    pub fn compare(&self, a: &[f32], b: &[f32], threshold: f64) -> Result<Comparison, VerifyError> {
        let score = self.score(a, b)?;
        Ok(Comparison {
            score,
            matched: score >= threshold,
        })
    }
}

/// Scales a unit similarity to a percentage rounded to 2 decimals.
pub fn to_percent(sim: f64) -> f64 {
    round2(sim * 100.0)
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_self_is_100() {
        let s = Scorer::new(Strategy::Cosine);
        assert_eq!(s.score(&[0.2, 0.4, 0.1], &[0.2, 0.4, 0.1]).unwrap(), 100.0);
    }

    #[test]
    fn cosine_scales_and_rounds() {
        let s = Scorer::new(Strategy::Cosine);
        // cos = 1 / sqrt(2)
        assert_eq!(s.score(&[1.0, 0.0], &[1.0, 1.0]).unwrap(), 70.71);
    }

    #[test]
    fn cosine_negative_floors_at_zero() {
        let s = Scorer::new(Strategy::Cosine);
        assert_eq!(s.score(&[1.0, 0.0], &[-1.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn distance_strategy() {
        let s = Scorer::new(Strategy::Distance);
        assert_eq!(s.score(&[1.0, 2.0], &[1.0, 2.0]).unwrap(), 100.0);
        assert_eq!(s.score(&[1.0, 1.0], &[4.0, 5.0]).unwrap(), 16.67);
        assert!(matches!(
            s.score(&[0.0, 0.0], &[3.0, 4.0]),
            Err(VerifyError::InvalidEmbedding(_))
        ));
    }

    #[test]
    fn symmetric_and_reproducible() {
        let a = [0.31, -0.7, 0.12, 0.9];
        let b = [0.05, 0.4, -0.33, 0.6];
        for strategy in [Strategy::Cosine, Strategy::Distance] {
            let s = Scorer::new(strategy);
            let ab = s.score(&a, &b).unwrap();
            assert_eq!(ab, s.score(&b, &a).unwrap());
            assert_eq!(ab, s.score(&a, &b).unwrap());
        }
    }

    #[test]
    fn compare_threshold_is_inclusive() {
        let s = Scorer::new(Strategy::Distance);
        // distance 1 -> 50.0
        let c = s.compare(&[1.0], &[2.0], 50.0).unwrap();
        assert_eq!(c.score, 50.0);
        assert!(c.matched);
        assert!(!s.compare(&[1.0], &[2.0], 50.01).unwrap().matched);
    }

    #[test]
    fn mismatch_is_invalid_embedding() {
        let s = Scorer::new(Strategy::Cosine);
        assert!(matches!(
            s.score(&[1.0], &[1.0, 0.0]),
            Err(VerifyError::InvalidEmbedding(_))
        ));
    }
}
