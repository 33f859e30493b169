use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::{Identification, Match};

/// Per-probe result within a [`Session`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// First acceptance of this identity in the session.
    Recognized(Match),
    /// The identity was already accepted by an earlier probe.
    Duplicate(Match),
    /// No candidate cleared the threshold.
    Unidentified { best_score: Option<f64> },
}

/// Tracks identities accepted during one capture session.
///
/// Each identity is accepted at most once; later probes resolving to the
/// same id are reported as duplicates.
#[derive(Debug, Default)]
pub struct Session {
    recognized: BTreeSet<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one probe's identification into the session.
    pub fn resolve(&mut self, identification: Identification) -> ProbeOutcome {
        let matched = identification.matched;
        match identification.best {
            Some(m) if matched => {
                if self.recognized.insert(m.id.clone()) {
                    debug!(id = %m.id, score = m.score, "probe recognized");
                    ProbeOutcome::Recognized(m)
                } else {
                    debug!(id = %m.id, score = m.score, "probe duplicate");
                    ProbeOutcome::Duplicate(m)
                }
            }
            best => ProbeOutcome::Unidentified {
                best_score: best.map(|m| m.score),
            },
        }
    }

    /// Identities accepted so far, in id order.
    pub fn recognized(&self) -> impl Iterator<Item = &str> {
        self.recognized.iter().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.recognized.contains(id)
    }

    pub fn len(&self) -> usize {
        self.recognized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recognized.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(id: &str, score: f64, matched: bool) -> Identification {
        Identification {
            best: Some(Match {
                id: id.into(),
                score,
            }),
            matched,
            skipped: Vec::new(),
        }
    }

    #[test]
    fn first_acceptance_wins() {
        let mut s = Session::new();
        assert!(matches!(
            s.resolve(ident("A", 90.0, true)),
            ProbeOutcome::Recognized(_)
        ));
        assert!(matches!(
            s.resolve(ident("A", 95.0, true)),
            ProbeOutcome::Duplicate(_)
        ));
        assert!(matches!(
            s.resolve(ident("B", 70.0, true)),
            ProbeOutcome::Recognized(_)
        ));
        assert_eq!(s.recognized().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn unmatched_probe_is_unidentified() {
        let mut s = Session::new();
        assert_eq!(
            s.resolve(ident("A", 40.0, false)),
            ProbeOutcome::Unidentified {
                best_score: Some(40.0)
            }
        );
        assert_eq!(
            s.resolve(Identification {
                best: None,
                matched: false,
                skipped: vec![],
            }),
            ProbeOutcome::Unidentified { best_score: None }
        );
        assert!(s.is_empty());
        assert!(!s.contains("A"));
    }
}
