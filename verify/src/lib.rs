//! Turns embedding comparisons into accept/reject verdicts.
//!
//! Two matching modes are supported:
//!
//! - **Sample verification** ([`Engine::verify`]): one reference against N
//!   probe samples (e.g. a handwriting reference vs. document pages). Every
//!   usable sample must clear `sample_threshold` and the aggregate must
//!   clear `aggregate_threshold`.
//! - **Catalog identification** ([`Engine::identify`]): one probe against
//!   every registered identity, accepting the best score at or above
//!   `identity_threshold`. Ties go to the lexicographically smaller id.
//!
//! Multiple probes from one capture share a [`Session`], in which each
//! identity can be accepted at most once.
//!
//! # Usage
//!
//! ```
//! use rollcall_vecmath::Embedding;
//! use rollcall_verify::{Engine, EngineConfig, Sample};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let reference = Embedding::new(vec![1.0, 0.0, 0.0]).unwrap();
//! let pages = vec![
//!     Sample::Embedded(Embedding::new(vec![0.99, 0.05, 0.0]).unwrap()),
//!     Sample::Embedded(Embedding::new(vec![0.98, 0.1, 0.0]).unwrap()),
//! ];
//! let verdict = engine.verify(&reference, &pages).unwrap();
//! assert!(verdict.matched);
//! ```

mod config;
mod engine;
mod error;
mod scorer;
mod session;

pub use config::{AggregatePolicy, EngineConfig, Strategy};
pub use engine::{Engine, Identification, Match, Sample, Verdict};
pub use error::VerifyError;
pub use scorer::{Comparison, Scorer, to_percent};
pub use session::{ProbeOutcome, Session};
