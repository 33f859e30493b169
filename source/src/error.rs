use thiserror::Error;

use crate::Role;

/// Why an embedding source produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("extract: no face detected")]
    NoFaceDetected,

    #[error("extract: multiple faces detected ({0})")]
    MultipleFacesDetected(usize),

    #[error("extract: extraction failed: {0}")]
    ExtractionFailed(String),
}

/// Errors returned by file retrieval.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch: no {role} file for {identity_id:?}")]
    NotFound { identity_id: String, role: Role },

    #[error("fetch: store unavailable: {0}")]
    Unavailable(String),
}
