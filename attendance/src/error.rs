use rollcall_ledger::LedgerError;
use rollcall_source::{ExtractError, FetchError, TokenStatus};
use rollcall_verify::VerifyError;
use thiserror::Error;

/// Why a service operation failed. Rendered into an [`Outcome`] at the
/// service boundary.
///
/// [`Outcome`]: crate::Outcome
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("unauthorized")]
    Unauthorized(TokenStatus),

    #[error("no handwriting sample found for {0:?}")]
    NoReference(String),

    #[error("no assignment found for {0:?}")]
    NoAssignment(String),

    #[error("{0}")]
    Extract(#[from] ExtractError),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Verify(#[from] VerifyError),

    #[error("{0}")]
    Ledger(#[from] LedgerError),
}

impl ServiceError {
    /// Stable machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized(TokenStatus::Expired) => "token_expired",
            Self::Unauthorized(_) => "unauthorized",
            Self::NoReference(_) | Self::NoAssignment(_) => "not_found",
            Self::Extract(ExtractError::NoFaceDetected) => "no_face_detected",
            Self::Extract(ExtractError::MultipleFacesDetected(_)) => "multiple_faces_detected",
            Self::Extract(ExtractError::ExtractionFailed(_)) => "extraction_failed",
            Self::Fetch(FetchError::NotFound { .. }) => "not_found",
            Self::Fetch(FetchError::Unavailable(_)) => "file_store_unavailable",
            Self::Verify(VerifyError::NoSamples) => "no_samples",
            Self::Verify(VerifyError::InvalidEmbedding(_)) => "invalid_embedding",
            Self::Verify(VerifyError::InvalidConfig(_)) => "invalid_config",
            Self::Ledger(LedgerError::DuplicateIdentity(_)) => "duplicate_identity",
            Self::Ledger(LedgerError::InvalidId(_)) => "invalid_id",
            Self::Ledger(LedgerError::NotFound(_)) => "not_found",
            Self::Ledger(LedgerError::EmptyContext) => "invalid_context",
            Self::Ledger(LedgerError::InvalidEmbedding(_)) => "invalid_embedding",
            Self::Ledger(LedgerError::Storage(_) | LedgerError::Serialization(_)) => "storage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_message_hides_status() {
        let e = ServiceError::Unauthorized(TokenStatus::Expired);
        assert_eq!(e.to_string(), "unauthorized");
        assert_eq!(e.kind(), "token_expired");
        assert_eq!(ServiceError::Unauthorized(TokenStatus::Invalid).kind(), "unauthorized");
    }

    #[test]
    fn extract_errors_keep_their_kind() {
        let e: ServiceError = ExtractError::MultipleFacesDetected(3).into();
        assert_eq!(e.kind(), "multiple_faces_detected");
        assert!(e.to_string().contains("multiple faces"));
    }
}
