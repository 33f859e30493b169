use rollcall_vecmath::Embedding;

use crate::ExtractError;

/// One detected region (a face crop, a document page) of an input.
#[derive(Debug, Clone)]
pub enum Region {
    Embedded(Embedding),
    /// The region was found but could not be embedded.
    Failed { reason: String },
}

/// Produces embeddings from raw image or document bytes.
///
/// Decoding, detection and the model itself are up to the implementation;
/// callers only see regions. Latency is opaque and no timeout is applied
/// here.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use.
pub trait EmbeddingSource: Send + Sync {
    /// Embeds every region found in `input`, in detection order.
    ///
    /// An empty result means nothing was detected. `Err` means the input as
    /// a whole could not be processed.
    fn extract(&self, input: &[u8]) -> Result<Vec<Region>, ExtractError>;

    /// Returns the dimensionality of the embeddings (0 if unknown).
    fn dimension(&self) -> usize;

    /// Embeds an input that must contain exactly one region.
    fn extract_one(&self, input: &[u8]) -> Result<Embedding, ExtractError> {
        let mut regions = self.extract(input)?;
        match regions.len() {
            0 => Err(ExtractError::NoFaceDetected),
            1 => match regions.remove(0) {
                Region::Embedded(e) => Ok(e),
                Region::Failed { reason } => Err(ExtractError::ExtractionFailed(reason)),
            },
            n => Err(ExtractError::MultipleFacesDetected(n)),
        }
    }
}
