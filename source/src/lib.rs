//! Narrow interfaces to the collaborators around the decision engine.
//!
//! - [`EmbeddingSource`]: image or document bytes -> one embedding per
//!   detected region (face, page).
//! - [`FileSource`]: stored reference/probe bytes for an identity.
//! - [`Authenticator`]: caller token validation.
//!
//! The models, detectors and stores behind these traits live outside this
//! workspace. The implementations here cover precomputed embeddings and
//! local files.

mod auth;
mod error;
mod files;
mod json;
mod source;

pub use auth::{Authenticator, StaticTokens, TokenStatus};
pub use error::{ExtractError, FetchError};
pub use files::{DirFileSource, FileSource, MemoryFiles, Role};
pub use json::JsonEmbeddingSource;
pub use source::{EmbeddingSource, Region};
