//! Similarity primitives over fixed-length embedding vectors.
//!
//! All functions validate their inputs: both vectors must have the same
//! length and contain only finite values. Accumulation uses f64
//! intermediates so results are stable across call sites.
//!
//! ```
//! use rollcall_vecmath::{cosine_similarity, distance_to_similarity, euclidean_distance};
//!
//! let a = [1.0, 0.0, 0.0];
//! let b = [0.0, 1.0, 0.0];
//! assert_eq!(cosine_similarity(&a, &b).unwrap(), 0.0);
//! let d = euclidean_distance(&a, &a).unwrap();
//! assert_eq!(distance_to_similarity(d), 1.0);
//! ```

mod embedding;
mod error;
mod similarity;

pub use embedding::Embedding;
pub use error::VecMathError;
pub use similarity::{
    check_vector, cosine_similarity, distance_to_similarity, euclidean_distance,
};
