use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::VecMathError;
use crate::similarity::check_finite;

/// A fixed-length embedding produced by an external model.
///
/// Construction rejects empty and non-finite vectors, and the same check
/// runs on deserialization. There is no way to mutate the values once
/// built.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Result<Self, VecMathError> {
        check_finite(&values)?;
        Ok(Self(values))
    }

    /// Number of components.
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl Deref for Embedding {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.0
    }
}

impl TryFrom<Vec<f32>> for Embedding {
    type Error = VecMathError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<Embedding> for Vec<f32> {
    fn from(e: Embedding) -> Self {
        e.0
    }
}

impl fmt::Debug for Embedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Embedding").field("dim", &self.0.len()).finish()
    }
}
