use crate::VecMathError;

/// Cosine similarity between two vectors, in `[-1, 1]`.
///
/// Fails on length mismatch, empty or non-finite input, and when either
/// vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, VecMathError> {
    check_pair(a, b)?;

    let mut dot: f64 = 0.0;
    let mut norm_a: f64 = 0.0;
    let mut norm_b: f64 = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(VecMathError::ZeroNorm);
    }

    // Clamp to absorb rounding just outside the range.
    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Euclidean (L2) distance between two vectors.
///
/// Same preconditions as [`cosine_similarity`], including
/// [`VecMathError::ZeroNorm`] for an all-zero operand.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f64, VecMathError> {
    check_pair(a, b)?;
    if is_zero(a) || is_zero(b) {
        return Err(VecMathError::ZeroNorm);
    }

    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum();
    Ok(sum.sqrt())
}

/// Maps a non-negative distance into `(0, 1]` as `1 / (1 + d)`.
///
/// Zero distance maps to 1.0; the result decreases monotonically and never
/// reaches zero for finite input. Negative input is treated as zero. NaN
/// maps to 0.0 and `+inf` to 0.0, so an undefined distance never scores.
pub fn distance_to_similarity(d: f64) -> f64 {
    if d.is_nan() {
        return 0.0;
    }
    1.0 / (1.0 + d.max(0.0))
}

/// Checks that `v` is usable on either side of a comparison: non-empty,
/// finite and not all zero.
pub fn check_vector(v: &[f32]) -> Result<(), VecMathError> {
    check_finite(v)?;
    if is_zero(v) {
        return Err(VecMathError::ZeroNorm);
    }
    Ok(())
}

fn is_zero(v: &[f32]) -> bool {
    v.iter().all(|&x| x == 0.0)
}

fn check_pair(a: &[f32], b: &[f32]) -> Result<(), VecMathError> {
    if a.len() != b.len() {
        return Err(VecMathError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    check_finite(a)?;
    check_finite(b)
}

pub(crate) fn check_finite(v: &[f32]) -> Result<(), VecMathError> {
    if v.is_empty() {
        return Err(VecMathError::EmptyVector);
    }
    match v.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(VecMathError::NonFinite { index }),
        None => Ok(()),
    }
}
