use crate::errors::ScoringError;
use crate::providers::EntitySet;

/// Cosine similarity of two embedding vectors, floored at 0
///
/// A zero-magnitude vector has similarity 0 with everything. The result is
/// always within `[0, 1]`.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> Result<f64, ScoringError> {
    if left.len() != right.len() {
        return Err(ScoringError::DimensionMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    let (mut dot, mut left_norm, mut right_norm) = (0.0f64, 0.0f64, 0.0f64);
    for (&a, &b) in left.iter().zip(right) {
        let (a, b) = (a as f64, b as f64);
        dot += a * b;
        left_norm += a * a;
        right_norm += b * b;
    }

    if left_norm == 0.0 || right_norm == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (left_norm.sqrt() * right_norm.sqrt())).clamp(0.0, 1.0))
}

/// Both sets are non-empty and share at least one exact string
pub fn entities_overlap(left: &EntitySet, right: &EntitySet) -> bool {
    !left.is_empty() && !right.is_empty() && !left.is_disjoint(right)
}
