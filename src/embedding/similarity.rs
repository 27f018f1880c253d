//! Vector math shared by the query embedder and the ranking paths.

/// Compute the L2 norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale a vector to unit L2 norm.
///
/// Returns `None` for a zero-norm vector, which cannot be normalized.
pub fn normalize(v: &[f32]) -> Option<Vec<f32>> {
    let norm = l2_norm(v);
    if norm < f32::EPSILON {
        return None;
    }
    Some(v.iter().map(|x| x / norm).collect())
}

/// Compute cosine similarity between two vectors.
///
/// Both norms are recomputed from the raw values. Stored embeddings are
/// supposed to arrive unit-normalized, but the fallback ranking path must
/// not trust that, so the division is always by the actual norms.
/// A zero-norm operand yields 0.0 rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}
