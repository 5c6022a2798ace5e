
use anyhow::Result;

/// Compute the cosine similarity between two embedding vectors.
///
/// Both vectors are normalized to unit length before the dot product, so the
/// result is in [-1.0, 1.0] regardless of the magnitudes the model produced.
/// A zero vector on either side yields 0.0.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(anyhow::anyhow!(
            "Embedding dimension mismatch: {} vs {}",
            a.len(),
            b.len()
        ));
    }

    let magnitude_a = magnitude(a);
    let magnitude_b = magnitude(b);

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();

    Ok(dot_product / (magnitude_a * magnitude_b))
}

/// Normalize a vector to unit length in place. Zero vectors are left as-is.
#[inline]
pub fn normalize(embedding: &mut [f32]) {
    let magnitude = magnitude(embedding);
    if magnitude > 0.0 {
        for x in embedding.iter_mut() {
            *x /= magnitude;
        }
    }
}

fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
