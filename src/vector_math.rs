//! Distance and similarity scores between two equal-length vectors.
//!
//! Every routine is a single pass over the inputs. The results are raw: cosine,
//! jaccard and pearson can come back NaN or infinite for degenerate inputs
//! (zero norms, constant vectors). Deciding what such a score means is up to
//! the caller, see [`crate::Metric::score`].

use crate::error::VectorError;

fn check_len(v1: &[f64], v2: &[f64]) -> Result<(), VectorError> {
    if v1.len() != v2.len() {
        return Err(VectorError::LengthMismatch {
            left: v1.len(),
            right: v2.len(),
        });
    }
    Ok(())
}

/// sqrt(Σ (aᵢ - bᵢ)²) - lower is more similar
pub fn euclidean(v1: &[f64], v2: &[f64]) -> Result<f64, VectorError> {
    check_len(v1, v2)?;
    let sum = v1
        .iter()
        .zip(v2)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>();
    Ok(sum.sqrt())
}

/// Σ aᵢbᵢ / (‖a‖‖b‖) - higher is more similar
pub fn cosine(v1: &[f64], v2: &[f64]) -> Result<f64, VectorError> {
    check_len(v1, v2)?;
    let (mut dot, mut norm1, mut norm2) = (0.0, 0.0, 0.0);
    for (a, b) in v1.iter().zip(v2) {
        dot += a * b;
        norm1 += a * a;
        norm2 += b * b;
    }
    Ok(dot / (norm1.sqrt() * norm2.sqrt()))
}

/// Σ min(aᵢ,bᵢ) / Σ max(aᵢ,bᵢ) - higher is more similar.
///
/// This is the weighted form applied directly to the components, so negative
/// components are allowed and the result is not bounded to [0, 1].
pub fn jaccard(v1: &[f64], v2: &[f64]) -> Result<f64, VectorError> {
    check_len(v1, v2)?;
    let (mut intersection, mut union) = (0.0, 0.0);
    for (&a, &b) in v1.iter().zip(v2) {
        intersection += a.min(b);
        union += a.max(b);
    }
    Ok(intersection / union)
}

/// Σ |aᵢ - bᵢ| - lower is more similar
pub fn manhattan(v1: &[f64], v2: &[f64]) -> Result<f64, VectorError> {
    check_len(v1, v2)?;
    Ok(v1.iter().zip(v2).map(|(a, b)| (a - b).abs()).sum())
}

/// Pearson correlation coefficient - higher (closer to +1) is more similar
pub fn pearson(v1: &[f64], v2: &[f64]) -> Result<f64, VectorError> {
    check_len(v1, v2)?;
    let n = v1.len() as f64;
    let mean1 = v1.iter().sum::<f64>() / n;
    let mean2 = v2.iter().sum::<f64>() / n;

    let (mut numerator, mut denom1, mut denom2) = (0.0, 0.0, 0.0);
    for (a, b) in v1.iter().zip(v2) {
        let d1 = a - mean1;
        let d2 = b - mean2;
        numerator += d1 * d2;
        denom1 += d1 * d1;
        denom2 += d2 * d2;
    }
    Ok(numerator / (denom1 * denom2).sqrt())
}

/// max |aᵢ - bᵢ| - lower is more similar
pub fn chebyshev(v1: &[f64], v2: &[f64]) -> Result<f64, VectorError> {
    check_len(v1, v2)?;
    Ok(v1
        .iter()
        .zip(v2)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max))
}
