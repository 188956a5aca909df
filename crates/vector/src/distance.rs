//! Scoring of candidate vectors against a query
//!
//! Every metric is oriented so that a larger score means a closer match.
//! Vectors are scored as stored; nothing is normalized on the way in.

use serde::{Deserialize, Serialize};
use strata_core::{Error, Result};

/// How candidates are scored
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Angle between the vectors, in `[-1, 1]`
    #[default]
    Cosine,
    /// `1 / (1 + |a - b|)`, in `(0, 1]`
    Euclidean,
    /// Raw inner product; only comparable across unit-length embeddings
    DotProduct,
}

impl DistanceMetric {
    const NAMES: [(&'static str, DistanceMetric); 6] = [
        ("cosine", DistanceMetric::Cosine),
        ("euclidean", DistanceMetric::Euclidean),
        ("l2", DistanceMetric::Euclidean),
        ("dot_product", DistanceMetric::DotProduct),
        ("dot", DistanceMetric::DotProduct),
        ("inner_product", DistanceMetric::DotProduct),
    ];

    /// Canonical lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::DotProduct => "dot_product",
        }
    }

    /// Look up a metric by name or alias, ignoring ASCII case
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|&(_, metric)| metric)
    }
}

/// Score `b` against `a` with `metric`
///
/// # Errors
///
/// `DimensionMismatch` (with `a`'s length as expected) when the lengths differ.
pub fn compute_similarity(a: &[f64], b: &[f64], metric: DistanceMetric) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    Ok(match metric {
        DistanceMetric::Cosine => cosine(a, b),
        DistanceMetric::Euclidean => 1.0 / (1.0 + euclidean_distance(a, b)),
        DistanceMetric::DotProduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
    })
}

/// Cosine score; `0.0` when either side is the zero vector
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    compute_similarity(a, b, DistanceMetric::Cosine)
}

/// Largest magnitude, the factor every element is divided by before squaring
///
/// Scaling keeps sums of squares inside `f64` range for any finite input, so
/// tiny vectors do not collapse to zero and huge ones do not overflow.
fn max_abs(v: impl Iterator<Item = f64>) -> f64 {
    v.fold(0.0, |m, x| m.max(x.abs()))
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let (scale_a, scale_b) = (max_abs(a.iter().copied()), max_abs(b.iter().copied()));
    if scale_a == 0.0 || scale_b == 0.0 {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (x / scale_a, y / scale_b);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    // Rounding can land a hair outside the unit interval
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    let scale = max_abs(a.iter().zip(b).map(|(x, y)| x - y));
    if scale == 0.0 {
        return 0.0;
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let d = (x - y) / scale;
            d * d
        })
        .sum();
    scale * sum.sqrt()
}
