//! Embedding generation as an explicit operation
//!
//! Nothing here runs implicitly on save. Callers decide when a record's
//! embedding is (re)computed via [`refresh_embedding`] and an
//! [`EmbeddingPolicy`].

use crate::codec;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_core::{EmbeddingGenerator, Result};
use xxhash_rust::xxh3::xxh3_64;

/// When [`refresh_embedding`] should compute a new vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingPolicy {
    /// Only when the record has no embedding yet
    #[default]
    IfAbsent,
    /// Every time
    Always,
}

/// Deterministic stand-in for a real embedding model
///
/// Produces pseudo-random elements in `[0, 1)` seeded from a hash of the
/// text, so the same text always yields the same vector. Scores between
/// these vectors carry no semantic meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderEmbeddings {
    dimension: usize,
}

impl PlaceholderEmbeddings {
    /// Generator producing `dimension`-element vectors
    pub fn new(dimension: usize) -> Self {
        PlaceholderEmbeddings { dimension }
    }
}

impl EmbeddingGenerator for PlaceholderEmbeddings {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(xxh3_64(text.as_bytes()));
        Ok((0..self.dimension).map(|_| rng.gen::<f64>()).collect())
    }
}

/// Run `generator` and enforce the column's dimension
///
/// # Errors
///
/// Returns `DimensionMismatch` if the generator produced the wrong length,
/// plus any error from the generator itself.
pub fn embed_checked(
    generator: &dyn EmbeddingGenerator,
    text: &str,
    dimension: usize,
) -> Result<Vec<f64>> {
    let vector = generator.embed(text)?;
    codec::check_dimension(&vector, dimension)?;
    Ok(vector)
}

/// Compute a new embedding for a record when `policy` calls for one
///
/// Returns `Some(vector)` when one was computed and `None` when the current
/// embedding was kept.
pub fn refresh_embedding(
    current: Option<&[f64]>,
    text: &str,
    generator: &dyn EmbeddingGenerator,
    dimension: usize,
    policy: EmbeddingPolicy,
) -> Result<Option<Vec<f64>>> {
    if policy == EmbeddingPolicy::IfAbsent && current.is_some() {
        return Ok(None);
    }
    let vector = embed_checked(generator, text, dimension)?;
    tracing::debug!(
        target: "strata::vector",
        dimension,
        replaced = current.is_some(),
        "Embedding refreshed"
    );
    Ok(Some(vector))
}

/// Element-wise mean of a set of vectors
///
/// Used to build an interest profile from the embeddings of liked records.
/// Returns `None` for an empty input.
///
/// # Errors
///
/// Returns `DimensionMismatch` if any vector does not have `dimension`
/// elements.
pub fn mean_vector<V: AsRef<[f64]>>(vectors: &[V], dimension: usize) -> Result<Option<Vec<f64>>> {
    if vectors.is_empty() {
        return Ok(None);
    }
    let mut sum = vec![0.0f64; dimension];
    for v in vectors {
        let v = v.as_ref();
        codec::check_dimension(v, dimension)?;
        for (acc, x) in sum.iter_mut().zip(v) {
            *acc += x;
        }
    }
    let n = vectors.len() as f64;
    Ok(Some(sum.into_iter().map(|x| x / n).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Error;

    struct FixedGenerator(Vec<f64>);

    impl EmbeddingGenerator for FixedGenerator {
        fn dimension(&self) -> usize {
            self.0.len()
        }

        fn embed(&self, _text: &str) -> Result<Vec<f64>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_placeholder_is_deterministic() {
        let gen = PlaceholderEmbeddings::new(384);
        let a = gen.embed("Getting started with MariaDB").unwrap();
        let b = gen.embed("Getting started with MariaDB").unwrap();
        let c = gen.embed("Something else entirely").unwrap();
        assert_eq!(a.len(), 384);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|x| (0.0..1.0).contains(x)));
    }

    #[test]
    fn test_embed_checked_enforces_dimension() {
        let gen = FixedGenerator(vec![1.0, 2.0]);
        assert!(matches!(
            embed_checked(&gen, "x", 3),
            Err(Error::DimensionMismatch {
                expected: 3,
                got: 2
            })
        ));
        assert_eq!(embed_checked(&gen, "x", 2).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_refresh_policy() {
        let gen = FixedGenerator(vec![0.5, 0.5]);
        let existing = [1.0, 0.0];

        let kept =
            refresh_embedding(Some(&existing[..]), "t", &gen, 2, EmbeddingPolicy::IfAbsent).unwrap();
        assert_eq!(kept, None);

        let filled = refresh_embedding(None, "t", &gen, 2, EmbeddingPolicy::IfAbsent).unwrap();
        assert_eq!(filled, Some(vec![0.5, 0.5]));

        let replaced =
            refresh_embedding(Some(&existing[..]), "t", &gen, 2, EmbeddingPolicy::Always).unwrap();
        assert_eq!(replaced, Some(vec![0.5, 0.5]));
    }

    #[test]
    fn test_mean_vector() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![2.0, 2.0]];
        assert_eq!(mean_vector(&vectors, 2).unwrap(), Some(vec![1.0, 1.0]));

        let empty: Vec<Vec<f64>> = Vec::new();
        assert_eq!(mean_vector(&empty, 2).unwrap(), None);

        let ragged = vec![vec![1.0, 0.0], vec![1.0]];
        assert!(matches!(
            mean_vector(&ragged, 2),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
