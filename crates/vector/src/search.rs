//! Exact similarity search over candidate rows
//!
//! Linear scan: every candidate with a present vector is scored, so a query
//! costs O(N·D). There is no index. This is a known scaling limit; callers
//! with large tables narrow the candidate set before searching.

use crate::distance::{compute_similarity, DistanceMetric};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strata_core::{RecordId, Result};

/// Default maximum number of results
pub const DEFAULT_LIMIT: usize = 10;

/// Default minimum score
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Search parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum number of results
    pub limit: usize,
    /// Candidates scoring below this are dropped
    pub threshold: f64,
    /// Scoring metric
    pub metric: DistanceMetric,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            limit: DEFAULT_LIMIT,
            threshold: DEFAULT_THRESHOLD,
            metric: DistanceMetric::Cosine,
        }
    }
}

impl SearchOptions {
    /// Set the result limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the score threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the scoring metric
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }
}

/// A ranked candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Identity of the matching record
    pub id: RecordId,
    /// Similarity score (higher = more similar)
    pub score: f64,
}

/// Rank candidates by cosine similarity to `query`
///
/// Equivalent to [`search_with_options`] with the cosine metric.
pub fn search_similar<I, V>(
    query: &[f64],
    candidates: I,
    limit: usize,
    threshold: f64,
) -> Result<Vec<SimilarityResult>>
where
    I: IntoIterator<Item = (RecordId, Option<V>)>,
    V: AsRef<[f64]>,
{
    let options = SearchOptions {
        limit,
        threshold,
        metric: DistanceMetric::Cosine,
    };
    search_with_options(query, candidates, &options)
}

/// Rank candidates by similarity to `query`
///
/// 1. Skip candidates whose vector is absent
/// 2. Score the rest (single-threaded, input order)
/// 3. Keep `score >= threshold`
/// 4. Stable sort by score descending (ties keep input order)
/// 5. Truncate to `limit`
///
/// # Errors
///
/// Returns `DimensionMismatch` if any present candidate vector differs in
/// length from the query. The whole search fails; no partial result.
pub fn search_with_options<I, V>(
    query: &[f64],
    candidates: I,
    options: &SearchOptions,
) -> Result<Vec<SimilarityResult>>
where
    I: IntoIterator<Item = (RecordId, Option<V>)>,
    V: AsRef<[f64]>,
{
    let mut scanned = 0usize;
    let mut absent = 0usize;
    let mut results = Vec::new();

    for (id, vector) in candidates {
        scanned += 1;
        let Some(vector) = vector else {
            absent += 1;
            continue;
        };
        let score = compute_similarity(query, vector.as_ref(), options.metric)?;
        if score >= options.threshold {
            results.push(SimilarityResult { id, score });
        }
    }
    let matched = results.len();

    // Sort by score desc; sort_by is stable so equal scores keep input order
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results.truncate(options.limit);

    tracing::debug!(
        target: "strata::vector",
        scanned,
        absent,
        matched,
        returned = results.len(),
        metric = options.metric.name(),
        "Similarity search complete"
    );

    Ok(results)
}
