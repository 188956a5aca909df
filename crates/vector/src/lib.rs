//! Vector embeddings for relational records
//!
//! This crate provides:
//! - **codec**: the fixed `D * 8` byte little-endian column layout
//! - **source**: decoding from tagged external representations, and the
//!   `VectorField` column descriptor
//! - **distance**: similarity metrics (higher = more similar)
//! - **search**: exact linear-scan ranking with threshold and limit
//! - **embed**: explicit embedding generation and interest averaging

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod distance;
pub mod embed;
pub mod search;
pub mod source;

pub use codec::{decode, encode, encoded_len, BYTES_PER_ELEMENT};
pub use distance::{compute_similarity, cosine_similarity, DistanceMetric};
pub use embed::{
    embed_checked, mean_vector, refresh_embedding, EmbeddingPolicy, PlaceholderEmbeddings,
};
pub use search::{
    search_similar, search_with_options, SearchOptions, SimilarityResult, DEFAULT_LIMIT,
    DEFAULT_THRESHOLD,
};
pub use source::{decode_from_external_representation, VectorField, VectorSource};

/// Default embedding dimension
pub const DEFAULT_DIMENSION: usize = 384;
