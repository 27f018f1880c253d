//! Embedding acquisition for semantic product search.
//!
//! Text queries and product images are embedded by one shared multimodal
//! model behind an HTTP boundary, so both land in the same vector space.
//!
//! # Architecture
//!
//! - `provider`: the network boundary to the embedding service
//! - `query`: free text -> validated, unit-normalized query vector
//! - `similarity`: L2 norm, normalization and cosine similarity math

pub mod provider;
pub mod query;
pub mod similarity;

pub use provider::{EmbeddingProvider, HttpEmbeddingProvider, ProviderError, WARMUP_TEXT};
pub use query::{QueryEmbedder, QueryEmbedding, QueryError};
pub use similarity::{cosine_similarity, l2_norm, normalize};
