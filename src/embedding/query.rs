//! Turns raw user input into a normalized query vector.

use std::sync::Arc;

use crate::embedding::provider::{EmbeddingProvider, ProviderError};
use crate::embedding::similarity::normalize;

/// A query ready for ranking: the unit-normalized vector plus the
/// original text, echoed for logging and debug surfaces.
#[derive(Debug, Clone)]
pub struct QueryEmbedding {
    pub query: String,
    pub vector: Vec<f32>,
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("query is empty")]
    EmptyQuery,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Defensive only; a healthy provider never returns a zero vector.
    #[error("embedding model returned a zero-norm vector")]
    DegenerateEmbedding,
}

pub struct QueryEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
}

impl QueryEmbedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Embed a free-text query.
    ///
    /// Empty or whitespace-only input is rejected before any network
    /// call is made. The provider does not guarantee normalized output,
    /// so the vector is scaled to unit L2 norm here.
    pub fn embed(&self, query: &str) -> Result<QueryEmbedding, QueryError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let raw = self.provider.embed_text(trimmed)?;
        let vector = normalize(&raw).ok_or(QueryError::DegenerateEmbedding)?;

        Ok(QueryEmbedding {
            query: trimmed.to_string(),
            vector,
        })
    }
}
