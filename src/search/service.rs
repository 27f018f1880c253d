//! Search orchestrator and the caller-facing error taxonomy.

use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{CatalogError, CatalogStore};
use crate::config::SearchConfig;
use crate::embedding::{EmbeddingProvider, ProviderError, QueryEmbedder, QueryError};
use crate::products::RankedProduct;
use crate::search::SimilarityRanker;

/// Everything a caller can observe from `search()`. Raw transport errors
/// never cross this boundary.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Caller error, no retry useful.
    #[error("query is empty, type something to search")]
    InvalidQuery,

    /// Transient; the provider is down or was never woken up.
    #[error("embedding provider is unavailable: {0}")]
    ProviderUnavailable(String),

    /// Transient; commonly the provider warming up from sleep.
    #[error("embedding provider timed out after {0:?}")]
    ProviderTimeout(Duration),

    /// Internal, should not happen with a healthy provider.
    #[error("embedding model produced an unusable vector")]
    DegenerateEmbedding,

    /// Both ranking paths exhausted; the store itself is down.
    #[error("search is unavailable: {0}")]
    SearchFailed(#[from] CatalogError),
}

impl SearchError {
    /// Whether retrying after a short wait can plausibly help. The UI
    /// shows "warming up" messaging for these instead of a hard error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SearchError::ProviderUnavailable(_) | SearchError::ProviderTimeout(_)
        )
    }
}

impl From<ProviderError> for SearchError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout(after) => SearchError::ProviderTimeout(after),
            ProviderError::Unavailable(msg) => SearchError::ProviderUnavailable(msg),
            ProviderError::BadResponse(msg) => SearchError::ProviderUnavailable(msg),
        }
    }
}

impl From<QueryError> for SearchError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::EmptyQuery => SearchError::InvalidQuery,
            QueryError::Provider(provider) => provider.into(),
            QueryError::DegenerateEmbedding => SearchError::DegenerateEmbedding,
        }
    }
}

/// The single entry point the UI layer consumes.
///
/// Per call: validate, embed, rank via the primary path, fall back on
/// delegated failure. No state survives between calls, so one service
/// instance serves concurrent queries.
pub struct SearchService {
    embedder: QueryEmbedder,
    ranker: SimilarityRanker,
}

impl SearchService {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn CatalogStore>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            embedder: QueryEmbedder::new(provider),
            ranker: SimilarityRanker::new(store, config),
        }
    }

    /// Search the catalog with a free-text query.
    ///
    /// Returns products ordered by non-increasing similarity, or one of
    /// the classified errors. An empty list is a valid "no results"
    /// outcome, distinct from failure.
    pub fn search(&self, query: &str) -> Result<Vec<RankedProduct>, SearchError> {
        let embedded = self.embedder.embed(query)?;
        let results = self.ranker.rank(&embedded)?;

        log::info!(
            "search \"{}\": {} results, top similarity {:?}",
            embedded.query,
            results.len(),
            results.first().map(|r| r.similarity)
        );

        Ok(results)
    }
}
