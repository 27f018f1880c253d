//! Orders the catalog by similarity to a query vector.
//!
//! Primary path: delegate to the store's `match_products` and trust its
//! ordering and scores. Fallback path: fetch every row with an embedding
//! and rank client-side with defensively recomputed cosine similarity.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::catalog::{CatalogError, CatalogStore};
use crate::config::SearchConfig;
use crate::embedding::{cosine_similarity, QueryEmbedding};
use crate::products::RankedProduct;

pub struct SimilarityRanker {
    store: Arc<dyn CatalogStore>,
    delegated_floor: f32,
    fallback_floor: f32,
    limit: usize,
}

impl SimilarityRanker {
    pub fn new(store: Arc<dyn CatalogStore>, config: &SearchConfig) -> Self {
        Self {
            store,
            delegated_floor: config.delegated_floor,
            fallback_floor: config.fallback_floor,
            limit: config.result_limit,
        }
    }

    /// Rank the catalog against a query vector, at most `limit` results.
    ///
    /// Any delegated failure switches silently to the full scan; an error
    /// only surfaces when both paths are down.
    pub fn rank(&self, query: &QueryEmbedding) -> Result<Vec<RankedProduct>, CatalogError> {
        match self
            .store
            .match_products(&query.vector, self.delegated_floor, self.limit)
        {
            Ok(results) => Ok(results),
            Err(err) => {
                log::warn!("delegated ranking failed, falling back to full scan: {err}");
                self.full_scan(query)
            }
        }
    }

    /// Degraded-mode ranking over the whole eligible catalog.
    ///
    /// Stored vectors are not assumed normalized here; norms are
    /// recomputed per row. An empty eligible catalog or nothing above the
    /// floor is a valid empty result, not an error.
    fn full_scan(&self, query: &QueryEmbedding) -> Result<Vec<RankedProduct>, CatalogError> {
        let products = self.store.find_with_embeddings()?;
        let candidates = products.len();

        let mut results: Vec<RankedProduct> = products
            .into_iter()
            .filter_map(|product| {
                let embedding = match &product.embedding {
                    Some(embedding) => embedding,
                    None => return None,
                };

                if embedding.len() != query.vector.len() {
                    log::warn!(
                        "product {} has a {}-dim embedding, query is {}-dim; skipping",
                        product.id,
                        embedding.len(),
                        query.vector.len()
                    );
                    return None;
                }

                let similarity = cosine_similarity(&query.vector, embedding);
                (similarity > self.fallback_floor)
                    .then(|| RankedProduct::new(product, similarity))
            })
            .collect();

        // Stable sort keeps store fetch order for equal scores.
        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        results.truncate(self.limit);

        log::info!(
            "full-scan ranking for \"{}\": {} of {} candidates above floor {}",
            query.query,
            results.len(),
            candidates,
            self.fallback_floor
        );

        Ok(results)
    }
}
