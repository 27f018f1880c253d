//! Semantic product search core.
//!
//! Composes the query embedder and the similarity ranker into one
//! request/response cycle:
//!
//! - `ranker`: delegated store-side ranking with a full-scan fallback
//! - `service`: the orchestrator and the caller-facing error taxonomy
//!
//! Each search is stateless and independently callable from concurrent
//! requests; the only shared resources are the external provider and
//! store, both of which already handle concurrent access.

mod ranker;
mod service;

pub use ranker::SimilarityRanker;
pub use service::{SearchError, SearchService};

/// Similarity floor for the delegated store-side ranking path.
pub const DELEGATED_FLOOR: f32 = 0.0;

/// Similarity floor for the fallback full-scan path. Lower than a strict
/// relevance cut because in degraded mode false negatives cost more than
/// false positives.
pub const FALLBACK_FLOOR: f32 = 0.15;

/// Maximum results returned by either ranking path.
pub const RESULT_LIMIT: usize = 20;
