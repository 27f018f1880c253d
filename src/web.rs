//! HTTP daemon serving the storefront UI.
//!
//! The UI debounces keystrokes (each search is a round trip through an
//! ML model) and consumes four endpoints: search, the gallery listing,
//! the keep-alive ping and the ingestion-side image analysis.

use crate::{
    catalog::CatalogStore,
    embedding::EmbeddingProvider,
    products::{Product, RankedProduct},
    search::{SearchError, SearchService},
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::signal;

#[derive(Clone)]
pub(crate) struct SharedState {
    pub service: Arc<SearchService>,
    pub store: Arc<dyn CatalogStore>,
    pub provider: Arc<dyn EmbeddingProvider>,
}

pub(crate) fn router(shared_state: Arc<SharedState>) -> Router {
    Router::new()
        .route("/api/search", post(search))
        .route("/api/products", get(products))
        .route("/api/keep-alive", get(keep_alive))
        .route("/api/analyze", post(analyze))
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

async fn start_app(shared_state: Arc<SharedState>, addr: &str) {
    async fn shutdown_signal() {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    let app = router(shared_state);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    log::info!("listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

pub fn start_daemon(
    service: Arc<SearchService>,
    store: Arc<dyn CatalogStore>,
    provider: Arc<dyn EmbeddingProvider>,
    addr: &str,
) {
    let shared_state = Arc::new(SharedState {
        service,
        store,
        provider,
    });

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async { start_app(shared_state, addr).await });
}

// Wraps `SearchError` so axum knows how to render the taxonomy.
#[derive(Debug)]
struct HttpError(SearchError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        match &self.0 {
            SearchError::InvalidQuery => (
                axum::http::StatusCode::BAD_REQUEST,
                json!({"error": self.0.to_string()}).to_string(),
            ),
            // Retryable: the provider is likely asleep. The UI shows
            // "warming up" messaging instead of a hard failure.
            SearchError::ProviderUnavailable(_) | SearchError::ProviderTimeout(_) => {
                log::warn!("{self:?}");
                (
                    axum::http::StatusCode::SERVICE_UNAVAILABLE,
                    json!({"error": self.0.to_string(), "warming_up": true}).to_string(),
                )
            }
            SearchError::DegenerateEmbedding => {
                log::error!("{self:?}");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "search failed"}).to_string(),
                )
            }
            SearchError::SearchFailed(_) => {
                log::error!("{self:?}");
                (
                    axum::http::StatusCode::SERVICE_UNAVAILABLE,
                    json!({"error": "search unavailable, try again later"}).to_string(),
                )
            }
        }
        .into_response()
    }
}

// This enables using `?` on functions that return results with any error
// convertible into `SearchError`.
impl<E> From<E> for HttpError
where
    E: Into<SearchError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub products: Vec<RankedProduct>,
}

async fn search(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, HttpError> {
    log::debug!("payload: {payload:?}");

    tokio::task::block_in_place(move || {
        let products = state.service.search(&payload.query)?;
        Ok(Json(SearchResponse { products }))
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

async fn products(
    State(state): State<Arc<SharedState>>,
) -> Result<Json<ProductsResponse>, HttpError> {
    tokio::task::block_in_place(move || {
        let products = state.store.list_products()?;
        Ok(Json(ProductsResponse { products }))
    })
}

/// Pings the embedding provider so the hosted model does not go back to
/// sleep. Meant to be hit by an external cron job.
async fn keep_alive(State(state): State<Arc<SharedState>>) -> axum::response::Response {
    let outcome = tokio::task::block_in_place(|| state.provider.warmup());
    let timestamp = chrono::Utc::now().to_rfc3339();

    match outcome {
        Ok(elapsed) => {
            log::info!("keep-alive: provider answered in {elapsed:?}");
            Json(json!({
                "success": true,
                "message": "embedding provider is awake and responsive",
                "response_time_ms": elapsed.as_millis() as u64,
                "timestamp": timestamp,
            }))
            .into_response()
        }
        Err(err) => {
            log::warn!("keep-alive: provider ping failed: {err}");
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": err.to_string(),
                    "timestamp": timestamp,
                })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub image_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub embedding: Vec<f32>,
}

/// Ingestion-side helper: embed a product image through the same model
/// the query path uses, so both land in one vector space.
async fn analyze(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, HttpError> {
    log::debug!("payload: {payload:?}");

    tokio::task::block_in_place(move || {
        let embedding = state.provider.embed_image(&payload.image_url)?;
        Ok(Json(AnalyzeResponse { embedding }))
    })
}
