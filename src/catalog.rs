//! Catalog store boundary.
//!
//! The store is a hosted Postgres behind a PostgREST-style API. Two read
//! paths matter to search: a plain filtered fetch of every row with a
//! non-null embedding, and the optional server-side `match_products`
//! vector ranking function. The latter failing for any reason (function
//! missing, transient outage, schema drift) is the fallback trigger,
//! never a fatal error on its own.

use std::time::Duration;

use serde_json::{json, Value};

use crate::products::{Product, RankedProduct};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Request(String),

    #[error("catalog request timed out after {0:?}")]
    Timeout(Duration),

    #[error("catalog returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("catalog returned an unusable response: {0}")]
    BadResponse(String),
}

/// Read-only view of the product catalog.
pub trait CatalogStore: Send + Sync {
    /// Every row with a non-null embedding, embedding included.
    /// Order is store-defined; the fallback ranker relies on it being
    /// stable between identical calls, nothing more.
    fn find_with_embeddings(&self) -> Result<Vec<Product>, CatalogError>;

    /// Delegated vector ranking, ordered descending by similarity.
    /// Optional capability; an error here means "use the fallback".
    fn match_products(
        &self,
        query: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<RankedProduct>, CatalogError>;

    /// Gallery listing: searchable rows, newest first, no embeddings.
    fn list_products(&self) -> Result<Vec<Product>, CatalogError>;
}

/// PostgREST-backed catalog client.
pub struct CatalogRemote {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl CatalogRemote {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.strip_suffix('/').unwrap_or(base_url).to_string();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            client,
            timeout,
        })
    }

    fn get(&self, path: &str) -> reqwest::blocking::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("GET {url}");
        self.client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn post(&self, path: &str) -> reqwest::blocking::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("POST {url}");
        self.client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn classify(&self, err: reqwest::Error) -> CatalogError {
        if err.is_timeout() {
            CatalogError::Timeout(self.timeout)
        } else {
            CatalogError::Request(err.to_string())
        }
    }

    fn read_rows(
        &self,
        response: reqwest::blocking::Response,
    ) -> Result<Vec<Value>, CatalogError> {
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }

        let body: Value = response.json().map_err(|err| {
            if err.is_timeout() {
                CatalogError::Timeout(self.timeout)
            } else {
                CatalogError::BadResponse(err.to_string())
            }
        })?;

        match body {
            Value::Array(rows) => Ok(rows),
            other => Err(CatalogError::BadResponse(format!(
                "expected a row array, got {other}"
            ))),
        }
    }
}

impl CatalogStore for CatalogRemote {
    fn find_with_embeddings(&self) -> Result<Vec<Product>, CatalogError> {
        let response = self
            .get(
                "/rest/v1/products?select=id,name,image_url,thumbnail_url,embedding\
                 &embedding=not.is.null",
            )
            .send()
            .map_err(|err| self.classify(err))?;

        Ok(collect_products(self.read_rows(response)?))
    }

    fn match_products(
        &self,
        query: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<RankedProduct>, CatalogError> {
        let response = self
            .post("/rest/v1/rpc/match_products")
            .json(&json!({
                "query_embedding": query,
                "match_threshold": threshold,
                "match_count": limit,
            }))
            .send()
            .map_err(|err| self.classify(err))?;

        let rows = self.read_rows(response)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            match RankedProduct::from_row(row) {
                Some(ranked) => results.push(ranked),
                // A delegated row we cannot read means the ranking
                // function's output no longer matches expectations.
                None => {
                    return Err(CatalogError::BadResponse(format!(
                        "match_products row is malformed: {row}"
                    )))
                }
            }
        }

        Ok(results)
    }

    fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        let response = self
            .get(
                "/rest/v1/products?select=id,name,image_url,thumbnail_url\
                 &embedding=not.is.null&order=id.desc",
            )
            .send()
            .map_err(|err| self.classify(err))?;

        Ok(collect_products(self.read_rows(response)?))
    }
}

/// Validate rows one by one; a single unreadable row is skipped with a
/// warning instead of failing the whole fetch.
fn collect_products(rows: Vec<Value>) -> Vec<Product> {
    let total = rows.len();
    let products: Vec<Product> = rows.iter().filter_map(Product::from_row).collect();

    let skipped = total - products.len();
    if skipped > 0 {
        log::warn!("skipped {skipped} malformed catalog rows out of {total}");
    }

    products
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collect_products_skips_malformed_rows() {
        let rows = vec![
            json!({"id": 1, "name": "Carrot cake", "image_url": "https://cdn.example.com/1.jpg"}),
            json!({"id": "bad", "name": 3}),
            json!({"id": 2, "name": "Lemon tart", "image_url": "https://cdn.example.com/2.jpg"}),
        ];

        let products = collect_products(rows);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id, 1);
        assert_eq!(products[1].id, 2);
    }

    #[test]
    fn test_collect_products_preserves_fetch_order() {
        let rows = vec![
            json!({"id": 9, "name": "a", "image_url": "u"}),
            json!({"id": 3, "name": "b", "image_url": "u"}),
            json!({"id": 5, "name": "c", "image_url": "u"}),
        ];

        let ids: Vec<u64> = collect_products(rows).into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![9, 3, 5]);
    }

    #[test]
    fn test_unreachable_store_is_an_error() {
        let store =
            CatalogRemote::new("http://127.0.0.1:1", "anon", Duration::from_secs(5)).unwrap();
        assert!(store.find_with_embeddings().is_err());
        assert!(store.match_products(&[1.0, 0.0], 0.0, 20).is_err());
    }
}
