//! Integration tests for the search core and the web surface.
//!
//! The embedding provider and catalog store are external services, so
//! everything here runs against scriptable in-process doubles.


use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::catalog::{CatalogError, CatalogStore};
use crate::embedding::{EmbeddingProvider, ProviderError};
use crate::products::{Product, RankedProduct};

pub(crate) enum ProviderMode {
    Fixed(Vec<f32>),
    Timeout,
    Unavailable,
}

/// Call-counting embedding provider double.
pub(crate) struct FakeProvider {
    mode: ProviderMode,
    text_calls: AtomicUsize,
    image_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn fixed(vector: Vec<f32>) -> Self {
        Self::with_mode(ProviderMode::Fixed(vector))
    }

    pub fn timing_out() -> Self {
        Self::with_mode(ProviderMode::Timeout)
    }

    pub fn unavailable() -> Self {
        Self::with_mode(ProviderMode::Unavailable)
    }

    fn with_mode(mode: ProviderMode) -> Self {
        Self {
            mode,
            text_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
        }
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    fn respond(&self) -> Result<Vec<f32>, ProviderError> {
        match &self.mode {
            ProviderMode::Fixed(vector) => Ok(vector.clone()),
            ProviderMode::Timeout => Err(ProviderError::Timeout(Duration::from_secs(30))),
            ProviderMode::Unavailable => {
                Err(ProviderError::Unavailable("connection refused".to_string()))
            }
        }
    }
}

impl EmbeddingProvider for FakeProvider {
    fn embed_text(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        self.respond()
    }

    fn embed_image(&self, _image_url: &str) -> Result<Vec<f32>, ProviderError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.respond()
    }
}

/// Scriptable catalog store double.
///
/// `delegated` is the canned `match_products` response; `None` makes the
/// delegated call fail, which is the fallback trigger.
pub(crate) struct FakeStore {
    products: Vec<Product>,
    delegated: Option<Vec<RankedProduct>>,
    scan_fails: bool,
    match_calls: AtomicUsize,
    scan_calls: AtomicUsize,
}

impl FakeStore {
    /// Delegated ranking unavailable; full scan serves `products`.
    pub fn without_delegation(products: Vec<Product>) -> Self {
        Self {
            products,
            delegated: None,
            scan_fails: false,
            match_calls: AtomicUsize::new(0),
            scan_calls: AtomicUsize::new(0),
        }
    }

    /// Delegated ranking answers with a canned result list.
    pub fn with_delegation(products: Vec<Product>, delegated: Vec<RankedProduct>) -> Self {
        Self {
            delegated: Some(delegated),
            ..Self::without_delegation(products)
        }
    }

    /// Store outage: both read paths fail.
    pub fn down() -> Self {
        Self {
            scan_fails: true,
            ..Self::without_delegation(vec![])
        }
    }

    pub fn match_calls(&self) -> usize {
        self.match_calls.load(Ordering::SeqCst)
    }

    pub fn scan_calls(&self) -> usize {
        self.scan_calls.load(Ordering::SeqCst)
    }
}

impl CatalogStore for FakeStore {
    fn find_with_embeddings(&self) -> Result<Vec<Product>, CatalogError> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);
        if self.scan_fails {
            return Err(CatalogError::Request("store is down".to_string()));
        }
        Ok(self
            .products
            .iter()
            .filter(|p| p.embedding.is_some())
            .cloned()
            .collect())
    }

    fn match_products(
        &self,
        _query: &[f32],
        _threshold: f32,
        _limit: usize,
    ) -> Result<Vec<RankedProduct>, CatalogError> {
        self.match_calls.fetch_add(1, Ordering::SeqCst);
        self.delegated
            .clone()
            .ok_or_else(|| CatalogError::Request("match_products does not exist".to_string()))
    }

    fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        if self.scan_fails {
            return Err(CatalogError::Request("store is down".to_string()));
        }
        let mut listed: Vec<Product> = self
            .products
            .iter()
            .filter(|p| p.embedding.is_some())
            .cloned()
            .map(|mut p| {
                p.embedding = None;
                p
            })
            .collect();
        listed.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(listed)
    }
}

pub(crate) fn product(id: u64, name: &str, embedding: Option<Vec<f32>>) -> Product {
    Product {
        id,
        name: name.to_string(),
        image_url: format!("https://cdn.example.com/{id}.jpg"),
        thumbnail_url: None,
        embedding,
    }
}
