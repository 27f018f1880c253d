//! Catalog product model.
//!
//! Rows arrive from the store as loose JSON; everything the search core
//! touches goes through the validated structs here. Malformed rows parse
//! to `None` and are skipped by the caller rather than aborting a fetch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A catalog entry as the ingestion pipeline persisted it.
///
/// `embedding` is set exactly once at creation time by the ingestion
/// pipeline; a product without one was never successfully analyzed and
/// is excluded from search until a back-fill happens. The search core
/// only ever reads products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub image_url: String,

    /// Pre-rendered small image; absent means the UI derives one via
    /// CDN transformation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Product {
    /// Validate a loose JSON row into a product.
    ///
    /// Returns `None` when required display fields are missing or of the
    /// wrong shape. An unparsable embedding degrades to `None` (the row
    /// stays listable but is never ranked).
    pub fn from_row(row: &Value) -> Option<Self> {
        let id = row.get("id")?.as_u64()?;
        let name = row.get("name")?.as_str()?.to_string();
        let image_url = row.get("image_url")?.as_str()?.to_string();
        let thumbnail_url = row
            .get("thumbnail_url")
            .and_then(Value::as_str)
            .map(str::to_string);
        let embedding = row.get("embedding").and_then(parse_embedding);

        Some(Self {
            id,
            name,
            image_url,
            thumbnail_url,
            embedding,
        })
    }
}

/// A product as returned to the caller: display fields plus the cosine
/// similarity to the query, never the embedding itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedProduct {
    pub id: u64,
    pub name: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub similarity: f32,
}

impl RankedProduct {
    pub fn new(product: Product, similarity: f32) -> Self {
        Self {
            id: product.id,
            name: product.name,
            image_url: product.image_url,
            thumbnail_url: product.thumbnail_url,
            similarity,
        }
    }

    /// Validate a delegated-ranking row (product fields plus similarity).
    pub fn from_row(row: &Value) -> Option<Self> {
        let similarity = row.get("similarity")?.as_f64()? as f32;
        let product = Product::from_row(row)?;
        Some(Self::new(product, similarity))
    }
}

/// Parse an embedding column value.
///
/// The store serializes vector columns either as a JSON array of numbers
/// or, depending on the driver, as the textual form `"[0.1,0.2,...]"`.
/// Both are accepted; anything else (or an empty vector) is `None`.
pub fn parse_embedding(value: &Value) -> Option<Vec<f32>> {
    let parsed: Option<Vec<f32>> = match value {
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect(),
        Value::String(text) => {
            let inner = text.trim().strip_prefix('[')?.strip_suffix(']')?;
            inner
                .split(',')
                .map(|s| s.trim().parse::<f32>().ok())
                .collect()
        }
        _ => None,
    };

    parsed.filter(|v| !v.is_empty())
}
