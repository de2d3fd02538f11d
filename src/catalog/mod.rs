//! Product catalog backed by a CSV file.
//!
//! - `product`: the typed product record and its derived texts
//! - `literal`: text encoding of embedding vectors in the CSV
//! - `store`: loading, embedding backfill and the once-per-store cache

mod literal;
mod product;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

pub use literal::{format_vector, VectorParseError};
pub use product::{Product, EMBEDDING_COLUMN};
pub use store::CatalogStore;

use crate::embeddings::EmbeddingError;

/// Default location of the catalog file.
pub const DEFAULT_CATALOG_PATH: &str = "female_products_with_embeddings.csv";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog file not found: {0}")]
    NotFound(PathBuf),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog is missing required column {0:?}")]
    MissingColumn(&'static str),

    #[error("malformed embedding on row {row}: {source}")]
    Parse {
        row: usize,
        #[source]
        source: VectorParseError,
    },

    #[error("embedding dimension mismatch on row {row}: expected {expected}, got {got}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("embedding backfill failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Loaded products, in file order, all sharing one embedding dimension.
#[derive(Debug, Default)]
pub struct Catalog {
    products: Vec<Arc<Product>>,
    dimensions: usize,
}

impl Catalog {
    /// Build a catalog, checking every embedding has the same dimension.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let dimensions = products.first().map(|p| p.embedding.len()).unwrap_or(0);

        for (row, product) in products.iter().enumerate() {
            if product.embedding.len() != dimensions {
                return Err(CatalogError::DimensionMismatch {
                    row,
                    expected: dimensions,
                    got: product.embedding.len(),
                });
            }
        }

        Ok(Self {
            products: products.into_iter().map(Arc::new).collect(),
            dimensions,
        })
    }

    pub fn products(&self) -> &[Arc<Product>] {
        &self.products
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
