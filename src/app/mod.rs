pub mod errors;

use std::sync::Arc;
use std::time::Instant;

pub use errors::AppError;

use crate::catalog::{Catalog, CatalogStore};
use crate::config::Config;
use crate::embeddings::{Embedder, OpenAiEmbedder};
use crate::search::{QueryResult, SearchPolicy};

/// Composition root: one catalog store and one search policy sharing an embedder.
///
/// The catalog is read on the first search (or `catalog()` call) and reused
/// for every later request.
pub struct App {
    store: CatalogStore,
    policy: SearchPolicy,
}

impl App {
    pub fn new(config: &Config, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store: CatalogStore::new(config.catalog_path.clone(), Arc::clone(&embedder)),
            policy: SearchPolicy::new(embedder),
        }
    }

    /// Build an app talking to the configured embedding service.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let embedder = OpenAiEmbedder::new(
            &config.api_key,
            &config.embedding.base_url,
            &config.embedding.model,
            config.embedding.timeout(),
        )?;

        Ok(Self::new(config, Arc::new(embedder)))
    }

    pub fn catalog(&self) -> Result<Arc<Catalog>, AppError> {
        if !self.store.is_loaded() {
            log::debug!("catalog not loaded yet, reading from disk");
        }
        Ok(self.store.load()?)
    }

    /// Run one search request against the cached catalog.
    pub fn handle_search(&self, query: &str) -> Result<QueryResult, AppError> {
        let query = query.trim();
        let catalog = self.catalog()?;

        let now = Instant::now();
        let result = self.policy.search(&catalog, query)?;

        log::info!(
            "search {query:?}: {:?} with {} hits in {}ms",
            result.status,
            result.hits.len(),
            now.elapsed().as_millis()
        );

        Ok(result)
    }
}
