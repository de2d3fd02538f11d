use crate::{catalog::CatalogError, config::ConfigError, embeddings::EmbeddingError, search::SearchError};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("search error: {0}")]
    Search(#[from] SearchError),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}
