//! Query handling: keyword block, semantic ranking, keyword filter.
//!
//! 1. Queries naming a blocked garment short-circuit to a random sample
//!    of the catalog without calling the embedding service.
//! 2. Otherwise the query is embedded and the catalog ranked, keeping
//!    `OVERSAMPLE` candidates.
//! 3. Candidates must contain at least one query token in their title,
//!    category or description. The first `TOP_N` survivors are returned.

use std::sync::Arc;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;

use super::ranker::{rank, RankError};
use crate::catalog::{Catalog, Product};
use crate::embeddings::{Embedder, EmbeddingError};

/// Maximum number of products returned by a search.
pub const TOP_N: usize = 20;

/// Ranked candidates kept before keyword filtering.
pub const OVERSAMPLE: usize = 100;

/// Query words that switch a search to the fallback sample.
pub const DISALLOWED_KEYWORDS: [&str; 9] = [
    "jacket",
    "jackets",
    "hoodie",
    "hoodies",
    "skirt",
    "skirts",
    "shorts",
    "sweatshirt",
    "sweatshirts",
];

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Ranking error: {0}")]
    Rank(#[from] RankError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Blocked,
    Matched,
    NoMatch,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub product: Arc<Product>,
    /// Similarity to the query, absent for blocked fallback samples
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub status: SearchStatus,
    pub hits: Vec<SearchHit>,
}

impl QueryResult {
    fn no_match() -> Self {
        Self {
            status: SearchStatus::NoMatch,
            hits: vec![],
        }
    }
}

/// Lowercased, whitespace-split query words, duplicates removed, in query order.
pub fn tokenize(query: &str) -> Vec<String> {
    let mut tokens: Vec<String> = vec![];
    for token in query.to_lowercase().split_whitespace() {
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

pub fn is_blocked(tokens: &[String]) -> bool {
    tokens
        .iter()
        .any(|token| DISALLOWED_KEYWORDS.contains(&token.as_str()))
}

/// Whether any token occurs inside the product's title, category or description.
pub fn matches_keywords(product: &Product, tokens: &[String]) -> bool {
    let haystack = product.keyword_haystack();
    tokens.iter().any(|token| haystack.contains(token.as_str()))
}

pub struct SearchPolicy {
    embedder: Arc<dyn Embedder>,
}

impl SearchPolicy {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub fn search(&self, catalog: &Catalog, query: &str) -> Result<QueryResult, SearchError> {
        self.search_with_rng(catalog, query, &mut rand::rng())
    }

    /// Same as `search()` with a caller-provided source for the fallback sample.
    pub fn search_with_rng<R: Rng + ?Sized>(
        &self,
        catalog: &Catalog,
        query: &str,
        rng: &mut R,
    ) -> Result<QueryResult, SearchError> {
        let tokens = tokenize(query);

        if is_blocked(&tokens) {
            log::debug!("query {query:?} hit a blocked keyword, sampling catalog");
            let hits = catalog
                .products()
                .choose_multiple(rng, TOP_N)
                .map(|product| SearchHit {
                    product: Arc::clone(product),
                    similarity: None,
                })
                .collect();

            return Ok(QueryResult {
                status: SearchStatus::Blocked,
                hits,
            });
        }

        // nothing to embed and nothing the keyword filter could accept
        if tokens.is_empty() {
            return Ok(QueryResult::no_match());
        }

        let query_embedding = self.embedder.embed(query)?;
        let candidates = rank(&query_embedding, catalog, OVERSAMPLE)?;

        let hits: Vec<SearchHit> = candidates
            .into_iter()
            .filter(|ranked| matches_keywords(&ranked.product, &tokens))
            .take(TOP_N)
            .map(|ranked| SearchHit {
                product: ranked.product,
                similarity: Some(ranked.score),
            })
            .collect();

        if hits.is_empty() {
            return Ok(QueryResult::no_match());
        }

        Ok(QueryResult {
            status: SearchStatus::Matched,
            hits,
        })
    }
}
