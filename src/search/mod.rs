//! Catalog search.
//!
//! - `ranker`: cosine similarity and the full-scan ranking
//! - `policy`: block check, embedding, oversampled ranking and keyword filter

mod policy;
mod ranker;

pub use policy::{QueryResult, SearchError, SearchHit, SearchPolicy, SearchStatus, OVERSAMPLE, TOP_N};
pub use ranker::RankError;
