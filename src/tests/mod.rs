use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::embeddings::{Embedder, EmbeddingError};


pub const HEADERS: [&str; 8] = [
    "title",
    "brand",
    "category",
    "product_description",
    "colour",
    "selling_price",
    "image",
    "link",
];

/// Embedder returning canned vectors and counting every call.
pub struct FakeEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
    calls: AtomicUsize,
    fail: bool,
}

impl FakeEmbedder {
    pub fn new(fallback: Vec<f32>) -> Self {
        Self {
            vectors: HashMap::new(),
            fallback,
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(vec![])
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for FakeEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmbeddingError::Status {
                status: 500,
                body: "service unavailable".to_string(),
            });
        }
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }

    fn model(&self) -> &str {
        "fake-embedder"
    }
}

/// Write a csv file with the given header and rows, returning its path.
pub fn write_csv(dir: &Path, headers: &[&str], rows: &[Vec<&str>]) -> PathBuf {
    let path = dir.join("products.csv");
    let mut wrt = csv::Writer::from_path(&path).unwrap();
    wrt.write_record(headers).unwrap();
    for row in rows {
        wrt.write_record(row).unwrap();
    }
    wrt.flush().unwrap();
    path
}
