//! Brute-force cosine similarity ranking over the whole catalog.

use std::sync::Arc;

use crate::catalog::{Catalog, Product};

/// A product paired with its similarity to the query.
#[derive(Debug, Clone)]
pub struct Ranked {
    pub product: Arc<Product>,
    /// Cosine similarity in [-1.0, 1.0]
    pub score: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum RankError {
    #[error("Dimension mismatch: catalog has {expected}, query has {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Compute L2 norm of a vector, accumulated in f64.
fn l2_norm(v: &[f32]) -> f64 {
    v.iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

/// Cosine similarity, 0.0 when either vector has zero norm.
///
/// Sums run in f64 so large finite components cannot overflow and tiny
/// non-zero ones are not mistaken for a zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // +0.0 start so orthogonal pairs never score -0.0 under total_cmp
    let dot_product = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .fold(0.0, |acc, term| acc + term);
    (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0) as f32
}

/// Score every product against `query` and return the best `limit`.
///
/// The sort is stable, so equal scores keep catalog order.
pub fn rank(query: &[f32], catalog: &Catalog, limit: usize) -> Result<Vec<Ranked>, RankError> {
    if !catalog.is_empty() && query.len() != catalog.dimensions() {
        return Err(RankError::DimensionMismatch {
            expected: catalog.dimensions(),
            got: query.len(),
        });
    }

    let mut results: Vec<Ranked> = catalog
        .products()
        .iter()
        .map(|product| Ranked {
            score: cosine_similarity(query, &product.embedding),
            product: Arc::clone(product),
        })
        .collect();

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(limit);

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(embeddings: Vec<Vec<f32>>) -> Catalog {
        let products = embeddings
            .into_iter()
            .enumerate()
            .map(|(i, embedding)| Product {
                title: format!("Product {i}"),
                embedding,
                ..Default::default()
            })
            .collect();
        Catalog::new(products).unwrap()
    }

    #[test]
    fn test_cosine_identical() {
        let a = vec![0.3, 0.4, 0.5];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]) + 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_norm() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_symmetric_and_bounded() {
        let pairs = [
            (vec![1.0, 2.0, 3.0], vec![-3.0, 0.5, 2.0]),
            (vec![1e-3, 5.0, -7.0], vec![4.0, 4.0, 4.0]),
            (vec![0.1, 0.1, 0.1], vec![0.1, 0.1, 0.1000001]),
        ];
        for (a, b) in pairs {
            let ab = cosine_similarity(&a, &b);
            let ba = cosine_similarity(&b, &a);
            assert!((ab - ba).abs() < 1e-6);
            assert!((-1.0..=1.0).contains(&ab));
        }
    }

    #[test]
    fn test_cosine_tiny_norm_is_not_zero() {
        assert!((cosine_similarity(&[1e-8, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1e-30, 1e-30], &[-2.0, -2.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_large_components_stay_bounded() {
        let big = [1e30, 1e30];
        let score = cosine_similarity(&big, &big);
        assert!((score - 1.0).abs() < 1e-6);

        let score = cosine_similarity(&[3e38, -3e38, 1.0], &[1e-3, 2.0, 3e38]);
        assert!(score.is_finite());
        assert!((-1.0..=1.0).contains(&score));
    }

    #[test]
    fn test_rank_large_components_sorted() {
        let catalog = catalog(
            (0..40)
                .map(|i| match i % 3 {
                    0 => vec![1e30, 1e30],
                    1 => vec![0.0, 1e30],
                    _ => vec![-1e30, i as f32],
                })
                .collect(),
        );
        let results = rank(&[1e30, 1e30], &catalog, 40).unwrap();

        assert_eq!(results.len(), 40);
        assert!(results.iter().all(|r| r.score.is_finite()));
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(results[0].product.title, "Product 0");
    }

    #[test]
    fn test_rank_descending() {
        let catalog = catalog(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![-1.0, 0.0],
        ]);
        let results = rank(&[1.0, 0.1], &catalog, 10).unwrap();

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].product.title, "Product 1");
        assert_eq!(results[3].product.title, "Product 3");
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_rank_ties_keep_catalog_order() {
        let catalog = catalog(vec![
            vec![0.0, 1.0],
            vec![2.0, 0.0],
            vec![0.0, 5.0],
            vec![1.0, 0.0],
            vec![0.0, 0.0],
        ]);
        let results = rank(&[1.0, 0.0], &catalog, 10).unwrap();
        let titles: Vec<&str> = results.iter().map(|r| r.product.title.as_str()).collect();

        assert_eq!(
            titles,
            vec!["Product 1", "Product 3", "Product 0", "Product 2", "Product 4"]
        );
    }

    #[test]
    fn test_rank_orthogonal_negative_zero_ties() {
        let catalog = catalog(vec![vec![0.0, 1.0], vec![0.0, -1.0], vec![0.0, 2.0]]);
        let results = rank(&[-1.0, 0.0], &catalog, 10).unwrap();
        let titles: Vec<&str> = results.iter().map(|r| r.product.title.as_str()).collect();

        assert_eq!(titles, vec!["Product 0", "Product 1", "Product 2"]);
    }

    #[test]
    fn test_rank_limit() {
        let catalog = catalog((0..10).map(|i| vec![1.0, i as f32 * 0.1]).collect());
        let results = rank(&[1.0, 0.0], &catalog, 3).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].product.title, "Product 0");
    }

    #[test]
    fn test_rank_dimension_mismatch() {
        let catalog = catalog(vec![vec![1.0, 0.0, 0.0]]);
        let result = rank(&[1.0, 0.0], &catalog, 10);
        assert!(matches!(
            result,
            Err(RankError::DimensionMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn test_rank_empty_catalog() {
        let catalog = Catalog::default();
        assert!(rank(&[1.0], &catalog, 10).unwrap().is_empty());
    }
}
