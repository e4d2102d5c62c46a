//! Similarity ranking

use std::cmp::Ordering;

use super::traits::Embedding;

/// Ranks a corpus against a query vector
pub trait Ranker: Send + Sync {
    /// Up to `count` keys, closest first
    fn rank(&self, query: &Embedding, corpus: &[(String, Embedding)], count: usize) -> Vec<String>;
}

/// Distance between two vectors of equal length; smaller is closer
pub type DistanceFn = fn(&[f32], &[f32]) -> f32;

/// Cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (ai, bi) in a.iter().zip(b.iter()) {
        let ai = f64::from(*ai);
        let bi = f64::from(*bi);
        dot += ai * bi;
        norm_a += ai * ai;
        norm_b += bi * bi;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (dot / denom) as f32
}

/// `1 - cosine_similarity`
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Brute-force nearest-neighbour ranker
///
/// Ties are broken by key so the result does not depend on corpus order.
/// Entries whose dimension differs from the query are skipped.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityRanker {
    distance: DistanceFn,
}

impl Default for SimilarityRanker {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityRanker {
    /// Ranker using cosine distance
    pub fn new() -> Self {
        Self::with_distance(cosine_distance)
    }

    pub fn with_distance(distance: DistanceFn) -> Self {
        Self { distance }
    }
}

impl Ranker for SimilarityRanker {
    fn rank(&self, query: &Embedding, corpus: &[(String, Embedding)], count: usize) -> Vec<String> {
        let mut scored: Vec<(&str, f32)> = corpus
            .iter()
            .filter(|(_, vector)| vector.dimensions() == query.dimensions())
            .map(|(key, vector)| (key.as_str(), (self.distance)(&query.values, &vector.values)))
            .collect();

        scored.sort_by(|a, b| match a.1.total_cmp(&b.1) {
            Ordering::Equal => a.0.cmp(b.0),
            other => other,
        });

        scored
            .into_iter()
            .take(count)
            .map(|(key, _)| key.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, values: &[f32]) -> (String, Embedding) {
        (key.to_string(), Embedding::new(values.to_vec()))
    }

    #[test]
    fn test_closest_first() {
        let query = Embedding::new(vec![1.0, 0.0]);
        let corpus = vec![
            entry("orthogonal", &[0.0, 1.0]),
            entry("same", &[2.0, 0.0]),
            entry("near", &[1.0, 0.2]),
        ];

        let ranked = SimilarityRanker::new().rank(&query, &corpus, 2);
        assert_eq!(ranked, vec!["same", "near"]);
    }

    #[test]
    fn test_empty_and_oversized_count() {
        let ranker = SimilarityRanker::new();
        let query = Embedding::new(vec![1.0, 0.0]);
        assert!(ranker.rank(&query, &[], 5).is_empty());

        let corpus = vec![entry("b", &[0.0, 1.0]), entry("a", &[1.0, 0.0])];
        assert_eq!(ranker.rank(&query, &corpus, 10), vec!["a", "b"]);
    }

    #[test]
    fn test_ties_broken_by_key() {
        let query = Embedding::new(vec![1.0, 0.0]);
        let corpus = vec![
            entry("zeta", &[1.0, 0.0]),
            entry("alpha", &[1.0, 0.0]),
            entry("mid", &[1.0, 0.0]),
        ];
        let ranked = SimilarityRanker::new().rank(&query, &corpus, 3);
        assert_eq!(ranked, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_custom_distance_and_dimension_mismatch() {
        fn manhattan(a: &[f32], b: &[f32]) -> f32 {
            a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
        }
        let query = Embedding::new(vec![0.0, 0.0]);
        let corpus = vec![
            entry("far", &[3.0, 3.0]),
            entry("close", &[1.0, 0.0]),
            entry("wrong_dims", &[0.0]),
        ];
        let ranked = SimilarityRanker::with_distance(manhattan).rank(&query, &corpus, 5);
        assert_eq!(ranked, vec!["close", "far"]);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
    }
}
