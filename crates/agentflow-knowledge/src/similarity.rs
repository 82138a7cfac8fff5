//! Vector similarity search behind a trait (spec §4.6): the in-process
//! index here is a flat scan, fine for the sizes this substrate targets
//! in-test; a Postgres/pgvector-backed index with an ANN structure
//! (ivfflat/hnsw) implements the same trait for production scale.

use uuid::Uuid;

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

pub trait SimilarityIndex: Send + Sync {
    fn upsert(&self, id: Uuid, embedding: Vec<f32>);
    fn remove(&self, id: Uuid);
    /// Returns `(id, score)` pairs ordered by descending similarity,
    /// restricted to scores at or above `threshold`, capped at `top_k`.
    fn search(&self, query: &[f32], top_k: usize, threshold: f64) -> Vec<(Uuid, f64)>;
}

#[derive(Default)]
pub struct FlatSimilarityIndex {
    entries: dashmap::DashMap<Uuid, Vec<f32>>,
}

impl FlatSimilarityIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SimilarityIndex for FlatSimilarityIndex {
    fn upsert(&self, id: Uuid, embedding: Vec<f32>) {
        self.entries.insert(id, embedding);
    }

    fn remove(&self, id: Uuid) {
        self.entries.remove(&id);
    }

    fn search(&self, query: &[f32], top_k: usize, threshold: f64) -> Vec<(Uuid, f64)> {
        let mut scored: Vec<(Uuid, f64)> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), cosine_similarity(query, entry.value())))
            .filter(|(_, score)| *score >= threshold)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(top_k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec![0.5f32, 0.5, 0.5, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        let a = vec![1.0f32, 0.0];
        let b = vec![0.0f32, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-9);
    }

    #[test]
    fn search_respects_threshold_and_top_k() {
        let index = FlatSimilarityIndex::new();
        let near = vec![1.0f32, 0.0, 0.0];
        let far = vec![0.0f32, 1.0, 0.0];
        let id_near = Uuid::new_v4();
        let id_far = Uuid::new_v4();
        index.upsert(id_near, near.clone());
        index.upsert(id_far, far);

        let results = index.search(&near, 5, 0.5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, id_near);
    }
}
