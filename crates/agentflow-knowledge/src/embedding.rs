//! Embedding generation (spec §9 open question, resolved): a pluggable
//! `EmbeddingProvider` trait with a deterministic, zero-network default
//! that exercises the 1536-dim contract without depending on a live
//! model. Swap in a real provider (OpenAI/Cohere/etc.) by implementing
//! the trait; nothing else in this crate depends on the choice.

use agentflow_core::hashing::hash_str;
use agentflow_types::EMBEDDING_DIMS;

pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Hashes the input into a seed, then expands it into a unit vector via
/// a simple xorshift stream. Same text always yields the same vector;
/// different text yields near-orthogonal vectors with high probability.
pub struct HashEmbedder;

impl EmbeddingProvider for HashEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let digest = hash_str(text);
        let mut seed = u64::from_str_radix(&digest[..16], 16).unwrap_or(0x9E3779B97F4A7C15);
        if seed == 0 {
            seed = 0x9E3779B97F4A7C15;
        }

        let mut out = Vec::with_capacity(EMBEDDING_DIMS);
        for _ in 0..EMBEDDING_DIMS {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            // Map to [-1.0, 1.0].
            let v = (seed as f64 / u64::MAX as f64) * 2.0 - 1.0;
            out.push(v as f32);
        }

        let norm = (out.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>()).sqrt();
        if norm > 0.0 {
            for v in out.iter_mut() {
                *v = (*v as f64 / norm) as f32;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_yields_same_embedding() {
        let embedder = HashEmbedder;
        assert_eq!(embedder.embed("timeout on fetch"), embedder.embed("timeout on fetch"));
    }

    #[test]
    fn embedding_has_contract_dimensionality() {
        let embedder = HashEmbedder;
        assert_eq!(embedder.embed("anything").len(), EMBEDDING_DIMS);
    }

    #[test]
    fn different_text_yields_different_embedding() {
        let embedder = HashEmbedder;
        assert_ne!(embedder.embed("a"), embedder.embed("b"));
    }
}
