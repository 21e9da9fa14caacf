//! Deterministic, offline embedder based on feature hashing.
//!
//! Each lowercase alphanumeric token is hashed (FNV-1a) into one of `dim`
//! buckets with a hash-derived sign; the result is L2-normalised. Texts that
//! share words end up close under cosine similarity, which is enough for
//! local runs and tests without an embedding model.

use crate::embed::{EmbedFuture, EmbeddingsProvider};

pub const DEFAULT_HASHING_DIM: usize = 256;

#[derive(Clone, Debug)]
pub struct HashingEmbedder {
    dim: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIM)
    }
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lower = text.to_lowercase();
        for token in lower.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let h = fnv1a(token.as_bytes());
            let bucket = (h % self.dim as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

impl EmbeddingsProvider for HashingEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
        Box::pin(async move { Ok(self.vectorize(text)) })
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        h ^= u64::from(*b);
        h = h.wrapping_mul(0x0100_0000_01b3);
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::cosine;

    #[test]
    fn same_text_same_vector() {
        let e = HashingEmbedder::new(64);
        assert_eq!(e.vectorize("Ferris the crab"), e.vectorize("ferris THE crab!"));
    }

    #[test]
    fn shared_words_score_higher() {
        let e = HashingEmbedder::default();
        let q = e.vectorize("invoice total amount");
        let near = e.vectorize("the invoice total amount is 42 dollars");
        let far = e.vectorize("a poem about autumn leaves");
        assert!(cosine(&q, &near) > cosine(&q, &far));
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let e = HashingEmbedder::new(8);
        assert!(e.vectorize("  ...  ").iter().all(|x| *x == 0.0));
    }
}
