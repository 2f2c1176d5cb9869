//! Bounded per-process cache for query embeddings. Keys include the
//! tenant so one user's query vector is never served to another.

use moka::sync::Cache;

pub struct QueryEmbeddingCache {
    cache: Cache<String, Vec<f32>>,
}

impl QueryEmbeddingCache {
    pub fn new(max_entries: u64) -> Self {
        Self {
            cache: Cache::new(max_entries),
        }
    }

    fn key(user_id: &str, text: &str) -> String {
        format!("{user_id}:{}", blake3::hash(text.as_bytes()).to_hex())
    }

    pub fn get(&self, user_id: &str, text: &str) -> Option<Vec<f32>> {
        self.cache.get(&Self::key(user_id, text))
    }

    pub fn insert(&self, user_id: &str, text: &str, vector: Vec<f32>) {
        self.cache.insert(Self::key(user_id, text), vector);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_tenant_scoped() {
        let cache = QueryEmbeddingCache::new(16);
        cache.insert("alice", "what is my color", vec![1.0]);
        assert_eq!(cache.get("alice", "what is my color"), Some(vec![1.0]));
        assert_eq!(cache.get("bob", "what is my color"), None);
    }
}
