//! # engram-tokens
//!
//! Token counting for budget accounting. Real BPE counts (cl100k) with
//! a content-hash cache in front, since the store path counts the same
//! content it just hashed for embedding.

use moka::sync::Cache;
use tiktoken_rs::CoreBPE;

/// Token counter with a bounded content-hash cache.
pub struct TokenCounter {
    bpe: CoreBPE,
    cache: Cache<String, usize>,
}

impl TokenCounter {
    /// Create a counter with the given cache bound.
    pub fn new(cache_size: u64) -> Self {
        // The cl100k ranks are compiled into the binary; loading them
        // cannot fail for a well-formed build.
        let bpe = tiktoken_rs::cl100k_base().expect("embedded cl100k ranks");
        Self {
            bpe,
            cache: Cache::new(cache_size),
        }
    }

    /// Count tokens, uncached.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    /// Count tokens through the cache, keyed by blake3 of the content.
    pub fn count_cached(&self, text: &str) -> usize {
        let key = blake3::hash(text.as_bytes()).to_hex().to_string();
        if let Some(count) = self.cache.get(&key) {
            return count;
        }
        let count = self.count(text);
        self.cache.insert(key, count);
        count
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new(10_000)
    }
}
