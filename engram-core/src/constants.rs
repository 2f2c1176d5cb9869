/// Engram system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Dimensionality of every stored embedding vector.
pub const EMBEDDING_DIMENSIONS: usize = 1536;

/// Sentinel fingerprint value meaning "classifier declined to commit".
pub const FINGERPRINT_NONE: &str = "none";

/// Ceiling on model-fallback fingerprint confidence. Deterministic rules
/// may exceed this; an external classifier never does.
pub const MODEL_CONFIDENCE_CAP: f64 = 0.75;

/// Maximum prefilter candidate rows fetched per retrieval.
pub const MAX_CANDIDATE_CAP: usize = 2000;

/// Maximum results returned by the embedding-lag fallback path.
pub const LAG_FALLBACK_RESULT_CAP: usize = 5;
