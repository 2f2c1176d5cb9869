/// Classifier-fallback errors. Both are non-fatal at the call site: the
/// classifier maps them to "no fingerprint" with the matching method tag.
#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    #[error("classifier fallback exceeded {deadline_ms}ms deadline")]
    LabelerTimeout { deadline_ms: u64 },

    #[error("classifier returned unknown label: {label}")]
    UnknownLabel { label: String },
}
