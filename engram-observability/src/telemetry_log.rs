//! Append-only retrieval-telemetry log with ring-buffer retention and
//! latency percentile helpers.

use engram_core::models::RetrievalTelemetry;

/// Bounded history of retrieval telemetry entries.
#[derive(Debug, Clone, Default)]
pub struct TelemetryLog {
    entries: Vec<RetrievalTelemetry>,
    /// Maximum entries to retain (ring buffer behavior).
    max_entries: usize,
}

impl TelemetryLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            max_entries: 50_000,
        }
    }

    /// Create with a custom capacity.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    /// Record one operation's telemetry.
    pub fn record(&mut self, entry: RetrievalTelemetry) {
        tracing::debug!(
            event = "retrieval_telemetry",
            method = %entry.method,
            correlation_id = %entry.correlation_id,
            candidates = entry.candidates_considered,
            injected = entry.results_injected,
            tokens_used = entry.tokens_used,
            fallback = entry.fallback_used,
            wrong_user_filtered = entry.wrong_user_memories_filtered,
            latency_ms = entry.latency.total_ms,
            success = entry.success,
            "telemetry recorded"
        );

        self.entries.push(entry);
        if self.entries.len() > self.max_entries {
            self.entries.drain(..self.entries.len() - self.max_entries);
        }
    }

    pub fn entries(&self) -> &[RetrievalTelemetry] {
        &self.entries
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Average end-to-end latency across recorded operations.
    pub fn avg_latency_ms(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let total: u64 = self.entries.iter().map(|e| e.latency.total_ms).sum();
        total as f64 / self.entries.len() as f64
    }

    /// Latency at the given percentile (0.0–1.0).
    pub fn latency_percentile_ms(&self, p: f64) -> u64 {
        if self.entries.is_empty() {
            return 0;
        }
        let mut latencies: Vec<u64> = self.entries.iter().map(|e| e.latency.total_ms).collect();
        latencies.sort_unstable();
        let idx = ((p * (latencies.len() - 1) as f64).round() as usize).min(latencies.len() - 1);
        latencies[idx]
    }

    /// Total cross-user rows the isolation sentinel has ever filtered.
    /// Anything above zero deserves an operator's attention.
    pub fn isolation_violations(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.wrong_user_memories_filtered)
            .sum()
    }
}
