//! Token-budget selection: walk the ranked list, take what fits, stop
//! at `top_k` or when the budget is spent. The budget is a hard
//! ceiling, never a target.

use engram_core::models::RetrievedMemory;

/// Select from a ranked (descending) list. Returns the selection and
/// the tokens it consumed.
pub fn select_within_budget(
    ranked: Vec<RetrievedMemory>,
    top_k: usize,
    token_budget: usize,
) -> (Vec<RetrievedMemory>, i64) {
    let mut selected = Vec::new();
    let mut remaining = token_budget as i64;
    let mut used: i64 = 0;

    for memory in ranked {
        if selected.len() >= top_k || remaining <= 0 {
            break;
        }
        let cost = memory.record.token_count.max(0);
        if cost <= remaining {
            remaining -= cost;
            used += cost;
            selected.push(memory);
        }
        // A memory that does not fit is skipped; a smaller one further
        // down may still fit.
    }

    (selected, used)
}
