use agentcore::{BlockId, Connection, ExecutionResult};
use std::collections::HashMap;

/// Separator placed between upstream results
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

const CONTEXT_HEADING: &str = "Results from previous blocks:";

/// Results of the blocks that finished so far in a run.
///
/// Write-once: a block that already has a result keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResults {
    results: HashMap<BlockId, ExecutionResult>,
}

impl RunResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful block. Returns false if it already had a result.
    pub fn record(&mut self, block_id: impl Into<String>, result: ExecutionResult) -> bool {
        let block_id = block_id.into();
        if self.results.contains_key(&block_id) {
            tracing::warn!("Block {} already has a result; keeping the first", block_id);
            return false;
        }
        self.results.insert(block_id, result);
        true
    }

    pub fn get(&self, block_id: &str) -> Option<&ExecutionResult> {
        self.results.get(block_id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_inner(self) -> HashMap<BlockId, ExecutionResult> {
        self.results
    }
}

/// Collect the outputs of a block's finished predecessors.
///
/// Predecessors are visited in connection order; those without a result
/// (failed, cancelled or not yet run) contribute nothing. Returns `None` when
/// no predecessor contributed.
pub fn upstream_context(
    block_id: &str,
    connections: &[Connection],
    results: &RunResults,
) -> Option<String> {
    let parts: Vec<&str> = connections
        .iter()
        .filter(|c| c.is_block_level() && c.target == block_id)
        .filter_map(|c| results.get(&c.source))
        .map(ExecutionResult::text)
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(CONTEXT_SEPARATOR))
    }
}

/// Base task with the upstream context appended, if there is any
pub fn compose_task(
    base_task: &str,
    block_id: &str,
    connections: &[Connection],
    results: &RunResults,
) -> String {
    match upstream_context(block_id, connections, results) {
        Some(context) => format!("{}\n\n{}\n\n{}", base_task, CONTEXT_HEADING, context),
        None => base_task.to_string(),
    }
}
