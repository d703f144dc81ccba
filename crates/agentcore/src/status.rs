use serde::{Deserialize, Serialize};

/// Where a run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Ordering,
    Running { index: usize, total: usize },
    Completed,
    Cancelled,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Completed | RunPhase::Cancelled | RunPhase::Failed)
    }
}

/// Live view of the block currently in flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatus {
    pub executing: bool,
    pub phase: RunPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_block: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
}

impl Default for ExecutionStatus {
    fn default() -> Self {
        Self {
            executing: false,
            phase: RunPhase::Idle,
            current_block: None,
            current_agent: None,
            progress: None,
        }
    }
}

impl ExecutionStatus {
    pub fn enter(&mut self, phase: RunPhase) {
        self.phase = phase;
        self.executing = !phase.is_terminal() && phase != RunPhase::Idle;
        if phase.is_terminal() {
            self.current_block = None;
            self.current_agent = None;
            self.progress = None;
        }
    }

    pub fn start_block(&mut self, block_id: &str, index: usize, total: usize) {
        self.enter(RunPhase::Running { index, total });
        self.current_block = Some(block_id.to_string());
        self.current_agent = None;
        self.progress = None;
    }

    pub fn agent_progress(&mut self, agent: Option<String>, progress: Option<String>) {
        if agent.is_some() {
            self.current_agent = agent;
        }
        self.progress = progress;
    }
}
