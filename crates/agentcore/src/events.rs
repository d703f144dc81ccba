use crate::{BlockId, BlockType, DesignId, TranscriptChange};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

pub type RunId = Uuid;

/// Events emitted during a design run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExecutionEvent {
    RunStarted {
        run_id: RunId,
        design_id: DesignId,
        total_blocks: usize,
        timestamp: DateTime<Utc>,
    },
    RunFinished {
        run_id: RunId,
        outcome: String,
        error: Option<String>,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    BlockStarted {
        run_id: RunId,
        block_id: BlockId,
        block_type: BlockType,
        timestamp: DateTime<Utc>,
    },
    BlockCompleted {
        run_id: RunId,
        block_id: BlockId,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    BlockFailed {
        run_id: RunId,
        block_id: BlockId,
        error: String,
        timestamp: DateTime<Utc>,
    },
    BlockSkipped {
        run_id: RunId,
        block_id: BlockId,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    AgentStatus {
        run_id: RunId,
        block_id: BlockId,
        agent: Option<String>,
        progress: Option<String>,
        timestamp: DateTime<Utc>,
    },
    Transcript {
        run_id: RunId,
        block_id: Option<BlockId>,
        update: TranscriptChange,
        timestamp: DateTime<Utc>,
    },
}

/// Event emitter scoped to one run, and optionally one block of it
#[derive(Clone)]
pub struct EventEmitter {
    run_id: RunId,
    block_id: Option<BlockId>,
    sender: broadcast::Sender<ExecutionEvent>,
}

impl EventEmitter {
    pub fn new(
        run_id: RunId,
        block_id: Option<BlockId>,
        sender: broadcast::Sender<ExecutionEvent>,
    ) -> Self {
        Self {
            run_id,
            block_id,
            sender,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Same run, different block
    pub fn for_block(&self, block_id: impl Into<String>) -> Self {
        Self {
            run_id: self.run_id,
            block_id: Some(block_id.into()),
            sender: self.sender.clone(),
        }
    }

    pub fn emit(&self, event: ExecutionEvent) {
        let _ = self.sender.send(event);
    }

    /// Publish a transcript mutation
    pub fn transcript(&self, update: TranscriptChange) {
        self.emit(ExecutionEvent::Transcript {
            run_id: self.run_id,
            block_id: self.block_id.clone(),
            update,
            timestamp: Utc::now(),
        });
    }

    /// Publish a status event from the running block
    pub fn agent_status(&self, agent: Option<String>, progress: Option<String>) {
        let Some(block_id) = self.block_id.clone() else {
            return;
        };
        self.emit(ExecutionEvent::AgentStatus {
            run_id: self.run_id,
            block_id,
            agent,
            progress,
            timestamp: Utc::now(),
        });
    }
}

/// Global event bus
pub struct EventBus {
    sender: broadcast::Sender<ExecutionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: ExecutionEvent) {
        let _ = self.sender.send(event);
    }

    pub fn create_emitter(&self, run_id: RunId) -> EventEmitter {
        EventEmitter::new(run_id, None, self.sender.clone())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}
