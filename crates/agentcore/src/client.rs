use crate::{
    events::EventEmitter, Agent, BlockError, BlockId, ExecutionResult, ExecutionStatus, RunId,
    Transcript, TranscriptMessage,
};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Remote execution strategy, one streaming endpoint each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Sequential,
    Parallel,
    Routing,
}

impl Strategy {
    /// Endpoint path relative to the service base URL
    pub fn path(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential/stream",
            Strategy::Parallel => "parallel/stream",
            Strategy::Routing => "routing/stream",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::Parallel => "parallel",
            Strategy::Routing => "routing",
        }
    }
}

/// Strategy-specific ordering fields of a request body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StrategyPlan {
    Sequential {
        agent_sequence: Vec<String>,
    },
    Parallel {
        agent_names: Vec<String>,
        aggregator: Option<String>,
    },
    Routing {
        router: Agent,
        specialists: Vec<Agent>,
        specialist_names: Vec<String>,
    },
}

impl StrategyPlan {
    pub fn strategy(&self) -> Strategy {
        match self {
            StrategyPlan::Sequential { .. } => Strategy::Sequential,
            StrategyPlan::Parallel { .. } => Strategy::Parallel,
            StrategyPlan::Routing { .. } => Strategy::Routing,
        }
    }
}

/// Body of one streaming call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyRequest {
    pub task: String,
    pub agents: Vec<Agent>,
    #[serde(flatten)]
    pub plan: StrategyPlan,
    pub model: String,
    pub git_repo: String,
}

impl StrategyRequest {
    pub fn strategy(&self) -> Strategy {
        self.plan.strategy()
    }
}

/// Executes one block against the remote completion service.
///
/// Implementations stream the response into `ctx`'s transcript and resolve
/// with the block's result, `BlockError::Cancelled` when the run's token
/// fires, or the failure that should abort the run.
#[async_trait]
pub trait StreamingClient: Send + Sync {
    async fn stream(
        &self,
        request: StrategyRequest,
        ctx: &BlockContext,
    ) -> Result<ExecutionResult, BlockError>;
}

/// Collaborator notified after each block reports completion
#[async_trait]
pub trait ChangeRefresher: Send + Sync {
    async fn refresh(&self, block_id: &str);
}

/// Refresher for callers without pending-change tracking
pub struct NoopRefresher;

#[async_trait]
impl ChangeRefresher for NoopRefresher {
    async fn refresh(&self, _block_id: &str) {}
}

/// State shared by every block of one run
#[derive(Clone)]
pub struct RunContext {
    pub run_id: RunId,

    /// Append-only transcript of the run
    pub transcript: Arc<RwLock<Transcript>>,

    /// Live status of the block in flight
    pub status: Arc<RwLock<ExecutionStatus>>,

    /// Run-scoped event emitter
    pub events: EventEmitter,

    /// Cancellation token for the whole run
    pub cancellation: CancellationToken,

    /// Pending-change refresh hook
    pub refresher: Arc<dyn ChangeRefresher>,
}

impl RunContext {
    pub fn new(events: EventEmitter, cancellation: CancellationToken) -> Self {
        Self {
            run_id: events.run_id(),
            transcript: Arc::new(RwLock::new(Transcript::new())),
            status: Arc::new(RwLock::new(ExecutionStatus::default())),
            events,
            cancellation,
            refresher: Arc::new(NoopRefresher),
        }
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn ChangeRefresher>) -> Self {
        self.refresher = refresher;
        self
    }

    pub fn for_block(&self, block_id: impl Into<String>) -> BlockContext {
        let block_id = block_id.into();
        BlockContext {
            events: self.events.for_block(block_id.clone()),
            block_id,
            run: self.clone(),
        }
    }

    /// Append a run-level message and publish it
    pub async fn push_message(&self, message: TranscriptMessage) {
        let change = self.transcript.write().await.push(message);
        self.events.transcript(change);
    }
}

/// Execution context passed to the streaming client for one block
#[derive(Clone)]
pub struct BlockContext {
    pub block_id: BlockId,
    pub events: EventEmitter,
    pub run: RunContext,
}

impl BlockContext {
    pub fn cancellation(&self) -> &CancellationToken {
        &self.run.cancellation
    }

    /// Fold an agent chunk into the transcript
    pub async fn append_chunk(&self, agent: &str, data: &str) {
        let change = self
            .run
            .transcript
            .write()
            .await
            .append_chunk(&self.block_id, agent, data);
        self.events.transcript(change);
    }

    /// Flag the agent's latest message in this block as completed
    pub async fn mark_completed(&self, agent: &str) {
        let change = self
            .run
            .transcript
            .write()
            .await
            .mark_completed(&self.block_id, agent);
        if let Some(change) = change {
            self.events.transcript(change);
        }
    }

    pub async fn push_system(&self, content: impl Into<String>) {
        let change = self
            .run
            .transcript
            .write()
            .await
            .push(TranscriptMessage::system(content));
        self.events.transcript(change);
    }

    pub async fn report_progress(&self, agent: Option<String>, progress: Option<String>) {
        self.run
            .status
            .write()
            .await
            .agent_progress(agent.clone(), progress.clone());
        self.events.agent_status(agent, progress);
    }

    pub async fn last_agent_output(&self) -> Option<String> {
        self.run
            .transcript
            .read()
            .await
            .last_agent_output(&self.block_id)
            .map(str::to_string)
    }

    pub async fn refresh_changes(&self) {
        self.run.refresher.refresh(&self.block_id).await;
    }
}
