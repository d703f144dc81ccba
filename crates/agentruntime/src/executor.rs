use crate::dispatcher::BlockDispatcher;
use crate::ordering::{order_blocks, BlockOrder};
use crate::propagate::{compose_task, RunResults};
use crate::scope::ResourceScope;
use agentcore::{
    BlockId, Design, ExecutionEvent, ExecutionResult, GraphError, RunContext, RunError, RunId,
    RunPhase, StreamingClient, TranscriptMessage,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// What to do with blocks that sit in or behind a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePolicy {
    /// Fail the run before any block starts
    #[default]
    Reject,
    /// Run the blocks that could be ordered and skip the rest
    RunReachable,
}

/// Inputs of one run besides the design itself
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub task: String,
    /// Run-scoped resource identifier the agents are confined to
    pub resource_scope: String,
    /// Repository reference forwarded to the service
    pub repository: String,
}

impl RunRequest {
    pub fn new(task: impl Into<String>, resource_scope: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            resource_scope: resource_scope.into(),
            repository: String::new(),
        }
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }
}

/// Terminal state of a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed(RunError),
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Cancelled => "cancelled",
            RunOutcome::Failed(_) => "failed",
        }
    }

    fn phase(&self) -> RunPhase {
        match self {
            RunOutcome::Completed => RunPhase::Completed,
            RunOutcome::Cancelled => RunPhase::Cancelled,
            RunOutcome::Failed(_) => RunPhase::Failed,
        }
    }

    fn error(&self) -> Option<&RunError> {
        match self {
            RunOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub outcome: RunOutcome,
    /// Blocks in execution order
    pub order: Vec<BlockId>,
    /// Blocks left out because of a cycle
    pub skipped: Vec<BlockId>,
    pub results: HashMap<BlockId, ExecutionResult>,
    pub transcript: Vec<TranscriptMessage>,
    pub duration_ms: u64,
}

/// Drives a design run one block at a time
pub struct ExecutionCoordinator {
    dispatcher: BlockDispatcher,
    cycle_policy: CyclePolicy,
}

impl ExecutionCoordinator {
    pub fn new(client: Arc<dyn StreamingClient>, model: impl Into<String>) -> Self {
        Self {
            dispatcher: BlockDispatcher::new(client, model),
            cycle_policy: CyclePolicy::default(),
        }
    }

    pub fn with_cycle_policy(mut self, cycle_policy: CyclePolicy) -> Self {
        self.cycle_policy = cycle_policy;
        self
    }

    /// Execute a design and return the report.
    ///
    /// Always leaves exactly one terminal system message in the transcript.
    pub async fn execute(
        &self,
        design: &Design,
        request: RunRequest,
        ctx: RunContext,
    ) -> RunReport {
        let start_time = Instant::now();

        tracing::info!("Starting run {} of design {}", ctx.run_id, design.id);
        ctx.events.emit(ExecutionEvent::RunStarted {
            run_id: ctx.run_id,
            design_id: design.id.clone(),
            total_blocks: design.blocks.len(),
            timestamp: Utc::now(),
        });
        ctx.push_message(TranscriptMessage::user(request.task.clone())).await;

        let mut results = RunResults::new();
        let mut plan = BlockOrder::default();
        let outcome = self
            .drive(design, &request, &ctx, &mut plan, &mut results)
            .await;

        let summary = match &outcome {
            RunOutcome::Completed => format!(
                "Execution completed: {} of {} blocks finished.",
                results.len(),
                design.blocks.len()
            ),
            RunOutcome::Cancelled => "Execution cancelled.".to_string(),
            RunOutcome::Failed(err) => format!("Error: {}", err),
        };
        ctx.push_message(TranscriptMessage::system(summary)).await;
        ctx.status.write().await.enter(outcome.phase());

        let duration_ms = start_time.elapsed().as_millis() as u64;
        match &outcome {
            RunOutcome::Failed(err) => tracing::error!("Run {} failed: {}", ctx.run_id, err),
            other => tracing::info!("Run {} {} in {}ms", ctx.run_id, other.as_str(), duration_ms),
        }
        ctx.events.emit(ExecutionEvent::RunFinished {
            run_id: ctx.run_id,
            outcome: outcome.as_str().to_string(),
            error: outcome.error().map(|e| e.to_string()),
            duration_ms,
            timestamp: Utc::now(),
        });

        let transcript = ctx.transcript.read().await.snapshot();
        RunReport {
            run_id: ctx.run_id,
            outcome,
            order: plan.order,
            skipped: plan.unreached,
            results: results.into_inner(),
            transcript,
            duration_ms,
        }
    }

    async fn drive(
        &self,
        design: &Design,
        request: &RunRequest,
        ctx: &RunContext,
        plan: &mut BlockOrder,
        results: &mut RunResults,
    ) -> RunOutcome {
        ctx.status.write().await.enter(RunPhase::Ordering);
        *plan = match self.order(design, ctx) {
            Ok(order) => order,
            Err(err) => return RunOutcome::Failed(err.into()),
        };

        let scope = ResourceScope::new(request.resource_scope.clone());
        let total = plan.order.len();

        for (index, block_id) in plan.order.iter().enumerate() {
            if ctx.cancellation.is_cancelled() {
                tracing::info!("Run {} cancelled before block {}", ctx.run_id, block_id);
                return RunOutcome::Cancelled;
            }

            let Some(block) = design.find_block(block_id) else {
                return RunOutcome::Failed(GraphError::UnknownBlock(block_id.clone()).into());
            };

            ctx.status.write().await.start_block(block_id, index, total);
            ctx.events.emit(ExecutionEvent::BlockStarted {
                run_id: ctx.run_id,
                block_id: block_id.clone(),
                block_type: block.block_type,
                timestamp: Utc::now(),
            });

            let task = compose_task(&request.task, block_id, &design.connections, results);
            let task = scope.scope_task(&task);
            let agents = scope.contextualize(&block.agents);
            let block_ctx = ctx.for_block(block_id.clone());

            let started = Instant::now();
            match self
                .dispatcher
                .dispatch(block, agents, task, &request.repository, &block_ctx)
                .await
            {
                Ok(result) => {
                    let duration_ms = started.elapsed().as_millis() as u64;
                    tracing::info!("Block {} completed in {}ms", block_id, duration_ms);
                    results.record(block_id.clone(), result);
                    ctx.events.emit(ExecutionEvent::BlockCompleted {
                        run_id: ctx.run_id,
                        block_id: block_id.clone(),
                        duration_ms,
                        timestamp: Utc::now(),
                    });
                }
                Err(err) => {
                    let Some(run_err) = RunError::from_block(block_id.clone(), err) else {
                        tracing::info!("Block {} cancelled mid-stream", block_id);
                        return RunOutcome::Cancelled;
                    };
                    tracing::error!("Block {} failed: {}", block_id, run_err);
                    ctx.events.emit(ExecutionEvent::BlockFailed {
                        run_id: ctx.run_id,
                        block_id: block_id.clone(),
                        error: run_err.to_string(),
                        timestamp: Utc::now(),
                    });
                    return RunOutcome::Failed(run_err);
                }
            }
        }

        RunOutcome::Completed
    }

    /// Validate and order the design, applying the cycle policy
    fn order(&self, design: &Design, ctx: &RunContext) -> Result<BlockOrder, GraphError> {
        design.validate()?;

        let order = order_blocks(&design.blocks, &design.connections);
        if order.is_empty() {
            return Err(GraphError::NoExecutableBlocks);
        }

        if !order.is_complete() {
            match self.cycle_policy {
                CyclePolicy::Reject => {
                    return Err(GraphError::CycleDetected {
                        blocks: order.unreached.clone(),
                    });
                }
                CyclePolicy::RunReachable => {
                    for block_id in &order.unreached {
                        tracing::warn!("Skipping block {}: part of or behind a cycle", block_id);
                        ctx.events.emit(ExecutionEvent::BlockSkipped {
                            run_id: ctx.run_id,
                            block_id: block_id.clone(),
                            reason: "part of or behind a cycle".to_string(),
                            timestamp: Utc::now(),
                        });
                    }
                }
            }
        }

        tracing::debug!("Execution order: {:?}", order.order);
        Ok(order)
    }
}
