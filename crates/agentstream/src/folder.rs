use agentcore::{BlockContext, ExecutionResult, StreamEvent};

/// Agent name used for chunks that do not name one
pub const UNNAMED_AGENT: &str = "agent";

/// Status value that closes an agent's message
pub const COMPLETED_STATUS: &str = "completed";

/// What the reader should do after an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fold {
    Continue,
    /// The service reported an error; stop reading
    Failed(String),
}

/// Applies stream events of one block to the run's transcript and status
pub struct StreamFolder<'a> {
    ctx: &'a BlockContext,
    result: Option<ExecutionResult>,
    completed: bool,
}

impl<'a> StreamFolder<'a> {
    pub fn new(ctx: &'a BlockContext) -> Self {
        Self {
            ctx,
            result: None,
            completed: false,
        }
    }

    pub async fn apply(&mut self, event: StreamEvent) -> Fold {
        match event {
            StreamEvent::Status { agent, data } => {
                let progress = StreamEvent::payload_text(&data);
                if progress.as_deref() == Some(COMPLETED_STATUS) {
                    if let Some(agent) = agent.as_deref() {
                        self.ctx.mark_completed(agent).await;
                    }
                }
                self.ctx.report_progress(agent, progress).await;
                Fold::Continue
            }
            StreamEvent::Chunk { agent, data } => {
                let agent = agent.as_deref().unwrap_or(UNNAMED_AGENT);
                match StreamEvent::payload_text(&data) {
                    Some(data) => self.ctx.append_chunk(agent, &data).await,
                    None => tracing::trace!("Empty chunk from {}", agent),
                }
                Fold::Continue
            }
            StreamEvent::Complete { data } => {
                self.completed = true;
                self.result = data
                    .filter(|d| !d.is_null())
                    .map(ExecutionResult::from_payload);
                self.ctx
                    .push_system(format!("Block {} completed successfully.", self.ctx.block_id))
                    .await;
                self.ctx.refresh_changes().await;
                Fold::Continue
            }
            StreamEvent::Error { error } => Fold::Failed(
                StreamEvent::error_text(&error)
                    .unwrap_or_else(|| "Unknown error from service".to_string()),
            ),
            StreamEvent::Unknown => {
                tracing::trace!("Ignoring unknown stream event");
                Fold::Continue
            }
        }
    }

    /// The block's result once the stream has ended.
    ///
    /// Without a `complete` payload the block's last agent message stands in.
    pub async fn finish(self) -> ExecutionResult {
        if let Some(result) = self.result {
            return result;
        }
        if !self.completed {
            tracing::debug!(
                "Stream for block {} ended without a complete event",
                self.ctx.block_id
            );
        }
        ExecutionResult::Raw(self.ctx.last_agent_output().await.unwrap_or_default())
    }
}
