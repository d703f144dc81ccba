use agentcore::{ExecutionEvent, MessageId, MessageKind, TranscriptChange, TranscriptMessage};
use std::collections::HashMap;
use std::io::Write;
use tokio::sync::broadcast::{error::RecvError, Receiver};

/// Prints the live transcript, writing only what each update adds
#[derive(Default)]
pub struct TranscriptPrinter {
    printed: HashMap<MessageId, usize>,
}

impl TranscriptPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to write for a transcript change, if any
    pub fn render(&mut self, change: &TranscriptChange) -> Option<String> {
        match change {
            TranscriptChange::Appended(msg) => {
                self.printed.insert(msg.id, msg.content.len());
                match msg.kind {
                    MessageKind::Agent => {
                        Some(format!("\n  💬 [{}] {}", speaker(msg), msg.content))
                    }
                    MessageKind::System => Some(format!("\n  ℹ️  {}\n", msg.content)),
                    MessageKind::User => None,
                }
            }
            TranscriptChange::Updated(msg) => {
                let printed = self.printed.entry(msg.id).or_insert(0);
                let delta = msg.content.get(*printed..).unwrap_or_default().to_string();
                *printed = msg.content.len();
                if msg.completed && delta.is_empty() {
                    return Some("\n".to_string());
                }
                (!delta.is_empty()).then_some(delta)
            }
        }
    }

    pub fn handle(&mut self, event: ExecutionEvent) {
        match event {
            ExecutionEvent::RunStarted { total_blocks, .. } => {
                println!("▶️  Run started ({} blocks)", total_blocks);
            }
            ExecutionEvent::BlockStarted {
                block_id,
                block_type,
                ..
            } => {
                println!("\n⚡ Starting block: {} ({})", block_id, block_type.as_str());
            }
            ExecutionEvent::BlockCompleted {
                block_id,
                duration_ms,
                ..
            } => {
                println!("\n✅ Block {} completed in {}ms", block_id, duration_ms);
            }
            ExecutionEvent::BlockFailed { block_id, error, .. } => {
                println!("\n❌ Block {} failed: {}", block_id, error);
            }
            ExecutionEvent::BlockSkipped {
                block_id, reason, ..
            } => {
                println!("⏭️  Skipped block {}: {}", block_id, reason);
            }
            ExecutionEvent::AgentStatus {
                block_id,
                agent: Some(agent),
                progress: Some(progress),
                ..
            } => {
                tracing::debug!("[{}/{}] {}", block_id, agent, progress);
            }
            ExecutionEvent::AgentStatus { .. } => {}
            ExecutionEvent::Transcript { update, .. } => {
                if let Some(text) = self.render(&update) {
                    print!("{}", text);
                    let _ = std::io::stdout().flush();
                }
            }
            ExecutionEvent::RunFinished {
                outcome,
                duration_ms,
                ..
            } => {
                println!("\n✨ Run {} after {}ms", outcome, duration_ms);
            }
        }
    }

    /// Print events until the bus closes
    pub async fn listen(mut self, mut events: Receiver<ExecutionEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.handle(event),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Event printer lagged, {} events dropped", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

fn speaker(msg: &TranscriptMessage) -> String {
    match (&msg.block, &msg.agent) {
        (Some(block), Some(agent)) => format!("{}/{}", block, agent),
        (None, Some(agent)) => agent.clone(),
        _ => "agent".to_string(),
    }
}
