use agentcore::{
    Agent, Block, BlockContext, BlockError, BlockType, ChangeRefresher, Design, ExecutionResult,
    RunError, StrategyRequest, StreamingClient,
};
use agentruntime::{AgentRuntime, FileDesignLoader, RunOutcome, RunRequest, RuntimeConfig};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Echoes the task back and reports completion through the refresh hook
struct EchoClient;

#[async_trait]
impl StreamingClient for EchoClient {
    async fn stream(
        &self,
        request: StrategyRequest,
        ctx: &BlockContext,
    ) -> Result<ExecutionResult, BlockError> {
        ctx.append_chunk(&request.agents[0].name, "echo").await;
        ctx.refresh_changes().await;
        Ok(ExecutionResult::Final(format!("{}:{}", ctx.block_id, request.model)))
    }
}

#[derive(Default)]
struct RecordingRefresher {
    refreshed: Mutex<Vec<String>>,
}

#[async_trait]
impl ChangeRefresher for RecordingRefresher {
    async fn refresh(&self, block_id: &str) {
        self.refreshed.lock().unwrap().push(block_id.to_string());
    }
}

fn design() -> Design {
    let mut design = Design::new("docs", "Docs pipeline");
    design.add_block(
        Block::new("draft", BlockType::Sequential).with_agent(Agent::new("writer", "Write.")),
    );
    design.add_block(
        Block::new("review", BlockType::Parallel).with_agent(Agent::new("editor", "Edit.")),
    );
    design.connect("draft", "review");
    design
}

#[tokio::test]
async fn test_execute_registered_design() {
    let refresher = Arc::new(RecordingRefresher::default());
    let config = RuntimeConfig {
        model: "local-model".to_string(),
        ..RuntimeConfig::default()
    };
    let runtime = AgentRuntime::with_config(Arc::new(EchoClient), config)
        .with_refresher(refresher.clone());
    runtime.register_design(design()).await;

    let report = runtime
        .execute_design(
            "docs",
            RunRequest::new("Document the API", "scope"),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(
        report.results.get("review"),
        Some(&ExecutionResult::Final("review:local-model".into()))
    );
    assert_eq!(*refresher.refreshed.lock().unwrap(), vec!["draft", "review"]);
}

#[tokio::test]
async fn test_unknown_design_id() {
    let runtime = AgentRuntime::new(Arc::new(EchoClient));

    let err = runtime
        .execute_design(
            "missing",
            RunRequest::new("task", "scope"),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err, RunError::DesignNotFound("missing".into()));
}

#[tokio::test]
async fn test_file_loader_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let json = serde_json::to_string_pretty(&design()).unwrap();
    std::fs::write(dir.path().join("docs.json"), json).unwrap();

    let runtime = AgentRuntime::new(Arc::new(EchoClient));
    let loader = FileDesignLoader::new(dir.path());
    runtime.load_design(&loader, "docs").await.unwrap();

    let report = runtime
        .execute_design(
            "docs",
            RunRequest::new("task", "scope"),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(report.order, vec!["draft", "review"]);

    let missing = runtime.load_design(&loader, "nope").await.unwrap_err();
    assert_eq!(missing, RunError::DesignNotFound("nope".into()));
}

#[tokio::test]
async fn test_file_loader_rejects_bad_json() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

    let loader = FileDesignLoader::new(dir.path());
    let runtime = AgentRuntime::new(Arc::new(EchoClient));
    let err = runtime.load_design(&loader, "broken").await.unwrap_err();

    assert!(matches!(err, RunError::Serialization(_)));
}
