//! Streaming client tests against a mock agent service.

use agentcore::{
    Agent, Block, BlockContext, BlockError, BlockType, Design, EventBus, ExecutionResult,
    MessageKind, RunContext, RunId, StrategyPlan, StrategyRequest, StreamingClient,
    TransportError,
};
use agentruntime::{AgentRuntime, RunOutcome, RunRequest};
use agentstream::{ClientConfig, HttpStreamingClient};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse(events: &[Value]) -> String {
    events
        .iter()
        .map(|event| format!("data: {}\n\n", event))
        .collect()
}

fn stream_response(events: &[Value]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(sse(events), "text/event-stream")
}

fn client(server: &MockServer, token: Option<&str>) -> HttpStreamingClient {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let config = ClientConfig::new(format!("{}/api/agents", server.uri()))
        .with_token(token.map(str::to_string));
    HttpStreamingClient::new(config).unwrap()
}

fn block_ctx(cancellation: CancellationToken) -> BlockContext {
    let bus = EventBus::new(256);
    RunContext::new(bus.create_emitter(RunId::new_v4()), cancellation).for_block("b1")
}

fn sequential_request(agents: &[&str]) -> StrategyRequest {
    StrategyRequest {
        task: "Summarize the changelog".to_string(),
        agents: agents.iter().map(|name| Agent::new(*name, "Be brief.")).collect(),
        plan: StrategyPlan::Sequential {
            agent_sequence: agents.iter().map(|name| name.to_string()).collect(),
        },
        model: "gpt-4o".to_string(),
        git_repo: String::new(),
    }
}

#[tokio::test]
async fn test_chunks_merge_and_complete_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agents/sequential/stream"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_partial_json(json!({
            "agent_sequence": ["A", "B"],
            "model": "gpt-4o"
        })))
        .respond_with(stream_response(&[
            json!({"type": "status", "agent": "A", "data": "thinking"}),
            json!({"type": "chunk", "agent": "A", "data": "foo"}),
            json!({"type": "chunk", "agent": "A", "data": "bar"}),
            json!({"type": "status", "agent": "A", "data": "completed"}),
            json!({"type": "chunk", "agent": "B", "data": "baz"}),
            json!({"type": "complete", "data": {"final_result": "done"}}),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = block_ctx(CancellationToken::new());
    let result = client(&server, Some("tok-1"))
        .stream(sequential_request(&["A", "B"]), &ctx)
        .await
        .unwrap();

    assert_eq!(result, ExecutionResult::Final("done".into()));

    let transcript = ctx.run.transcript.read().await;
    let msgs = transcript.messages();
    assert_eq!(msgs.len(), 3);
    assert_eq!(msgs[0].content, "foobar");
    assert!(msgs[0].completed);
    assert_eq!(msgs[1].agent.as_deref(), Some("B"));
    assert_eq!(msgs[1].content, "baz");
    assert_eq!(msgs[2].kind, MessageKind::System);
    assert_eq!(msgs[2].content, "Block b1 completed successfully.");
}

#[tokio::test]
async fn test_bad_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agents/sequential/stream"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let ctx = block_ctx(CancellationToken::new());
    let err = client(&server, Some("tok"))
        .stream(sequential_request(&["A"]), &ctx)
        .await
        .unwrap_err();

    assert_eq!(err, BlockError::Transport(TransportError::BadStatus(503)));
}

#[tokio::test]
async fn test_empty_body_is_no_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agents/sequential/stream"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let ctx = block_ctx(CancellationToken::new());
    let err = client(&server, Some("tok"))
        .stream(sequential_request(&["A"]), &ctx)
        .await
        .unwrap_err();

    assert_eq!(err, BlockError::Transport(TransportError::NoBody));
}

#[tokio::test]
async fn test_error_event_is_remote_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agents/sequential/stream"))
        .respond_with(stream_response(&[
            json!({"type": "chunk", "agent": "A", "data": "partial"}),
            json!({"type": "error", "error": "rate limited"}),
            json!({"type": "chunk", "agent": "A", "data": " never seen"}),
        ]))
        .mount(&server)
        .await;

    let ctx = block_ctx(CancellationToken::new());
    let err = client(&server, Some("tok"))
        .stream(sequential_request(&["A"]), &ctx)
        .await
        .unwrap_err();

    assert_eq!(err, BlockError::Remote("rate limited".into()));
    assert_eq!(ctx.run.transcript.read().await.messages()[0].content, "partial");
}

#[tokio::test]
async fn test_structured_error_event_is_remote_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agents/sequential/stream"))
        .respond_with(stream_response(&[
            json!({"type": "chunk", "agent": "A", "data": "partial"}),
            json!({"type": "error", "error": {"message": "quota exceeded"}}),
        ]))
        .mount(&server)
        .await;

    let ctx = block_ctx(CancellationToken::new());
    let err = client(&server, Some("tok"))
        .stream(sequential_request(&["A"]), &ctx)
        .await
        .unwrap_err();

    assert_eq!(err, BlockError::Remote("quota exceeded".into()));
}

#[tokio::test]
async fn test_stream_without_complete_yields_last_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agents/sequential/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            // Malformed line and a trailing event without newline
            "data: {broken\ndata: {\"type\":\"chunk\",\"agent\":\"A\",\"data\":\"tail\"}",
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let ctx = block_ctx(CancellationToken::new());
    let result = client(&server, Some("tok"))
        .stream(sequential_request(&["A"]), &ctx)
        .await
        .unwrap();

    assert_eq!(result, ExecutionResult::Raw("tail".into()));
}

#[tokio::test]
async fn test_missing_token_omits_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agents/sequential/stream"))
        .respond_with(stream_response(&[
            json!({"type": "complete", "data": {"result": "ok"}}),
        ]))
        .mount(&server)
        .await;

    let ctx = block_ctx(CancellationToken::new());
    let result = client(&server, None)
        .stream(sequential_request(&["A"]), &ctx)
        .await
        .unwrap();
    assert_eq!(result, ExecutionResult::Intermediate("ok".into()));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_cancel_while_waiting_for_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agents/sequential/stream"))
        .respond_with(
            stream_response(&[json!({"type": "complete"})]).set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let ctx = block_ctx(token.clone());
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        client(&server, Some("tok")).stream(sequential_request(&["A"]), &ctx),
    )
    .await
    .expect("stream should stop once cancelled")
    .unwrap_err();

    assert_eq!(err, BlockError::Cancelled);
    canceller.await.unwrap();
}

#[tokio::test]
async fn test_runtime_over_http_with_routing_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agents/parallel/stream"))
        .and(body_partial_json(json!({"agent_names": ["alpha", "beta"]})))
        .respond_with(stream_response(&[
            json!({"type": "chunk", "agent": "alpha", "data": "research notes"}),
            json!({"type": "complete", "data": {"final_result": "notes"}}),
        ]))
        .expect(1)
        .mount(&server)
        .await;
    // No agent is flagged as router, so the routing block runs sequentially
    Mock::given(method("POST"))
        .and(path("/api/agents/sequential/stream"))
        .and(body_partial_json(json!({"agent_sequence": ["triage", "fixer"]})))
        .respond_with(stream_response(&[
            json!({"type": "complete", "data": {"final_result": "fixed"}}),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let mut design = Design::new("triage", "Triage");
    design.add_block(
        Block::new("research", BlockType::Parallel)
            .with_agent(Agent::new("alpha", "Look."))
            .with_agent(Agent::new("beta", "Look again.")),
    );
    design.add_block(
        Block::new("route", BlockType::Routing)
            .with_agent(Agent::new("triage", "Pick.").with_role("router"))
            .with_agent(Agent::new("fixer", "Fix.")),
    );
    design.connect("research", "route");

    let runtime = AgentRuntime::new(Arc::new(client(&server, Some("tok"))));
    let report = runtime
        .execute(&design, RunRequest::new("Fix the bug", "scope-1"), CancellationToken::new())
        .await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.order, vec!["research", "route"]);
    assert_eq!(report.results.get("route"), Some(&ExecutionResult::Final("fixed".into())));

    let requests = server.received_requests().await.unwrap();
    let second: Value = serde_json::from_slice(&requests[1].body).unwrap();
    let task = second["task"].as_str().unwrap();
    assert!(task.contains("Results from previous blocks:"));
    assert!(task.contains("notes"));
}
