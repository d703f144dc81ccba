use crate::decoder::EventLineDecoder;
use crate::folder::{Fold, StreamFolder};
use agentcore::{
    BlockContext, BlockError, ExecutionResult, Strategy, StrategyRequest, StreamingClient,
    TransportError,
};
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;

/// Connection settings for the streaming service
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL; strategy paths are appended to it
    pub base_url: String,
    pub token: Option<String>,
    pub connect_timeout: Duration,
    /// Whole-request limit; `None` lets long streams run
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/agents".to_string(),
            token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

/// `StreamingClient` backed by the remote HTTP service
pub struct HttpStreamingClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpStreamingClient {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to build HTTP client: {}", e)))?;

        if config.token.is_none() {
            tracing::warn!("No access token configured; requests are sent without authorization");
        }

        Ok(Self { client, config })
    }

    pub fn endpoint(&self, strategy: Strategy) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            strategy.path()
        )
    }

    async fn open(
        &self,
        request: &StrategyRequest,
        ctx: &BlockContext,
    ) -> Result<reqwest::Response, BlockError> {
        let url = self.endpoint(request.strategy());
        tracing::debug!("POST {} for block {}", url, ctx.block_id);

        let mut req = self.client.post(&url).json(request);
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token);
        }

        let response = tokio::select! {
            response = req.send() => response
                .map_err(|e| TransportError::Request(format!("HTTP request failed: {}", e)))?,
            _ = ctx.cancellation().cancelled() => return Err(BlockError::Cancelled),
        };

        let status = response.status();
        if !status.is_success() {
            tracing::error!("{} responded with {}", url, status);
            return Err(TransportError::BadStatus(status.as_u16()).into());
        }
        if response.content_length() == Some(0) {
            return Err(TransportError::NoBody.into());
        }

        Ok(response)
    }
}

#[async_trait]
impl StreamingClient for HttpStreamingClient {
    async fn stream(
        &self,
        request: StrategyRequest,
        ctx: &BlockContext,
    ) -> Result<ExecutionResult, BlockError> {
        let response = self.open(&request, ctx).await?;

        let mut body = response.bytes_stream();
        let mut decoder = EventLineDecoder::new();
        let mut folder = StreamFolder::new(ctx);

        loop {
            let next = tokio::select! {
                next = body.next() => next,
                _ = ctx.cancellation().cancelled() => {
                    tracing::info!("Stream for block {} cancelled", ctx.block_id);
                    return Err(BlockError::Cancelled);
                }
            };

            let (events, done) = match next {
                Some(Ok(bytes)) => (decoder.feed(&bytes), false),
                Some(Err(e)) => {
                    return Err(TransportError::Request(format!("Stream read failed: {}", e)).into())
                }
                None => (decoder.finish(), true),
            };

            for event in events {
                match event {
                    Ok(event) => {
                        if let Fold::Failed(message) = folder.apply(event).await {
                            tracing::error!("Block {} failed remotely: {}", ctx.block_id, message);
                            return Err(BlockError::Remote(message));
                        }
                    }
                    Err(e) => tracing::warn!("Skipping stream line: {}", e),
                }
            }

            if done {
                break;
            }
        }

        Ok(folder.finish().await)
    }
}
