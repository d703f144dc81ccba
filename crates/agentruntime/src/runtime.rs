use crate::executor::{CyclePolicy, ExecutionCoordinator, RunReport, RunRequest};
use crate::loader::DesignLoader;
use agentcore::{
    ChangeRefresher, Design, DesignId, EventBus, NoopRefresher, RunContext, RunError, RunId,
    StreamingClient,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Main runtime for executing designs
pub struct AgentRuntime {
    coordinator: Arc<ExecutionCoordinator>,
    event_bus: Arc<EventBus>,
    designs: Arc<RwLock<HashMap<DesignId, Design>>>,
    refresher: Arc<dyn ChangeRefresher>,
}

impl AgentRuntime {
    /// Create a new runtime with default settings
    pub fn new(client: Arc<dyn StreamingClient>) -> Self {
        Self::with_config(client, RuntimeConfig::default())
    }

    /// Create a new runtime with custom configuration
    pub fn with_config(client: Arc<dyn StreamingClient>, config: RuntimeConfig) -> Self {
        let coordinator = ExecutionCoordinator::new(client, config.model.clone())
            .with_cycle_policy(config.cycle_policy);

        Self {
            coordinator: Arc::new(coordinator),
            event_bus: Arc::new(EventBus::new(config.event_buffer_size)),
            designs: Arc::new(RwLock::new(HashMap::new())),
            refresher: Arc::new(NoopRefresher),
        }
    }

    /// Install the pending-change refresh hook
    pub fn with_refresher(mut self, refresher: Arc<dyn ChangeRefresher>) -> Self {
        self.refresher = refresher;
        self
    }

    /// Register a design
    pub async fn register_design(&self, design: Design) {
        let mut designs = self.designs.write().await;
        designs.insert(design.id.clone(), design);
    }

    /// Load a design through `loader` and register it
    pub async fn load_design(
        &self,
        loader: &dyn DesignLoader,
        design_id: &str,
    ) -> Result<(), RunError> {
        let design = loader.load(design_id).await?;
        self.register_design(design).await;
        Ok(())
    }

    /// Execute a registered design by ID
    pub async fn execute_design(
        &self,
        design_id: &str,
        request: RunRequest,
        cancellation: CancellationToken,
    ) -> Result<RunReport, RunError> {
        let design = {
            let designs = self.designs.read().await;
            designs
                .get(design_id)
                .cloned()
                .ok_or_else(|| RunError::DesignNotFound(design_id.to_string()))?
        };

        Ok(self.execute(&design, request, cancellation).await)
    }

    /// Execute a design directly (without registration)
    pub async fn execute(
        &self,
        design: &Design,
        request: RunRequest,
        cancellation: CancellationToken,
    ) -> RunReport {
        let ctx = self.run_context(cancellation);
        self.coordinator.execute(design, request, ctx).await
    }

    /// Fresh context for a run, wired to this runtime's bus and hook
    pub fn run_context(&self, cancellation: CancellationToken) -> RunContext {
        let events = self.event_bus.create_emitter(RunId::new_v4());
        RunContext::new(events, cancellation).with_refresher(self.refresher.clone())
    }

    /// Subscribe to execution events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<agentcore::ExecutionEvent> {
        self.event_bus.subscribe()
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Model name forwarded with every request
    pub model: String,
    pub cycle_policy: CyclePolicy,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            cycle_policy: CyclePolicy::Reject,
            event_buffer_size: 1000,
        }
    }
}
