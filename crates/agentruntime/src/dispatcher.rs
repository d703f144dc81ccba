use agentcore::{
    Agent, Block, BlockContext, BlockError, BlockType, ExecutionResult, StrategyPlan,
    StrategyRequest, StreamingClient,
};
use std::sync::Arc;

/// Choose the remote strategy for a block.
///
/// `agents` are the block's agents after contextualization, in declared
/// order. Routing needs a flagged router and at least one specialist; without
/// them, and for unknown block types, the block runs sequentially over all
/// of its agents.
pub fn plan_block(block: &Block, agents: &[Agent]) -> StrategyPlan {
    match block.block_type {
        BlockType::Sequential => sequential(agents),
        BlockType::Parallel => StrategyPlan::Parallel {
            agent_names: names(agents),
            aggregator: None,
        },
        BlockType::Routing => match split_router(agents) {
            Some((router, specialists)) => StrategyPlan::Routing {
                specialist_names: names(&specialists),
                router,
                specialists,
            },
            None => {
                tracing::debug!(
                    "Routing block {} has no router or no specialists; running sequentially",
                    block.id
                );
                sequential(agents)
            }
        },
        BlockType::Other => {
            tracing::debug!("Block {} has an unknown type; running sequentially", block.id);
            sequential(agents)
        }
    }
}

fn sequential(agents: &[Agent]) -> StrategyPlan {
    StrategyPlan::Sequential {
        agent_sequence: names(agents),
    }
}

fn names(agents: &[Agent]) -> Vec<String> {
    agents.iter().map(|a| a.name.clone()).collect()
}

/// First flagged router, plus every other agent as a specialist
fn split_router(agents: &[Agent]) -> Option<(Agent, Vec<Agent>)> {
    let router_idx = agents.iter().position(|a| a.is_router)?;
    let specialists: Vec<Agent> = agents
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != router_idx)
        .map(|(_, a)| a.clone())
        .collect();

    if specialists.is_empty() {
        return None;
    }
    Some((agents[router_idx].clone(), specialists))
}

/// Maps blocks onto streaming calls
pub struct BlockDispatcher {
    client: Arc<dyn StreamingClient>,
    model: String,
}

impl BlockDispatcher {
    pub fn new(client: Arc<dyn StreamingClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Run one block and return the service's result for it
    pub async fn dispatch(
        &self,
        block: &Block,
        agents: Vec<Agent>,
        task: String,
        repository: &str,
        ctx: &BlockContext,
    ) -> Result<ExecutionResult, BlockError> {
        let plan = plan_block(block, &agents);
        tracing::info!(
            "Dispatching block {} ({}) via {} strategy",
            block.id,
            block.block_type.as_str(),
            plan.strategy().as_str()
        );

        let request = StrategyRequest {
            task,
            agents,
            plan,
            model: self.model.clone(),
            git_repo: repository.to_string(),
        };

        self.client.stream(request, ctx).await
    }
}
