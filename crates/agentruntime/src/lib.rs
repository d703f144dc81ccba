//! Design execution runtime
//!
//! This crate orders a design's blocks, feeds each block the results of its
//! predecessors, dispatches blocks onto the streaming service strategies and
//! drives a run to one of its terminal states.

mod dispatcher;
mod executor;
mod loader;
mod ordering;
mod propagate;
mod runtime;
mod scope;

pub use dispatcher::{plan_block, BlockDispatcher};
pub use executor::{CyclePolicy, ExecutionCoordinator, RunOutcome, RunReport, RunRequest};
pub use loader::{DesignLoader, FileDesignLoader};
pub use ordering::{build_graph, order_blocks, BlockOrder};
pub use propagate::{compose_task, upstream_context, RunResults, CONTEXT_SEPARATOR};
pub use runtime::{AgentRuntime, RuntimeConfig};
pub use scope::ResourceScope;
