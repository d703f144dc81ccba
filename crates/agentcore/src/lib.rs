//! Core abstractions for the agent block engine
//!
//! This crate provides the design model, the run transcript, stream event
//! types, the error taxonomy and the `StreamingClient` seam that the runtime
//! drives. It performs no network I/O.

pub mod client;
mod design;
mod error;
pub mod events;
mod result;
mod status;
mod stream;
mod transcript;

pub use client::{
    BlockContext, ChangeRefresher, NoopRefresher, RunContext, Strategy, StrategyPlan,
    StrategyRequest, StreamingClient,
};
pub use design::{Agent, Block, BlockId, BlockType, Connection, Design, DesignId};
pub use error::{BlockError, GraphError, RunError, StreamProtocolError, TransportError};
pub use events::{EventBus, EventEmitter, ExecutionEvent, RunId};
pub use result::ExecutionResult;
pub use status::{ExecutionStatus, RunPhase};
pub use stream::StreamEvent;
pub use transcript::{MessageId, MessageKind, Transcript, TranscriptChange, TranscriptMessage};

/// Result type for run-level operations
pub type Result<T> = std::result::Result<T, RunError>;
