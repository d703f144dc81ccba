use thiserror::Error;

/// Errors raised while validating or ordering a design's block graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("No executable blocks: every block waits on another block")]
    NoExecutableBlocks,

    #[error("Cyclic dependency among blocks: {}", blocks.join(", "))]
    CycleDetected { blocks: Vec<String> },

    #[error("Duplicate block id: {0}")]
    DuplicateBlock(String),

    #[error("Connection references unknown block: {0}")]
    UnknownBlock(String),
}

/// Failures talking to the streaming completion service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Service responded with HTTP {0}")]
    BadStatus(u16),

    #[error("Service response has no readable body")]
    NoBody,

    #[error("Request failed: {0}")]
    Request(String),
}

/// A single stream line that could not be decoded. Never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamProtocolError {
    #[error("Malformed stream event: {reason} (line: {line})")]
    MalformedEvent { line: String, reason: String },
}

/// Outcome of a single block execution that did not produce a result
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Remote(String),

    #[error("Cancelled")]
    Cancelled,
}

/// Errors that fail a whole run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Transport error in block {block_id}: {source}")]
    Transport {
        block_id: String,
        #[source]
        source: TransportError,
    },

    #[error("Block {block_id} failed: {message}")]
    Remote { block_id: String, message: String },

    #[error("Design not found: {0}")]
    DesignNotFound(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RunError {
    /// Attribute a block failure to the block that raised it.
    ///
    /// Returns `None` for cancellation, which is not a run failure.
    pub fn from_block(block_id: impl Into<String>, error: BlockError) -> Option<Self> {
        let block_id = block_id.into();
        match error {
            BlockError::Transport(source) => Some(RunError::Transport { block_id, source }),
            BlockError::Remote(message) => Some(RunError::Remote { block_id, message }),
            BlockError::Cancelled => None,
        }
    }
}

impl From<std::io::Error> for RunError {
    fn from(err: std::io::Error) -> Self {
        RunError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RunError {
    fn from(err: serde_json::Error) -> Self {
        RunError::Serialization(err.to_string())
    }
}
