use crate::GraphError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type DesignId = String;
pub type BlockId = String;

/// Complete orchestration design: blocks of agents wired by connections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    pub id: DesignId,
    pub name: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Design {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            blocks: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn add_block(&mut self, block: Block) -> BlockId {
        let id = block.id.clone();
        self.blocks.push(block);
        id
    }

    /// Add a block-level dependency edge
    pub fn connect(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.connections.push(Connection::new(source, target));
    }

    pub fn find_block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Connections that take part in scheduling, in declaration order
    pub fn block_connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(|c| c.is_block_level())
    }

    /// Check block id uniqueness and that every block-level edge points at a
    /// block of this design.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut seen = HashSet::new();
        for block in &self.blocks {
            if !seen.insert(block.id.as_str()) {
                return Err(GraphError::DuplicateBlock(block.id.clone()));
            }
        }

        for conn in self.block_connections() {
            for end in [&conn.source, &conn.target] {
                if !seen.contains(end.as_str()) {
                    return Err(GraphError::UnknownBlock(end.clone()));
                }
            }
        }

        Ok(())
    }
}

/// One node of the orchestration graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub agents: Vec<Agent>,
}

impl Block {
    pub fn new(id: impl Into<String>, block_type: BlockType) -> Self {
        Self {
            id: id.into(),
            block_type,
            name: None,
            agents: Vec::new(),
        }
    }

    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Execution strategy a block declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Sequential,
    Parallel,
    Routing,
    #[serde(other)]
    Other,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Sequential => "sequential",
            BlockType::Parallel => "parallel",
            BlockType::Routing => "routing",
            BlockType::Other => "other",
        }
    }
}

/// A named LLM persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub system_prompt: String,
    /// Marks the router of a routing block
    #[serde(default, alias = "router", skip_serializing_if = "is_false")]
    pub is_router: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Agent {
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: None,
            system_prompt: system_prompt.into(),
            is_router: false,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn router(mut self) -> Self {
        self.is_router = true;
        self
    }
}

/// Directed edge between blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub source: BlockId,
    pub target: BlockId,
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Only untyped or `block` edges carry data dependencies
    pub fn is_block_level(&self) -> bool {
        matches!(self.kind.as_deref(), None | Some("block"))
    }
}
