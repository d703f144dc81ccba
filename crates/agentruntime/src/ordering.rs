use agentcore::{Block, BlockId, Connection};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, VecDeque};

/// Execution order computed for a design
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockOrder {
    /// Blocks in the order they run
    pub order: Vec<BlockId>,
    /// Blocks stuck in or behind a cycle, in declaration order
    pub unreached: Vec<BlockId>,
}

impl BlockOrder {
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// True when every block got a position
    pub fn is_complete(&self) -> bool {
        self.unreached.is_empty()
    }
}

/// Build the block dependency graph. Node indices follow declaration order.
pub fn build_graph(
    blocks: &[Block],
    connections: &[Connection],
) -> (DiGraph<BlockId, ()>, HashMap<BlockId, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut block_to_index = HashMap::new();

    for block in blocks {
        let idx = graph.add_node(block.id.clone());
        block_to_index.entry(block.id.clone()).or_insert(idx);
    }

    for conn in connections.iter().filter(|c| c.is_block_level()) {
        let (Some(from_idx), Some(to_idx)) = (
            block_to_index.get(&conn.source),
            block_to_index.get(&conn.target),
        ) else {
            tracing::warn!(
                "Ignoring connection {} -> {}: unknown block",
                conn.source,
                conn.target
            );
            continue;
        };
        graph.add_edge(*from_idx, *to_idx, ());
    }

    (graph, block_to_index)
}

/// Order blocks with Kahn's algorithm.
///
/// Roots are seeded in declaration order and successors are released in
/// connection order, so ties never depend on block ids.
pub fn order_blocks(blocks: &[Block], connections: &[Connection]) -> BlockOrder {
    let (graph, _) = build_graph(blocks, connections);

    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|idx| graph.edges_directed(idx, Direction::Incoming).count())
        .collect();

    let mut queue: VecDeque<NodeIndex> = graph
        .node_indices()
        .filter(|idx| in_degree[idx.index()] == 0)
        .collect();

    let mut placed = vec![false; graph.node_count()];
    let mut order = Vec::with_capacity(graph.node_count());

    while let Some(idx) = queue.pop_front() {
        placed[idx.index()] = true;
        order.push(graph[idx].clone());

        let mut successors: Vec<_> = graph.edges_directed(idx, Direction::Outgoing).collect();
        successors.sort_by_key(|edge| edge.id().index());

        for edge in successors {
            let target = edge.target();
            in_degree[target.index()] -= 1;
            if in_degree[target.index()] == 0 {
                queue.push_back(target);
            }
        }
    }

    let unreached = graph
        .node_indices()
        .filter(|idx| !placed[idx.index()])
        .map(|idx| graph[idx].clone())
        .collect();

    BlockOrder { order, unreached }
}
