//! The block arena and the directed, typed edge table between blocks.
//!
//! Blocks never hold references to each other; they are stored in an arena
//! keyed by stable id, and connections live in a separate edge list. The
//! sequential-edge subgraph (`next`/`then`/`else`/`loopBody`) is kept acyclic
//! at all times: [`ConnectionManager::connect`] rejects any edge that would
//! close a cycle, so the control-flow machine can trust graph termination.

use crate::block::{Block, BlockKind, DesignerBot};
use crate::error::GraphError;
use crate::validate::{IssueCategory, Severity, ValidationIssue};
use ahash::{AHashMap, AHashSet};
use std::fmt;

/// The closed set of edge kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Next,
    Then,
    Else,
    LoopBody,
    Output,
    Catch,
    Finally,
    /// Branch `i` of a switch block; fan-out is explicit, one edge per case.
    Case(usize),
}

impl EdgeKind {
    /// Sequential kinds participate in the acyclicity invariant.
    pub fn is_sequential(&self) -> bool {
        matches!(
            self,
            EdgeKind::Next | EdgeKind::Then | EdgeKind::Else | EdgeKind::LoopBody
        )
    }

    /// Exclusive kinds allow at most one outgoing edge per source block.
    pub fn is_exclusive(&self) -> bool {
        matches!(
            self,
            EdgeKind::Next
                | EdgeKind::Then
                | EdgeKind::Else
                | EdgeKind::LoopBody
                | EdgeKind::Catch
                | EdgeKind::Finally
        )
    }

    /// Parses a designer connection-type string. `case` edges may carry an
    /// explicit index as `case:2`; a bare `case` is numbered by the caller.
    pub fn parse(s: &str) -> Result<EdgeKind, GraphError> {
        let kind = match s {
            "next" => EdgeKind::Next,
            "then" => EdgeKind::Then,
            "else" => EdgeKind::Else,
            "loopBody" => EdgeKind::LoopBody,
            "output" => EdgeKind::Output,
            "catch" => EdgeKind::Catch,
            "finally" => EdgeKind::Finally,
            "case" => EdgeKind::Case(0),
            other => {
                if let Some(index) = other.strip_prefix("case:") {
                    let index = index
                        .parse()
                        .map_err(|_| GraphError::UnknownEdgeKind(other.to_string()))?;
                    EdgeKind::Case(index)
                } else {
                    return Err(GraphError::UnknownEdgeKind(other.to_string()));
                }
            }
        };
        Ok(kind)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Next => write!(f, "next"),
            EdgeKind::Then => write!(f, "then"),
            EdgeKind::Else => write!(f, "else"),
            EdgeKind::LoopBody => write!(f, "loopBody"),
            EdgeKind::Output => write!(f, "output"),
            EdgeKind::Catch => write!(f, "catch"),
            EdgeKind::Finally => write!(f, "finally"),
            EdgeKind::Case(i) => write!(f, "case:{}", i),
        }
    }
}

/// A directed edge `(from, to, kind)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

/// Owns the edge table. Never executes blocks; its only side effects are on
/// its own edges.
#[derive(Debug, Clone, Default)]
pub struct ConnectionManager {
    /// Outgoing edges per source, in insertion order.
    outgoing: AHashMap<String, Vec<Connection>>,
    edge_count: usize,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Adds an edge, rejecting duplicate exclusive kinds and any edge that
    /// would create a cycle among sequential edges. On error the edge table
    /// is left untouched.
    pub fn connect(&mut self, from: &str, to: &str, kind: EdgeKind) -> Result<(), GraphError> {
        if kind.is_exclusive()
            && self
                .outgoing
                .get(from)
                .is_some_and(|edges| edges.iter().any(|e| e.kind == kind))
        {
            return Err(GraphError::DuplicateEdge {
                from: from.to_string(),
                kind: kind.to_string(),
            });
        }
        if kind.is_sequential() && self.reaches_sequentially(to, from) {
            return Err(GraphError::CycleDetected {
                from: from.to_string(),
                to: to.to_string(),
                kind: kind.to_string(),
            });
        }
        self.outgoing
            .entry(from.to_string())
            .or_default()
            .push(Connection {
                from: from.to_string(),
                to: to.to_string(),
                kind,
            });
        self.edge_count += 1;
        Ok(())
    }

    /// Removes one edge. Returns whether it existed.
    pub fn disconnect(&mut self, from: &str, to: &str, kind: EdgeKind) -> bool {
        let Some(edges) = self.outgoing.get_mut(from) else {
            return false;
        };
        let before = edges.len();
        edges.retain(|e| !(e.to == to && e.kind == kind));
        let removed = before - edges.len();
        self.edge_count -= removed;
        removed > 0
    }

    /// Drops every edge touching `block_id`, both directions. Used when the
    /// editor deletes a block.
    pub fn remove_block_edges(&mut self, block_id: &str) {
        let mut removed = 0;
        if let Some(edges) = self.outgoing.remove(block_id) {
            removed += edges.len();
        }
        for edges in self.outgoing.values_mut() {
            let before = edges.len();
            edges.retain(|e| e.to != block_id);
            removed += before - edges.len();
        }
        self.edge_count -= removed;
    }

    /// Ordered downstream block ids for the given edge kinds (all kinds when
    /// `filter` is `None`). `Case` edges come back sorted by case index.
    pub fn next_blocks(&self, block_id: &str, filter: Option<&[EdgeKind]>) -> Vec<String> {
        let Some(edges) = self.outgoing.get(block_id) else {
            return Vec::new();
        };
        let mut selected: Vec<&Connection> = edges
            .iter()
            .filter(|e| filter.is_none_or(|kinds| kinds.contains(&e.kind)))
            .collect();
        selected.sort_by_key(|e| match e.kind {
            EdgeKind::Case(i) => i,
            _ => 0,
        });
        selected.into_iter().map(|e| e.to.clone()).collect()
    }

    /// The single target of an exclusive edge kind, if wired.
    pub fn target_of(&self, block_id: &str, kind: EdgeKind) -> Option<String> {
        self.outgoing
            .get(block_id)?
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.to.clone())
    }

    pub fn edges(&self) -> impl Iterator<Item = &Connection> {
        self.outgoing.values().flatten()
    }

    /// Depth-first reachability over sequential edges only.
    fn reaches_sequentially(&self, from: &str, target: &str) -> bool {
        if from == target {
            return true;
        }
        let mut seen: AHashSet<&str> = AHashSet::new();
        let mut stack: Vec<&str> = vec![from];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(edges) = self.outgoing.get(current) {
                for edge in edges.iter().filter(|e| e.kind.is_sequential()) {
                    if edge.to == target {
                        return true;
                    }
                    stack.push(&edge.to);
                }
            }
        }
        false
    }
}

/// The block arena plus its connection manager.
#[derive(Debug, Clone, Default)]
pub struct BlockGraph {
    blocks: AHashMap<String, Block>,
    order: Vec<String>,
    pub connections: ConnectionManager,
}

impl BlockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a typed graph from a raw designer document. `case` connections
    /// without an explicit index are numbered per source in declaration order.
    pub fn from_designer(designer: &DesignerBot) -> Result<Self, GraphError> {
        let mut graph = BlockGraph::new();
        for raw in &designer.blocks {
            graph.insert_block(Block::from_designer(raw)?)?;
        }
        let mut case_counters: AHashMap<&str, usize> = AHashMap::new();
        for conn in &designer.connections {
            let mut kind = EdgeKind::parse(&conn.kind)?;
            if conn.kind == "case" {
                let counter = case_counters.entry(conn.from.as_str()).or_insert(0);
                kind = EdgeKind::Case(*counter);
                *counter += 1;
            }
            graph.connections.connect(&conn.from, &conn.to, kind)?;
        }
        Ok(graph)
    }

    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Self::from_designer(&DesignerBot::from_json(json)?)
    }

    pub fn insert_block(&mut self, block: Block) -> Result<(), GraphError> {
        if self.blocks.contains_key(&block.id) {
            return Err(GraphError::DuplicateBlock { id: block.id });
        }
        self.order.push(block.id.clone());
        self.blocks.insert(block.id.clone(), block);
        Ok(())
    }

    pub fn remove_block(&mut self, id: &str) -> Option<Block> {
        let block = self.blocks.remove(id)?;
        self.order.retain(|b| b != id);
        self.connections.remove_block_edges(id);
        Some(block)
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Blocks in declaration order.
    pub fn blocks_in_order(&self) -> impl Iterator<Item = &Block> {
        self.order.iter().filter_map(|id| self.blocks.get(id))
    }

    /// Infers missing `next` edges from declaration order: the first
    /// reply-like block following an event block that has neither an inbound
    /// sequential edge nor a prior claim becomes that event's target.
    ///
    /// This is a documented best-effort heuristic. It never overrides an
    /// explicit edge and only returns proposals; the caller opts in by
    /// passing them back to [`BlockGraph::apply_connections`].
    pub fn auto_connect(&self) -> Vec<Connection> {
        let mut has_inbound: AHashSet<&str> = AHashSet::new();
        for edge in self.connections.edges() {
            if edge.kind.is_sequential() {
                has_inbound.insert(edge.to.as_str());
            }
        }
        let mut proposals = Vec::new();
        let mut claimed: AHashSet<&str> = AHashSet::new();
        for (index, block) in self.blocks_in_order().enumerate() {
            if !block.kind.is_event()
                || self.connections.target_of(&block.id, EdgeKind::Next).is_some()
            {
                continue;
            }
            let candidate = self
                .blocks_in_order()
                .skip(index + 1)
                .find(|b| {
                    b.kind.is_reply_like()
                        && !has_inbound.contains(b.id.as_str())
                        && !claimed.contains(b.id.as_str())
                });
            if let Some(reply) = candidate {
                claimed.insert(reply.id.as_str());
                proposals.push(Connection {
                    from: block.id.clone(),
                    to: reply.id.clone(),
                    kind: EdgeKind::Next,
                });
            }
        }
        proposals
    }

    /// Wires two blocks, checking that both endpoints exist in the arena.
    /// Editor edits go through here; bulk loads that tolerate dangling ids
    /// use the connection manager directly.
    pub fn connect(&mut self, from: &str, to: &str, kind: EdgeKind) -> Result<(), GraphError> {
        for id in [from, to] {
            if !self.blocks.contains_key(id) {
                return Err(GraphError::UnknownBlock { id: id.to_string() });
            }
        }
        self.connections.connect(from, to, kind)
    }

    pub fn apply_connections(&mut self, connections: Vec<Connection>) -> Result<(), GraphError> {
        for conn in connections {
            self.connections.connect(&conn.from, &conn.to, conn.kind)?;
        }
        Ok(())
    }

    /// Structural checks: orphan blocks, dangling edges, and sequential
    /// cycles present in loaded data.
    pub fn validate_structure(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let mut has_inbound: AHashSet<&str> = AHashSet::new();

        for edge in self.connections.edges() {
            has_inbound.insert(edge.to.as_str());
            if !self.blocks.contains_key(&edge.to) {
                issues.push(ValidationIssue {
                    category: IssueCategory::Structural,
                    severity: Severity::Error,
                    block_id: Some(edge.from.clone()),
                    message: format!(
                        "'{}' edge points at missing block '{}'",
                        edge.kind, edge.to
                    ),
                    auto_fixable: true,
                });
            }
            if !self.blocks.contains_key(&edge.from) {
                issues.push(ValidationIssue {
                    category: IssueCategory::Structural,
                    severity: Severity::Error,
                    block_id: Some(edge.from.clone()),
                    message: format!("edge source block '{}' does not exist", edge.from),
                    auto_fixable: true,
                });
            }
        }

        for block in self.blocks_in_order() {
            let is_root = block.kind.is_event();
            let is_flex_child = block.kind.is_flex();
            if !is_root && !is_flex_child && !has_inbound.contains(block.id.as_str()) {
                issues.push(ValidationIssue {
                    category: IssueCategory::Structural,
                    severity: Severity::Warning,
                    block_id: Some(block.id.clone()),
                    message: format!(
                        "block '{}' ({}) has no inbound connection and will never run",
                        block.id,
                        block.kind.type_name()
                    ),
                    auto_fixable: false,
                });
            }
        }

        issues
    }
}
