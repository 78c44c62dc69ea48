//! Static validation of the block graph.
//!
//! A fixed battery of rule categories runs over the blocks and connections
//! and returns advisory issues. The validator is pure and idempotent:
//! running it twice on the same graph yields the same issue list. A subset
//! of issues is auto-fixable through [`auto_fix`], a pure transform the
//! caller may apply.

use crate::block::{Block, BlockKind, ControlSpec, FlexContentKind, ReplySpec, WaitSpec};
use crate::condition::Condition;
use crate::flow::MAX_LOOP_ITERATIONS;
use crate::graph::{BlockGraph, EdgeKind};
use crate::matcher::MatchStrategy;
use std::fmt;

/// LINE rejects text messages longer than this.
const MAX_TEXT_LEN: usize = 2000;
/// Above this many blocks the editor becomes sluggish; flagged as advisory.
const LARGE_GRAPH_THRESHOLD: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCategory {
    Structural,
    Logic,
    Content,
    Performance,
    Accessibility,
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssueCategory::Structural => "structural",
            IssueCategory::Logic => "logic",
            IssueCategory::Content => "content",
            IssueCategory::Performance => "performance",
            IssueCategory::Accessibility => "accessibility",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One finding, consumed by the editor and by simulation gating policies.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub category: IssueCategory,
    pub severity: Severity,
    pub block_id: Option<String>,
    pub message: String,
    pub auto_fixable: bool,
}

/// Runs the full rule battery.
pub fn validate(graph: &BlockGraph) -> Vec<ValidationIssue> {
    let mut issues = graph.validate_structure();
    logic_rules(graph, &mut issues);
    content_rules(graph, &mut issues);
    performance_rules(graph, &mut issues);
    accessibility_rules(graph, &mut issues);
    issues
}

fn logic_rules(graph: &BlockGraph, issues: &mut Vec<ValidationIssue>) {
    for block in graph.blocks_in_order() {
        match &block.kind {
            BlockKind::Control(spec) => {
                check_control(graph, &block.id, spec, issues);
            }
            BlockKind::Event(event) => {
                if event.strategy == MatchStrategy::Regex {
                    if let Some(pattern) = &event.condition {
                        if let Err(e) = regex::Regex::new(pattern) {
                            issues.push(ValidationIssue {
                                category: IssueCategory::Logic,
                                severity: Severity::Error,
                                block_id: Some(block.id.clone()),
                                message: format!("invalid regex pattern '{}': {}", pattern, e),
                                auto_fixable: false,
                            });
                        }
                    }
                }
                if graph
                    .connections
                    .target_of(&block.id, EdgeKind::Next)
                    .is_none()
                {
                    issues.push(ValidationIssue {
                        category: IssueCategory::Logic,
                        severity: Severity::Warning,
                        block_id: Some(block.id.clone()),
                        message: format!("event block '{}' has no reply wired to it", block.id),
                        auto_fixable: true,
                    });
                }
            }
            _ => {}
        }
    }
}

fn check_control(
    graph: &BlockGraph,
    block_id: &str,
    spec: &ControlSpec,
    issues: &mut Vec<ValidationIssue>,
) {
    let condition = match spec {
        ControlSpec::If { condition } => Some(condition),
        ControlSpec::While { condition, .. } => Some(condition),
        ControlSpec::Wait(WaitSpec::Condition { condition, .. }) => Some(condition),
        _ => None,
    };
    if let Some(condition) = condition {
        if let Err(e) = Condition::parse(condition) {
            issues.push(ValidationIssue {
                category: IssueCategory::Logic,
                severity: Severity::Error,
                block_id: Some(block_id.to_string()),
                message: e.to_string(),
                auto_fixable: false,
            });
        }
    }

    match spec {
        ControlSpec::If { .. } => {
            if graph.connections.target_of(block_id, EdgeKind::Then).is_none() {
                issues.push(ValidationIssue {
                    category: IssueCategory::Logic,
                    severity: Severity::Error,
                    block_id: Some(block_id.to_string()),
                    message: format!("if block '{}' has no 'then' branch", block_id),
                    auto_fixable: false,
                });
            }
            if graph.connections.target_of(block_id, EdgeKind::Else).is_none() {
                // A missing else defaults to a no-op, which is acceptable;
                // flagged so the designer sees the fall-through.
                issues.push(ValidationIssue {
                    category: IssueCategory::Logic,
                    severity: Severity::Warning,
                    block_id: Some(block_id.to_string()),
                    message: format!(
                        "if block '{}' has no 'else' branch; non-matching flow does nothing",
                        block_id
                    ),
                    auto_fixable: true,
                });
            }
        }
        ControlSpec::While { .. } | ControlSpec::For { .. } => {
            if graph
                .connections
                .target_of(block_id, EdgeKind::LoopBody)
                .is_none()
            {
                issues.push(ValidationIssue {
                    category: IssueCategory::Logic,
                    severity: Severity::Error,
                    block_id: Some(block_id.to_string()),
                    message: format!("loop block '{}' has no body", block_id),
                    auto_fixable: false,
                });
            }
        }
        ControlSpec::Switch { cases, .. } => {
            if cases.is_empty() {
                issues.push(ValidationIssue {
                    category: IssueCategory::Logic,
                    severity: Severity::Warning,
                    block_id: Some(block_id.to_string()),
                    message: format!("switch block '{}' declares no cases", block_id),
                    auto_fixable: false,
                });
            }
        }
        _ => {}
    }
}

fn content_rules(graph: &BlockGraph, issues: &mut Vec<ValidationIssue>) {
    for block in graph.blocks_in_order() {
        let spec = match &block.kind {
            BlockKind::Reply(spec) | BlockKind::Push(spec) => spec,
            _ => continue,
        };
        match spec {
            ReplySpec::Text { text } => {
                if text.trim().is_empty() {
                    issues.push(ValidationIssue {
                        category: IssueCategory::Content,
                        severity: Severity::Warning,
                        block_id: Some(block.id.clone()),
                        message: format!("reply block '{}' has empty text", block.id),
                        auto_fixable: false,
                    });
                } else if text.chars().count() > MAX_TEXT_LEN {
                    issues.push(ValidationIssue {
                        category: IssueCategory::Content,
                        severity: Severity::Error,
                        block_id: Some(block.id.clone()),
                        message: format!(
                            "reply block '{}' exceeds the {}-character text limit",
                            block.id, MAX_TEXT_LEN
                        ),
                        auto_fixable: false,
                    });
                }
            }
            ReplySpec::Flex { name, inline, .. } => {
                if name.is_none() && inline.is_none() {
                    issues.push(ValidationIssue {
                        category: IssueCategory::Content,
                        severity: Severity::Warning,
                        block_id: Some(block.id.clone()),
                        message: format!(
                            "flex reply '{}' names no document; the designer contents or a placeholder will be used",
                            block.id
                        ),
                        auto_fixable: false,
                    });
                }
            }
            _ => {}
        }
    }
}

fn performance_rules(graph: &BlockGraph, issues: &mut Vec<ValidationIssue>) {
    if graph.len() > LARGE_GRAPH_THRESHOLD {
        issues.push(ValidationIssue {
            category: IssueCategory::Performance,
            severity: Severity::Warning,
            block_id: None,
            message: format!(
                "graph has {} blocks; above {} the editor may become slow",
                graph.len(),
                LARGE_GRAPH_THRESHOLD
            ),
            auto_fixable: false,
        });
    }
    for block in graph.blocks_in_order() {
        if let BlockKind::Control(ControlSpec::While { max_iterations, .. }) = &block.kind {
            if *max_iterations > MAX_LOOP_ITERATIONS {
                issues.push(ValidationIssue {
                    category: IssueCategory::Performance,
                    severity: Severity::Warning,
                    block_id: Some(block.id.clone()),
                    message: format!(
                        "while block '{}' declares {} iterations; execution caps at {}",
                        block.id, max_iterations, MAX_LOOP_ITERATIONS
                    ),
                    auto_fixable: false,
                });
            }
        }
    }
}

fn accessibility_rules(graph: &BlockGraph, issues: &mut Vec<ValidationIssue>) {
    let mut has_flex_text = false;
    let mut image_blocks = Vec::new();
    for block in graph.blocks_in_order() {
        if let BlockKind::FlexContent(spec) = &block.kind {
            match &spec.content {
                FlexContentKind::Text { .. } => has_flex_text = true,
                FlexContentKind::Image { .. } => image_blocks.push(block.id.clone()),
                FlexContentKind::Button { label, .. } => {
                    if label.trim().is_empty() {
                        issues.push(ValidationIssue {
                            category: IssueCategory::Accessibility,
                            severity: Severity::Warning,
                            block_id: Some(block.id.clone()),
                            message: format!("button block '{}' has no label", block.id),
                            auto_fixable: false,
                        });
                    }
                }
                _ => {}
            }
        }
    }
    if !has_flex_text {
        for id in image_blocks {
            issues.push(ValidationIssue {
                category: IssueCategory::Accessibility,
                severity: Severity::Warning,
                block_id: Some(id.clone()),
                message: format!(
                    "image block '{}' has no accompanying text for screen readers",
                    id
                ),
                auto_fixable: false,
            });
        }
    }
}

/// Applies the pure auto-fix transforms: prunes edges that point at missing
/// blocks, wires unconnected event blocks via the auto-connect heuristic,
/// and gives if blocks without an `else` branch an explicit no-op target.
/// Running it on an already-fixed graph changes nothing.
pub fn auto_fix(graph: &BlockGraph) -> BlockGraph {
    let mut fixed = graph.clone();

    let dangling: Vec<_> = fixed
        .connections
        .edges()
        .filter(|edge| fixed.block(&edge.to).is_none() || fixed.block(&edge.from).is_none())
        .cloned()
        .collect();
    for edge in dangling {
        fixed.connections.disconnect(&edge.from, &edge.to, edge.kind);
    }

    let proposals = fixed.auto_connect();
    for conn in proposals {
        // Heuristic proposals are best-effort; skip any one the live edge
        // table now rejects.
        let _ = fixed.connections.connect(&conn.from, &conn.to, conn.kind);
    }

    let missing_else: Vec<String> = fixed
        .blocks_in_order()
        .filter(|b| {
            matches!(b.kind, BlockKind::Control(ControlSpec::If { .. }))
                && fixed.connections.target_of(&b.id, EdgeKind::Else).is_none()
        })
        .map(|b| b.id.clone())
        .collect();
    for block_id in missing_else {
        let mut noop_id = format!("{}-else", block_id);
        while fixed.block(&noop_id).is_some() {
            noop_id.push('-');
        }
        let noop = Block {
            id: noop_id.clone(),
            kind: BlockKind::Placeholder,
            children: Vec::new(),
            data: serde_json::Map::new(),
        };
        if fixed.insert_block(noop).is_ok() {
            let _ = fixed.connections.connect(&block_id, &noop_id, EdgeKind::Else);
        }
    }
    fixed
}
