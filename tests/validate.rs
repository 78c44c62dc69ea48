//! Tests for the validation rule battery and its auto-fix transforms.
mod common;
use serde_json::json;
use taiwa::prelude::*;
use taiwa::validate::IssueCategory;

/// A graph carrying one defect per rule category.
fn defective_graph() -> BlockGraph {
    common::graph(
        vec![
            common::event("ev1", "hi"),
            // Content: empty reply text.
            common::text_reply("r1", ""),
            // Performance: declared bound above the hard cap; also logic,
            // since the loop has no body edge.
            common::control(
                "w1",
                json!({
                    "controlType": "while",
                    "condition": "count < 5",
                    "maxIterations": 5000
                }),
            ),
            // Accessibility: a button with no label.
            json!({
                "id": "btn1",
                "blockType": "flex-content",
                "blockData": {
                    "contentType": "button",
                    "label": "",
                    "actionType": "message",
                    "actionData": "go"
                }
            }),
        ],
        vec![
            common::conn("ev1", "r1", "next"),
            common::conn("r1", "w1", "next"),
            // Structural: edge into a block that does not exist.
            common::conn("w1", "ghost", "next"),
        ],
    )
}

#[test]
fn test_battery_reports_every_category() {
    let issues = validate(&defective_graph());
    for category in [
        IssueCategory::Structural,
        IssueCategory::Logic,
        IssueCategory::Content,
        IssueCategory::Performance,
        IssueCategory::Accessibility,
    ] {
        assert!(
            issues.iter().any(|i| i.category == category),
            "no {} issue reported",
            category
        );
    }
}

#[test]
fn test_battery_is_idempotent() {
    let graph = defective_graph();
    assert_eq!(validate(&graph), validate(&graph));
}

#[test]
fn test_unparseable_condition_is_a_logic_error() {
    let graph = common::graph(
        vec![
            common::event("ev1", "hi"),
            common::control("if1", json!({ "controlType": "if", "condition": "count >" })),
            common::text_reply("r1", "yes"),
        ],
        vec![
            common::conn("ev1", "if1", "next"),
            common::conn("if1", "r1", "then"),
            common::conn("if1", "r1", "else"),
        ],
    );
    let issues = validate(&graph);
    assert!(issues.iter().any(|i| {
        i.category == IssueCategory::Logic
            && i.severity == Severity::Error
            && i.block_id.as_deref() == Some("if1")
    }));
}

#[test]
fn test_auto_fix_gives_if_blocks_a_noop_else_branch() {
    let graph = common::graph(
        vec![
            common::event("ev1", "hi"),
            common::control("if1", json!({ "controlType": "if", "condition": "count > 1" })),
            common::text_reply("r1", "yes"),
        ],
        vec![
            common::conn("ev1", "if1", "next"),
            common::conn("if1", "r1", "then"),
        ],
    );
    assert!(validate(&graph).iter().any(|i| i.auto_fixable));

    let fixed = auto_fix(&graph);
    let else_target = fixed
        .connections
        .target_of("if1", EdgeKind::Else)
        .expect("else branch wired");
    assert!(matches!(
        fixed.block(&else_target).map(|b| &b.kind),
        Some(BlockKind::Placeholder)
    ));
}

#[test]
fn test_auto_fix_clears_every_auto_fixable_issue() {
    let mut graph = common::graph(
        vec![
            common::event("ev1", "hi"),
            common::control("if1", json!({ "controlType": "if", "condition": "count > 1" })),
            common::text_reply("r1", "yes"),
        ],
        vec![
            common::conn("ev1", "if1", "next"),
            common::conn("if1", "r1", "then"),
        ],
    );
    graph
        .connections
        .connect("if1", "ghost", EdgeKind::Next)
        .unwrap();

    let fixed = auto_fix(&graph);
    let leftover: Vec<_> = validate(&fixed).into_iter().filter(|i| i.auto_fixable).collect();
    assert!(leftover.is_empty(), "still auto-fixable: {:?}", leftover);
    // Fixing the fixed graph changes nothing.
    let again = auto_fix(&fixed);
    assert_eq!(again.len(), fixed.len());
    assert_eq!(again.connections.edge_count(), fixed.connections.edge_count());
}
