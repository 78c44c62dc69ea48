//! Unit tests for the connection manager and block graph.
mod common;
use taiwa::error::GraphError;
use taiwa::prelude::*;

#[test]
fn test_connect_and_lookup() {
    let mut manager = ConnectionManager::new();
    manager.connect("a", "b", EdgeKind::Next).unwrap();
    manager.connect("a", "c", EdgeKind::Then).unwrap();

    assert_eq!(manager.edge_count(), 2);
    assert_eq!(manager.target_of("a", EdgeKind::Next), Some("b".to_string()));
    assert_eq!(manager.target_of("a", EdgeKind::Then), Some("c".to_string()));
    assert_eq!(manager.target_of("b", EdgeKind::Next), None);
}

#[test]
fn test_cycle_rejected_and_table_unchanged() {
    let mut manager = ConnectionManager::new();
    manager.connect("a", "b", EdgeKind::Next).unwrap();
    manager.connect("b", "c", EdgeKind::Next).unwrap();

    let result = manager.connect("c", "a", EdgeKind::Next);
    assert!(matches!(result, Err(GraphError::CycleDetected { .. })));

    // The failed connect must leave the table exactly as it was.
    assert_eq!(manager.edge_count(), 2);
    assert_eq!(manager.target_of("c", EdgeKind::Next), None);
    assert_eq!(manager.target_of("a", EdgeKind::Next), Some("b".to_string()));
}

#[test]
fn test_self_loop_rejected() {
    let mut manager = ConnectionManager::new();
    let result = manager.connect("a", "a", EdgeKind::Next);
    assert!(matches!(result, Err(GraphError::CycleDetected { .. })));
    assert_eq!(manager.edge_count(), 0);
}

#[test]
fn test_duplicate_exclusive_edge_rejected() {
    let mut manager = ConnectionManager::new();
    manager.connect("a", "b", EdgeKind::Next).unwrap();
    let result = manager.connect("a", "c", EdgeKind::Next);
    assert!(matches!(result, Err(GraphError::DuplicateEdge { .. })));
    assert_eq!(manager.edge_count(), 1);
}

#[test]
fn test_non_sequential_back_edge_allowed() {
    let mut manager = ConnectionManager::new();
    manager.connect("try1", "risky", EdgeKind::Then).unwrap();
    // Catch edges do not participate in the acyclicity invariant.
    manager.connect("risky", "try1", EdgeKind::Catch).unwrap();
    assert_eq!(manager.edge_count(), 2);
}

#[test]
fn test_case_edges_numbered_and_sorted() {
    // Bare `case` connections are numbered per source in declaration order.
    let graph = common::graph(
        vec![
            common::control(
                "sw",
                serde_json::json!({
                    "controlType": "switch",
                    "switchVariable": "lang",
                    "cases": ["en", "ja"]
                }),
            ),
            common::text_reply("r-en", "Hello"),
            common::text_reply("r-ja", "こんにちは"),
        ],
        vec![
            common::conn("sw", "r-en", "case"),
            common::conn("sw", "r-ja", "case"),
        ],
    );
    assert_eq!(
        graph.connections.target_of("sw", EdgeKind::Case(0)),
        Some("r-en".to_string())
    );
    assert_eq!(
        graph.connections.target_of("sw", EdgeKind::Case(1)),
        Some("r-ja".to_string())
    );
    assert_eq!(
        graph.connections.next_blocks(
            "sw",
            Some(&[EdgeKind::Case(0), EdgeKind::Case(1)])
        ),
        vec!["r-en".to_string(), "r-ja".to_string()]
    );
}

#[test]
fn test_unknown_edge_kind_rejected() {
    assert!(matches!(
        EdgeKind::parse("sideways"),
        Err(GraphError::UnknownEdgeKind(_))
    ));
    assert_eq!(EdgeKind::parse("case:2").unwrap(), EdgeKind::Case(2));
}

#[test]
fn test_duplicate_block_id_rejected() {
    let document = serde_json::json!({
        "blocks": [common::text_reply("r1", "a"), common::text_reply("r1", "b")],
        "connections": []
    });
    let result = BlockGraph::from_json(&document.to_string());
    assert!(matches!(result, Err(GraphError::DuplicateBlock { .. })));
}

#[test]
fn test_graph_connect_requires_existing_blocks() {
    let mut graph = common::graph(
        vec![common::event("ev1", "hi"), common::text_reply("r1", "hello")],
        vec![],
    );
    graph.connect("ev1", "r1", EdgeKind::Next).unwrap();
    assert!(matches!(
        graph.connect("ev1", "ghost", EdgeKind::Then),
        Err(GraphError::UnknownBlock { .. })
    ));
}

#[test]
fn test_remove_block_drops_its_edges() {
    let mut graph = common::graph(
        vec![
            common::event("ev1", "hi"),
            common::text_reply("r1", "hello"),
        ],
        vec![common::conn("ev1", "r1", "next")],
    );
    assert_eq!(graph.connections.edge_count(), 1);
    graph.remove_block("r1");
    assert_eq!(graph.connections.edge_count(), 0);
    assert!(graph.block("r1").is_none());
    assert_eq!(graph.len(), 1);
}

#[test]
fn test_auto_connect_pairs_events_with_following_replies() {
    let graph = common::graph(
        vec![
            common::event("ev1", "a"),
            common::event("ev2", "b"),
            common::text_reply("r1", "one"),
            common::text_reply("r2", "two"),
        ],
        vec![],
    );
    let proposals = graph.auto_connect();
    assert_eq!(proposals.len(), 2);
    assert_eq!((proposals[0].from.as_str(), proposals[0].to.as_str()), ("ev1", "r1"));
    assert_eq!((proposals[1].from.as_str(), proposals[1].to.as_str()), ("ev2", "r2"));
    assert!(proposals.iter().all(|p| p.kind == EdgeKind::Next));
}

#[test]
fn test_auto_connect_never_overrides_explicit_edges() {
    let graph = common::graph(
        vec![
            common::event("ev1", "a"),
            common::text_reply("r1", "one"),
            common::text_reply("r2", "two"),
        ],
        vec![common::conn("ev1", "r2", "next")],
    );
    assert!(graph.auto_connect().is_empty());
}

#[test]
fn test_validate_structure_flags_dangling_edge() {
    let mut graph = common::graph(vec![common::event("ev1", "hi")], vec![]);
    graph.connections.connect("ev1", "ghost", EdgeKind::Next).unwrap();

    let issues = graph.validate_structure();
    assert!(issues.iter().any(|i| {
        i.severity == Severity::Error && i.auto_fixable && i.message.contains("ghost")
    }));
}

#[test]
fn test_validate_structure_flags_orphans() {
    let graph = common::graph(
        vec![common::event("ev1", "hi"), common::text_reply("r1", "hello")],
        vec![],
    );
    let issues = graph.validate_structure();
    // The reply is unreachable; the event is a legitimate root.
    assert!(issues.iter().any(|i| i.block_id.as_deref() == Some("r1")));
    assert!(!issues.iter().any(|i| i.block_id.as_deref() == Some("ev1")));
}

#[test]
fn test_auto_fix_prunes_dangling_and_wires_events() {
    let mut graph = common::graph(
        vec![common::event("ev1", "hi"), common::text_reply("r1", "hello")],
        vec![],
    );
    graph.connections.connect("ev1", "ghost", EdgeKind::Then).unwrap();

    let fixed = auto_fix(&graph);
    assert_eq!(fixed.connections.target_of("ev1", EdgeKind::Then), None);
    assert_eq!(
        fixed.connections.target_of("ev1", EdgeKind::Next),
        Some("r1".to_string())
    );
    // Idempotent: fixing the fixed graph changes nothing.
    let again = auto_fix(&fixed);
    assert_eq!(again.connections.edge_count(), fixed.connections.edge_count());
}
