//! Common test utilities for building designer documents and graphs.
use serde_json::json;
use taiwa::prelude::*;

/// Installs a tracing subscriber; set `RUST_LOG` to see execution logs.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An event block listening for text messages with a `contains` pattern.
#[allow(dead_code)]
pub fn event(id: &str, condition: &str) -> serde_json::Value {
    json!({
        "id": id,
        "blockType": "event",
        "blockData": {
            "eventType": "message.text",
            "condition": condition,
            "matchType": "contains"
        }
    })
}

/// An event block with an explicit match strategy and weight.
#[allow(dead_code)]
pub fn event_with(
    id: &str,
    condition: &str,
    match_type: &str,
    weight: i64,
) -> serde_json::Value {
    json!({
        "id": id,
        "blockType": "event",
        "blockData": {
            "eventType": "message.text",
            "condition": condition,
            "matchType": match_type,
            "weight": weight
        }
    })
}

/// An unconditioned catch-all event block.
#[allow(dead_code)]
pub fn catch_all(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "blockType": "event",
        "blockData": { "eventType": "message.text" }
    })
}

#[allow(dead_code)]
pub fn text_reply(id: &str, text: &str) -> serde_json::Value {
    json!({
        "id": id,
        "blockType": "reply",
        "blockData": { "replyType": "text", "text": text }
    })
}

#[allow(dead_code)]
pub fn flex_reply(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "blockType": "reply",
        "blockData": {
            "replyType": "flex",
            "flexMessageName": name,
            "altText": "Flex Message"
        }
    })
}

#[allow(dead_code)]
pub fn setting(id: &str, variable: &str, value: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "blockType": "setting",
        "blockData": { "variable": variable, "value": value }
    })
}

/// A control block with the given `blockData` fields.
#[allow(dead_code)]
pub fn control(id: &str, data: serde_json::Value) -> serde_json::Value {
    json!({ "id": id, "blockType": "control", "blockData": data })
}

#[allow(dead_code)]
pub fn conn(from: &str, to: &str, kind: &str) -> serde_json::Value {
    json!({ "fromBlockId": from, "toBlockId": to, "connectionType": kind })
}

/// Assembles a designer document and parses it into a typed graph.
#[allow(dead_code)]
pub fn graph(
    blocks: Vec<serde_json::Value>,
    connections: Vec<serde_json::Value>,
) -> BlockGraph {
    let document = json!({ "blocks": blocks, "connections": connections });
    BlockGraph::from_json(&document.to_string()).unwrap()
}

#[allow(dead_code)]
pub fn simulator(
    blocks: Vec<serde_json::Value>,
    connections: Vec<serde_json::Value>,
) -> Simulator {
    Simulator::new(graph(blocks, connections))
}
