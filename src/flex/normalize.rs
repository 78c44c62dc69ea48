use super::document::FlexDocument;
use super::generate;
use crate::block::{Block, DesignerBlock};
use crate::graph::BlockGraph;

/// Normalizes any stored Flex representation into a renderable document.
///
/// Accepts, in order of recognition:
/// 1. a raw Flex JSON document (`{"type":"bubble"|"carousel",...}`),
/// 2. a flex-reply wrapper (`{"contents":{...}}`),
/// 3. a designer-format document (`{"blocks":[...]}`),
/// 4. a bare string.
///
/// This function is total: unrecognized or unparseable input degrades to a
/// visible placeholder bubble instead of failing the simulation.
pub fn normalize(input: &serde_json::Value) -> FlexDocument {
    match input {
        serde_json::Value::String(text) => FlexDocument::placeholder(text),
        serde_json::Value::Object(map) => {
            if map.get("type").and_then(|t| t.as_str()) == Some("bubble")
                || map.get("type").and_then(|t| t.as_str()) == Some("carousel")
            {
                match serde_json::from_value::<FlexDocument>(input.clone()) {
                    Ok(document) => return document.ensure_body(),
                    Err(e) => {
                        tracing::debug!("flex document failed to parse, degrading: {e}");
                        return FlexDocument::placeholder(&stringify(input));
                    }
                }
            }
            if let Some(contents) = map.get("contents") {
                return normalize(contents);
            }
            if let Some(blocks) = map.get("blocks").and_then(|b| b.as_array()) {
                return from_designer_blocks(blocks);
            }
            FlexDocument::placeholder(&stringify(input))
        }
        other => FlexDocument::placeholder(&stringify(other)),
    }
}

/// Rebuilds a document from designer-format flex blocks, skipping entries
/// that fail to parse rather than aborting.
fn from_designer_blocks(blocks: &[serde_json::Value]) -> FlexDocument {
    let mut graph = BlockGraph::new();
    let mut ids = Vec::new();
    for raw in blocks {
        let Ok(designer) = serde_json::from_value::<DesignerBlock>(raw.clone()) else {
            tracing::debug!("skipping malformed designer block in flex document");
            continue;
        };
        let Ok(block) = Block::from_designer(&designer) else {
            tracing::debug!(id = %designer.id, "skipping untypable designer block");
            continue;
        };
        if block.kind.is_flex() {
            ids.push(block.id.clone());
            let _ = graph.insert_block(block);
        }
    }
    generate::generate(&graph, &ids)
}

fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
