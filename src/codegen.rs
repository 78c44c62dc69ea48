//! Code export.
//!
//! Turns a graph into a LINE-bot JavaScript snippet by templating, never by
//! execution: each block's catalog descriptor supplies a `{{field}}` template
//! that is filled from the block's raw designer data. The output is an export
//! artifact for the designer UI; the simulator never runs it.

use crate::block::catalog;
use crate::graph::BlockGraph;
use serde_json::Map;

/// Renders every block in declaration order and concatenates the snippets.
/// Blocks without a catalog template (flex fragments, placeholders) are
/// skipped.
pub fn generate_code(graph: &BlockGraph) -> String {
    let mut out = String::new();
    for block in graph.blocks_in_order() {
        let subtype = block_subtype(&block.data);
        let Some(descriptor) = catalog::descriptor(block.kind.type_name(), subtype) else {
            continue;
        };
        out.push_str(&fill_template(descriptor.code_template, &block.data));
    }
    out
}

/// The designer subtype key differs per category; try each in turn.
fn block_subtype(data: &Map<String, serde_json::Value>) -> &str {
    for key in ["replyType", "controlType", "contentType"] {
        if let Some(subtype) = data.get(key).and_then(|v| v.as_str()) {
            return subtype;
        }
    }
    ""
}

/// Substitutes `{{field}}` placeholders with designer data values. Unknown
/// fields render as empty strings so a half-filled block still exports.
fn fill_template(template: &str, data: &Map<String, serde_json::Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find("}}") {
            Some(close) => {
                let field = &after[..close];
                if let Some(value) = data.get(field) {
                    out.push_str(&render_value(value));
                }
                rest = &after[close + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
