//! Tests for the code exporter and the static block catalog.
mod common;
use serde_json::json;
use taiwa::block::catalog;
use taiwa::codegen::generate_code;

#[test]
fn test_generate_code_substitutes_template_fields() {
    let graph = common::graph(
        vec![
            common::event("ev1", "price"),
            common::text_reply("r1", "our price is 100"),
            common::setting("s1", "count", json!(42)),
        ],
        vec![common::conn("ev1", "r1", "next")],
    );
    let code = generate_code(&graph);
    assert!(code.contains(r#"// on message.text matching "price""#));
    assert!(code.contains("text: 'our price is 100'"));
    assert!(code.contains("context['count'] = 42;"));
    // Blocks render in declaration order.
    assert!(code.find("// on").unwrap() < code.find("replyMessage").unwrap());
}

#[test]
fn test_generate_code_leaves_unknown_fields_empty() {
    // A catch-all event has no condition; the placeholder renders empty.
    let graph = common::graph(vec![common::catch_all("ev1")], vec![]);
    let code = generate_code(&graph);
    assert!(code.contains(r#"matching """#));
}

#[test]
fn test_generate_code_skips_untemplated_blocks() {
    let graph = common::graph(
        vec![
            json!({
                "id": "t1",
                "blockType": "flex-content",
                "blockData": { "contentType": "text", "text": "decorative" }
            }),
            common::text_reply("r1", "hello"),
        ],
        vec![],
    );
    let code = generate_code(&graph);
    assert!(!code.contains("decorative"));
    assert!(code.contains("text: 'hello'"));
}

#[test]
fn test_catalog_descriptor_lookup() {
    let text = catalog::descriptor("reply", "text").expect("text reply entry");
    assert_eq!(text.label, "Text Reply");
    assert!(text.code_template.contains("{{text}}"));

    // Falls back to the bare-type entry when no subtype template exists.
    let push = catalog::descriptor("push", "text").expect("push fallback entry");
    assert_eq!(push.block_type, "push");

    assert!(catalog::descriptor("flex-content", "text").is_none());
}
