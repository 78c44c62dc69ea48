//! Unit tests for Flex document generation and normalization.
mod common;
use serde_json::json;
use taiwa::flex::{normalize, FlexComponent, FlexDocument};
use taiwa::graph::BlockGraph;

fn flex_text(id: &str, text: &str) -> serde_json::Value {
    json!({
        "id": id,
        "blockType": "flex-content",
        "blockData": { "contentType": "text", "text": text }
    })
}

fn generate(blocks: Vec<serde_json::Value>) -> FlexDocument {
    let ids: Vec<String> = blocks
        .iter()
        .map(|b| b["id"].as_str().unwrap().to_string())
        .collect();
    let graph = common::graph(blocks, vec![]);
    taiwa::flex::generate(&graph, &ids)
}

fn body_texts(document: &FlexDocument) -> Vec<String> {
    document
        .body_contents()
        .iter()
        .filter_map(|c| match c {
            FlexComponent::Text(t) => Some(t.text.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_generate_text_defaults() {
    let document = generate(vec![flex_text("t1", "Hello")]);
    let FlexDocument::Bubble(bubble) = &document else {
        panic!("expected a bubble");
    };
    let FlexComponent::Text(text) = &bubble.body.contents[0] else {
        panic!("expected a text component");
    };
    assert_eq!(text.text, "Hello");
    assert_eq!(text.color.as_deref(), Some("#000000"));
    assert_eq!(text.size.as_deref(), Some("md"));
    assert_eq!(text.weight.as_deref(), Some("regular"));
    assert_eq!(text.align.as_deref(), Some("start"));
    assert_eq!(text.wrap, Some(true));
}

#[test]
fn test_generate_buckets_by_area() {
    let document = generate(vec![
        json!({
            "id": "h1",
            "blockType": "flex-content",
            "blockData": { "contentType": "text", "text": "Title", "area": "header" }
        }),
        flex_text("b1", "Body line"),
        json!({
            "id": "f1",
            "blockType": "flex-content",
            "blockData": {
                "contentType": "button",
                "label": "Go",
                "actionType": "message",
                "actionData": "go",
                "area": "footer"
            }
        }),
    ]);
    let FlexDocument::Bubble(bubble) = &document else {
        panic!("expected a bubble");
    };
    assert!(bubble.header.is_some());
    assert!(bubble.footer.is_some());
    assert_eq!(body_texts(&document), vec!["Body line"]);
}

#[test]
fn test_generate_hero_image() {
    let document = generate(vec![
        json!({
            "id": "img1",
            "blockType": "flex-content",
            "blockData": {
                "contentType": "image",
                "url": "https://example.com/x.png",
                "area": "hero"
            }
        }),
        flex_text("b1", "caption"),
    ]);
    let FlexDocument::Bubble(bubble) = &document else {
        panic!("expected a bubble");
    };
    let hero = bubble.hero.as_ref().expect("hero image");
    assert_eq!(hero.url, "https://example.com/x.png");
    assert_eq!(hero.size.as_deref(), Some("full"));
}

#[test]
fn test_generate_empty_gets_placeholder_body() {
    let document = generate(vec![]);
    assert_eq!(document.body_contents().len(), 1);
}

#[test]
fn test_generate_carousel_from_container_children() {
    let blocks = vec![
        json!({
            "id": "car",
            "blockType": "flex-container",
            "blockData": { "containerType": "carousel" },
            "children": ["bub1", "bub2"]
        }),
        json!({
            "id": "bub1",
            "blockType": "flex-container",
            "blockData": { "containerType": "bubble" },
            "children": ["t1"]
        }),
        json!({
            "id": "bub2",
            "blockType": "flex-container",
            "blockData": { "containerType": "bubble" },
            "children": ["t2"]
        }),
        flex_text("t1", "first"),
        flex_text("t2", "second"),
    ];
    let ids: Vec<String> = blocks
        .iter()
        .map(|b| b["id"].as_str().unwrap().to_string())
        .collect();
    let graph = common::graph(blocks, vec![]);
    let document = taiwa::flex::generate(&graph, &ids);

    let FlexDocument::Carousel { contents } = &document else {
        panic!("expected a carousel");
    };
    assert_eq!(contents.len(), 2);
    assert!(matches!(&contents[0].body.contents[0], FlexComponent::Text(t) if t.text == "first"));
    assert!(matches!(&contents[1].body.contents[0], FlexComponent::Text(t) if t.text == "second"));
}

#[test]
fn test_normalize_round_trips_generated_documents() {
    let document = generate(vec![flex_text("t1", "a"), flex_text("t2", "b")]);
    let encoded = serde_json::to_value(&document).unwrap();
    let restored = normalize(&encoded);
    assert_eq!(
        restored.body_contents().len(),
        document.body_contents().len()
    );
    assert_eq!(body_texts(&restored), body_texts(&document));
}

#[test]
fn test_normalize_unwraps_contents_wrapper() {
    let document = generate(vec![flex_text("t1", "inner")]);
    let wrapped = json!({
        "type": "flex",
        "altText": "x",
        "contents": serde_json::to_value(&document).unwrap()
    });
    assert_eq!(body_texts(&normalize(&wrapped)), vec!["inner"]);
}

#[test]
fn test_normalize_rebuilds_designer_blocks() {
    let stored = json!({
        "blocks": [
            { "id": "t1", "blockType": "flex-content",
              "blockData": { "contentType": "text", "text": "from designer" } },
            { "id": "bad" },
            { "id": "r1", "blockType": "reply",
              "blockData": { "replyType": "text", "text": "not flex" } }
        ]
    });
    let document = normalize(&stored);
    assert_eq!(body_texts(&document), vec!["from designer"]);
}

#[test]
fn test_normalize_is_total_on_garbage() {
    for input in [
        json!("just a caption"),
        json!(42),
        json!(null),
        json!([1, 2, 3]),
        json!({ "unexpected": true }),
        json!({ "type": "bubble", "body": "not an object" }),
    ] {
        let document = normalize(&input);
        // Whatever comes in, something renderable comes out.
        assert!(!document.body_contents().is_empty());
    }
}

#[test]
fn test_bubble_serialization_shape() {
    let document = generate(vec![flex_text("t1", "hi")]);
    let value = serde_json::to_value(&document).unwrap();
    assert_eq!(value["type"], "bubble");
    assert_eq!(value["body"]["type"], "box");
    assert_eq!(value["body"]["layout"], "vertical");
    assert_eq!(value["body"]["contents"][0]["type"], "text");
    // Unset slots are omitted entirely.
    assert!(value.get("hero").is_none());
}

#[test]
fn test_slot_boxes_and_hero_carry_type_discriminators() {
    let document = generate(vec![
        json!({
            "id": "h1",
            "blockType": "flex-content",
            "blockData": { "contentType": "text", "text": "Title", "area": "header" }
        }),
        json!({
            "id": "img1",
            "blockType": "flex-content",
            "blockData": {
                "contentType": "image",
                "url": "https://example.com/x.png",
                "area": "hero"
            }
        }),
        flex_text("b1", "Body line"),
    ]);
    let value = serde_json::to_value(&document).unwrap();
    assert_eq!(value["header"]["type"], "box");
    assert_eq!(value["hero"]["type"], "image");
    assert_eq!(value["body"]["type"], "box");
    // The injected discriminator survives a round-trip.
    let reparsed: FlexDocument = serde_json::from_value(value).unwrap();
    assert_eq!(reparsed, document);
}

#[test]
fn test_carousel_bubbles_carry_type_discriminators() {
    let document = normalize(&json!({
        "type": "carousel",
        "contents": [
            { "body": { "layout": "vertical", "contents": [{ "type": "text", "text": "a" }] } },
            { "body": { "layout": "vertical", "contents": [{ "type": "text", "text": "b" }] } }
        ]
    }));
    let value = serde_json::to_value(&document).unwrap();
    assert_eq!(value["type"], "carousel");
    assert_eq!(value["contents"][0]["type"], "bubble");
    assert_eq!(value["contents"][1]["type"], "bubble");
    assert_eq!(value["contents"][0]["body"]["type"], "box");
}

#[test]
fn test_graph_parse_rejects_unknown_block_type() {
    let document = json!({
        "blocks": [{ "id": "x", "blockType": "teleport", "blockData": {} }],
        "connections": []
    });
    assert!(BlockGraph::from_json(&document.to_string()).is_err());
}
