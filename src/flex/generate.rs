use super::document::{
    FlexAction, FlexBox, FlexBubble, FlexButton, FlexComponent, FlexDocument, FlexImage,
    FlexSeparator, FlexSpacer, FlexText,
};
use crate::block::{
    Block, BlockKind, BoxLayout, ContainerKind, ContentSpec, FlexArea, FlexContentKind,
};
use crate::graph::BlockGraph;

/// Builds a Flex document from the graph's flex-* blocks.
///
/// Content blocks are bucketed by their `area` tag (body by default).
/// Every omitted styling field gets an explicit, documented default:
/// text renders `md`/`regular`/`start`-aligned in `#000000` with wrapping
/// on; images render `full` size. A carousel container turns its bubble
/// children into a carousel; otherwise a single bubble is assembled.
pub fn generate(graph: &BlockGraph, block_ids: &[String]) -> FlexDocument {
    let blocks: Vec<&Block> = block_ids.iter().filter_map(|id| graph.block(id)).collect();

    if let Some(carousel) = blocks.iter().find(|b| {
        matches!(
            &b.kind,
            BlockKind::FlexContainer(spec) if spec.kind == ContainerKind::Carousel
        )
    }) {
        let bubbles: Vec<FlexBubble> = carousel
            .children
            .iter()
            .filter_map(|child_id| graph.block(child_id))
            .filter(|child| matches!(
                &child.kind,
                BlockKind::FlexContainer(spec) if spec.kind == ContainerKind::Bubble
            ))
            .map(|bubble_block| bubble_from_ids(graph, &bubble_block.children))
            .collect();
        if !bubbles.is_empty() {
            return FlexDocument::Carousel { contents: bubbles }.ensure_body();
        }
    }

    FlexDocument::Bubble(bubble_from_blocks(&blocks)).ensure_body()
}

fn bubble_from_ids(graph: &BlockGraph, ids: &[String]) -> FlexBubble {
    let blocks: Vec<&Block> = ids.iter().filter_map(|id| graph.block(id)).collect();
    bubble_from_blocks(&blocks)
}

fn bubble_from_blocks(blocks: &[&Block]) -> FlexBubble {
    let mut header = Vec::new();
    let mut body = Vec::new();
    let mut footer = Vec::new();
    let mut hero: Option<FlexImage> = None;
    let mut body_layout = BoxLayout::Vertical;

    for block in blocks {
        match &block.kind {
            BlockKind::FlexContent(spec) => {
                if spec.area == FlexArea::Hero {
                    if let FlexContentKind::Image { url, size, aspect_ratio } = &spec.content {
                        hero = Some(FlexImage {
                            url: url.clone(),
                            size: Some(size.clone().unwrap_or_else(|| "full".to_string())),
                            aspect_ratio: aspect_ratio.clone(),
                        });
                        continue;
                    }
                }
                let component = component_for(spec);
                match spec.area {
                    FlexArea::Header => header.push(component),
                    FlexArea::Footer => footer.push(component),
                    _ => body.push(component),
                }
            }
            BlockKind::FlexLayout(spec) => {
                if spec.area == FlexArea::Body {
                    body_layout = spec.layout;
                }
            }
            // Containers and non-flex blocks contribute no leaf content.
            _ => {}
        }
    }

    FlexBubble {
        header: (!header.is_empty()).then(|| FlexBox::vertical(header)),
        hero,
        body: FlexBox {
            layout: body_layout.as_str().to_string(),
            contents: body,
            spacing: None,
        },
        footer: (!footer.is_empty()).then(|| FlexBox::vertical(footer)),
    }
}

fn component_for(spec: &ContentSpec) -> FlexComponent {
    match &spec.content {
        FlexContentKind::Text {
            text,
            color,
            size,
            weight,
            align,
            wrap,
        } => FlexComponent::Text(FlexText {
            text: text.clone(),
            color: Some(color.clone().unwrap_or_else(|| "#000000".to_string())),
            size: Some(size.clone().unwrap_or_else(|| "md".to_string())),
            weight: Some(weight.clone().unwrap_or_else(|| "regular".to_string())),
            align: Some(align.clone().unwrap_or_else(|| "start".to_string())),
            wrap: Some(wrap.unwrap_or(true)),
        }),
        FlexContentKind::Image {
            url,
            size,
            aspect_ratio,
        } => FlexComponent::Image(FlexImage {
            url: url.clone(),
            size: Some(size.clone().unwrap_or_else(|| "full".to_string())),
            aspect_ratio: aspect_ratio.clone(),
        }),
        FlexContentKind::Button {
            label,
            action_type,
            action_data,
        } => FlexComponent::Button(FlexButton {
            action: match action_type.as_str() {
                "postback" => FlexAction::Postback {
                    label: label.clone(),
                    data: action_data.clone(),
                },
                "uri" => FlexAction::Uri {
                    label: label.clone(),
                    uri: action_data.clone(),
                },
                _ => FlexAction::Message {
                    label: label.clone(),
                    text: action_data.clone(),
                },
            },
            style: Some("primary".to_string()),
        }),
        FlexContentKind::Separator { margin } => FlexComponent::Separator(FlexSeparator {
            margin: margin.clone(),
        }),
        FlexContentKind::Spacer { size } => {
            FlexComponent::Spacer(FlexSpacer { size: size.clone() })
        }
        FlexContentKind::Filler => FlexComponent::Filler,
    }
}
