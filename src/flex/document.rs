use serde::{Deserialize, Serialize, Serializer};

/// Leaf and box components of a Flex message, mirroring the LINE schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FlexComponent {
    Text(FlexText),
    Image(FlexImage),
    Button(FlexButton),
    Separator(FlexSeparator),
    Spacer(FlexSpacer),
    Filler,
    Box(FlexBox),
}

impl FlexComponent {
    pub fn text(text: impl Into<String>) -> FlexComponent {
        FlexComponent::Text(FlexText {
            text: text.into(),
            ..FlexText::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlexText {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(
        rename = "aspectRatio",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub aspect_ratio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexButton {
    pub action: FlexAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FlexAction {
    Message { label: String, text: String },
    Postback { label: String, data: String },
    Uri { label: String, uri: String },
}

impl FlexAction {
    pub fn label(&self) -> &str {
        match self {
            FlexAction::Message { label, .. }
            | FlexAction::Postback { label, .. }
            | FlexAction::Uri { label, .. } => label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlexSeparator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlexSpacer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexBox {
    pub layout: String,
    pub contents: Vec<FlexComponent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<String>,
}

impl FlexBox {
    pub fn vertical(contents: Vec<FlexComponent>) -> FlexBox {
        FlexBox {
            layout: "vertical".to_string(),
            contents,
            spacing: None,
        }
    }
}

/// One bubble. `body` is always present; `header`/`hero`/`footer` are
/// omitted entirely when empty rather than serialized as empty boxes.
/// Slot boxes and the hero image live outside the component enum, so their
/// LINE `type` discriminator is injected at serialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexBubble {
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "opt_box")]
    pub header: Option<FlexBox>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "opt_image")]
    pub hero: Option<FlexImage>,
    #[serde(serialize_with = "tagged_box")]
    pub body: FlexBox,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "opt_box")]
    pub footer: Option<FlexBox>,
}

/// Injects the `type` field LINE expects on nodes that carry none of their
/// own. Deserialization ignores the field, so documents round-trip.
#[derive(Serialize)]
struct Tagged<'a, T: Serialize> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    value: &'a T,
}

fn tagged_box<S: Serializer>(value: &FlexBox, serializer: S) -> Result<S::Ok, S::Error> {
    Tagged { kind: "box", value }.serialize(serializer)
}

fn opt_box<S: Serializer>(value: &Option<FlexBox>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(inner) => tagged_box(inner, serializer),
        None => serializer.serialize_none(),
    }
}

fn opt_image<S: Serializer>(value: &Option<FlexImage>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(inner) => Tagged { kind: "image", value: inner }.serialize(serializer),
        None => serializer.serialize_none(),
    }
}

fn tagged_bubbles<S: Serializer>(value: &[FlexBubble], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(value.iter().map(|bubble| Tagged {
        kind: "bubble",
        value: bubble,
    }))
}

/// A complete Flex document: one bubble or a carousel of bubbles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FlexDocument {
    Bubble(FlexBubble),
    Carousel {
        #[serde(serialize_with = "tagged_bubbles")]
        contents: Vec<FlexBubble>,
    },
}

impl FlexDocument {
    /// A single-text-node bubble, used wherever content is missing or
    /// unrecognizable. Normalization is total: the simulator always has
    /// something to render.
    pub fn placeholder(text: &str) -> FlexDocument {
        FlexDocument::Bubble(FlexBubble {
            header: None,
            hero: None,
            body: FlexBox::vertical(vec![FlexComponent::text(text)]),
            footer: None,
        })
    }

    /// The body contents of the (first) bubble.
    pub fn body_contents(&self) -> &[FlexComponent] {
        match self {
            FlexDocument::Bubble(bubble) => &bubble.body.contents,
            FlexDocument::Carousel { contents } => contents
                .first()
                .map(|b| b.body.contents.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Enforces the non-empty-body invariant after deserialization.
    pub fn ensure_body(mut self) -> FlexDocument {
        match &mut self {
            FlexDocument::Bubble(bubble) => fill_empty_body(bubble),
            FlexDocument::Carousel { contents } => {
                for bubble in contents {
                    fill_empty_body(bubble);
                }
            }
        }
        self
    }
}

fn fill_empty_body(bubble: &mut FlexBubble) {
    if bubble.body.contents.is_empty() {
        bubble
            .body
            .contents
            .push(FlexComponent::text("尚未加入內容"));
    }
}
