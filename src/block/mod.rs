//! The typed block model.
//!
//! The designer ships loosely-typed field maps ([`DesignerBlock`]); this
//! module is the single place those strings are interpreted. Everything
//! downstream works on the closed [`BlockKind`] sum type, so adding a block
//! type is a compile-time-checked, localized change.

pub mod catalog;
pub mod designer;

pub use designer::{DesignerBlock, DesignerBot, DesignerConnection};

use crate::condition::Value;
use crate::error::GraphError;
use crate::matcher::MatchStrategy;
use serde_json::Map;

/// A node instance in the block graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: String,
    pub kind: BlockKind,
    /// Ordered child ids for container-like blocks (boxes, bubbles, carousels).
    pub children: Vec<String>,
    /// The raw designer field map, kept for code-template substitution.
    pub data: Map<String, serde_json::Value>,
}

/// The closed set of block categories.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Event(EventSpec),
    Reply(ReplySpec),
    Push(ReplySpec),
    Control(ControlSpec),
    Setting(SettingSpec),
    FlexContainer(ContainerSpec),
    FlexLayout(LayoutSpec),
    FlexContent(ContentSpec),
    Placeholder,
}

impl BlockKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            BlockKind::Event(_) => "event",
            BlockKind::Reply(_) => "reply",
            BlockKind::Push(_) => "push",
            BlockKind::Control(_) => "control",
            BlockKind::Setting(_) => "setting",
            BlockKind::FlexContainer(_) => "flex-container",
            BlockKind::FlexLayout(_) => "flex-layout",
            BlockKind::FlexContent(_) => "flex-content",
            BlockKind::Placeholder => "placeholder",
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self, BlockKind::Event(_))
    }

    pub fn is_reply_like(&self) -> bool {
        matches!(self, BlockKind::Reply(_) | BlockKind::Push(_))
    }

    pub fn is_flex(&self) -> bool {
        matches!(
            self,
            BlockKind::FlexContainer(_) | BlockKind::FlexLayout(_) | BlockKind::FlexContent(_)
        )
    }
}

/// Trigger descriptor for an event block.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSpec {
    /// Stimulus kind this block listens for, e.g. `message.text`, `postback`.
    pub event_type: String,
    /// Trigger pattern text; `None` makes the block an unconditioned catch-all.
    pub condition: Option<String>,
    pub strategy: MatchStrategy,
    pub case_sensitive: bool,
    pub weight: i32,
}

/// What a reply or push block sends back.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplySpec {
    Text {
        text: String,
    },
    Flex {
        /// Name of a previously saved Flex document, tried first.
        name: Option<String>,
        /// Inline Flex JSON embedded in the block, tried last.
        inline: Option<serde_json::Value>,
        alt_text: String,
    },
    Sticker {
        package_id: String,
        sticker_id: String,
    },
    Image {
        url: String,
        preview_url: Option<String>,
    },
}

/// Control-flow block variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlSpec {
    If {
        condition: String,
    },
    While {
        condition: String,
        max_iterations: u32,
    },
    For {
        variable: String,
        start: f64,
        end: f64,
        step: f64,
    },
    Wait(WaitSpec),
    Try,
    Switch {
        variable: String,
        /// Case values in declared order; `Case(i)` edges point at index `i`.
        cases: Vec<String>,
    },
}

/// Wait block modes. Times are simulated milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitSpec {
    Time { ms: u64 },
    Condition { condition: String, timeout_ms: u64 },
    UserInput,
}

/// Setting blocks mutate the execution context.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingSpec {
    Set { variable: String, value: Value },
}

/// Which bubble slot a flex block lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexArea {
    Header,
    Hero,
    #[default]
    Body,
    Footer,
}

impl FlexArea {
    fn parse(s: &str) -> FlexArea {
        match s {
            "header" => FlexArea::Header,
            "hero" => FlexArea::Hero,
            "footer" => FlexArea::Footer,
            _ => FlexArea::Body,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Bubble,
    Carousel,
    Box,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec {
    pub kind: ContainerKind,
    pub area: FlexArea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxLayout {
    Horizontal,
    Vertical,
    Baseline,
}

impl BoxLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoxLayout::Horizontal => "horizontal",
            BoxLayout::Vertical => "vertical",
            BoxLayout::Baseline => "baseline",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSpec {
    pub layout: BoxLayout,
    pub area: FlexArea,
}

/// Leaf Flex components as configured in the designer.
#[derive(Debug, Clone, PartialEq)]
pub enum FlexContentKind {
    Text {
        text: String,
        color: Option<String>,
        size: Option<String>,
        weight: Option<String>,
        align: Option<String>,
        wrap: Option<bool>,
    },
    Image {
        url: String,
        size: Option<String>,
        aspect_ratio: Option<String>,
    },
    Button {
        label: String,
        action_type: String,
        action_data: String,
    },
    Separator {
        margin: Option<String>,
    },
    Spacer {
        size: Option<String>,
    },
    Filler,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentSpec {
    pub content: FlexContentKind,
    pub area: FlexArea,
}

// ---------------------------------------------------------------------------
// Designer-format parsing

fn get_str<'a>(data: &'a Map<String, serde_json::Value>, key: &str) -> Option<&'a str> {
    data.get(key).and_then(|v| v.as_str())
}

fn get_string_or(data: &Map<String, serde_json::Value>, key: &str, default: &str) -> String {
    get_str(data, key).unwrap_or(default).to_string()
}

fn get_f64(data: &Map<String, serde_json::Value>, key: &str, default: f64) -> f64 {
    data.get(key)
        .and_then(|v| {
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        })
        .unwrap_or(default)
}

fn get_u64(data: &Map<String, serde_json::Value>, key: &str, default: u64) -> u64 {
    data.get(key)
        .and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        })
        .unwrap_or(default)
}

fn get_bool(data: &Map<String, serde_json::Value>, key: &str, default: bool) -> bool {
    data.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

fn required_str(
    data: &Map<String, serde_json::Value>,
    key: &str,
    id: &str,
) -> Result<String, GraphError> {
    get_str(data, key)
        .map(str::to_string)
        .ok_or_else(|| GraphError::InvalidBlock {
            id: id.to_string(),
            message: format!("missing required field '{}'", key),
        })
}

impl Block {
    /// Types a raw designer block. This is the only place `blockType` and
    /// subtype strings are interpreted.
    pub fn from_designer(raw: &DesignerBlock) -> Result<Block, GraphError> {
        let data = &raw.block_data;
        let id = raw.id.as_str();
        let kind = match raw.block_type.as_str() {
            "event" => BlockKind::Event(parse_event(data)),
            "reply" => BlockKind::Reply(parse_reply(data, id)?),
            "push" => BlockKind::Push(parse_reply(data, id)?),
            "control" => BlockKind::Control(parse_control(data, id)?),
            "setting" => BlockKind::Setting(parse_setting(data, id)?),
            "flex-container" => BlockKind::FlexContainer(parse_container(data)),
            "flex-layout" => BlockKind::FlexLayout(parse_layout(data)),
            "flex-content" => BlockKind::FlexContent(parse_content(data, id)?),
            "placeholder" => BlockKind::Placeholder,
            other => {
                return Err(GraphError::InvalidBlock {
                    id: id.to_string(),
                    message: format!("unknown block type '{}'", other),
                });
            }
        };
        Ok(Block {
            id: raw.id.clone(),
            kind,
            children: raw.children.clone(),
            data: raw.block_data.clone(),
        })
    }
}

fn parse_event(data: &Map<String, serde_json::Value>) -> EventSpec {
    let condition = get_str(data, "condition")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    EventSpec {
        event_type: get_string_or(data, "eventType", "message.text"),
        condition,
        strategy: MatchStrategy::parse(get_str(data, "matchType").unwrap_or("contains")),
        case_sensitive: get_bool(data, "caseSensitive", false),
        weight: get_f64(data, "weight", 0.0) as i32,
    }
}

fn parse_reply(data: &Map<String, serde_json::Value>, id: &str) -> Result<ReplySpec, GraphError> {
    match get_str(data, "replyType").unwrap_or("text") {
        "text" => Ok(ReplySpec::Text {
            text: get_string_or(data, "text", ""),
        }),
        "flex" => Ok(ReplySpec::Flex {
            name: get_str(data, "flexMessageName")
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            inline: data.get("flexContent").cloned(),
            alt_text: get_string_or(data, "altText", "Flex Message"),
        }),
        "sticker" => Ok(ReplySpec::Sticker {
            package_id: required_str(data, "packageId", id)?,
            sticker_id: required_str(data, "stickerId", id)?,
        }),
        "image" => Ok(ReplySpec::Image {
            url: required_str(data, "originalContentUrl", id)?,
            preview_url: get_str(data, "previewImageUrl").map(str::to_string),
        }),
        other => Err(GraphError::InvalidBlock {
            id: id.to_string(),
            message: format!("unknown reply type '{}'", other),
        }),
    }
}

fn parse_control(
    data: &Map<String, serde_json::Value>,
    id: &str,
) -> Result<ControlSpec, GraphError> {
    match required_str(data, "controlType", id)?.as_str() {
        "if" => Ok(ControlSpec::If {
            condition: required_str(data, "condition", id)?,
        }),
        "while" => Ok(ControlSpec::While {
            condition: required_str(data, "condition", id)?,
            max_iterations: get_u64(data, "maxIterations", 100) as u32,
        }),
        "for" => Ok(ControlSpec::For {
            variable: get_string_or(data, "loopVariable", "i"),
            start: get_f64(data, "startValue", 0.0),
            end: get_f64(data, "endValue", 0.0),
            step: get_f64(data, "stepValue", 1.0),
        }),
        "wait" => Ok(ControlSpec::Wait(parse_wait(data, id)?)),
        "try" => Ok(ControlSpec::Try),
        "switch" => {
            let cases = data
                .get("cases")
                .and_then(|v| v.as_array())
                .map(|values| {
                    values
                        .iter()
                        .map(|v| match v {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            Ok(ControlSpec::Switch {
                variable: required_str(data, "switchVariable", id)?,
                cases,
            })
        }
        other => Err(GraphError::InvalidBlock {
            id: id.to_string(),
            message: format!("unknown control type '{}'", other),
        }),
    }
}

fn parse_wait(data: &Map<String, serde_json::Value>, id: &str) -> Result<WaitSpec, GraphError> {
    match get_str(data, "waitType").unwrap_or("time") {
        "time" => Ok(WaitSpec::Time {
            ms: get_u64(data, "waitTime", 1000),
        }),
        "condition" => Ok(WaitSpec::Condition {
            condition: required_str(data, "condition", id)?,
            timeout_ms: get_u64(data, "timeout", 5000),
        }),
        "user_input" => Ok(WaitSpec::UserInput),
        other => Err(GraphError::InvalidBlock {
            id: id.to_string(),
            message: format!("unknown wait type '{}'", other),
        }),
    }
}

fn parse_setting(
    data: &Map<String, serde_json::Value>,
    id: &str,
) -> Result<SettingSpec, GraphError> {
    let variable = required_str(data, "variable", id)?;
    let value = data
        .get("value")
        .map(Value::from_json)
        .unwrap_or(Value::Null);
    Ok(SettingSpec::Set { variable, value })
}

fn parse_container(data: &Map<String, serde_json::Value>) -> ContainerSpec {
    let kind = match get_str(data, "containerType").unwrap_or("bubble") {
        "carousel" => ContainerKind::Carousel,
        "box" => ContainerKind::Box,
        _ => ContainerKind::Bubble,
    };
    ContainerSpec {
        kind,
        area: FlexArea::parse(get_str(data, "area").unwrap_or("body")),
    }
}

fn parse_layout(data: &Map<String, serde_json::Value>) -> LayoutSpec {
    let layout = match get_str(data, "layoutType").unwrap_or("vertical") {
        "horizontal" => BoxLayout::Horizontal,
        "baseline" => BoxLayout::Baseline,
        _ => BoxLayout::Vertical,
    };
    LayoutSpec {
        layout,
        area: FlexArea::parse(get_str(data, "area").unwrap_or("body")),
    }
}

fn parse_content(
    data: &Map<String, serde_json::Value>,
    id: &str,
) -> Result<ContentSpec, GraphError> {
    let content = match get_str(data, "contentType").unwrap_or("text") {
        "text" => FlexContentKind::Text {
            text: get_string_or(data, "text", ""),
            color: get_str(data, "color").map(str::to_string),
            size: get_str(data, "size").map(str::to_string),
            weight: get_str(data, "weight").map(str::to_string),
            align: get_str(data, "align").map(str::to_string),
            wrap: data.get("wrap").and_then(|v| v.as_bool()),
        },
        "image" => FlexContentKind::Image {
            url: required_str(data, "url", id)?,
            size: get_str(data, "size").map(str::to_string),
            aspect_ratio: get_str(data, "aspectRatio").map(str::to_string),
        },
        "button" => FlexContentKind::Button {
            label: get_string_or(data, "label", ""),
            action_type: get_string_or(data, "actionType", "message"),
            action_data: get_string_or(data, "actionData", ""),
        },
        "separator" => FlexContentKind::Separator {
            margin: get_str(data, "margin").map(str::to_string),
        },
        "spacer" => FlexContentKind::Spacer {
            size: get_str(data, "size").map(str::to_string),
        },
        "filler" => FlexContentKind::Filler,
        other => {
            return Err(GraphError::InvalidBlock {
                id: id.to_string(),
                message: format!("unknown content type '{}'", other),
            });
        }
    };
    Ok(ContentSpec {
        content,
        area: FlexArea::parse(get_str(data, "area").unwrap_or("body")),
    })
}
