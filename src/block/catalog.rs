//! The static block catalog consumed by the editor palette and the code
//! exporter. The core never hard-codes presentation; it only keys behavior
//! off `blockType`/subtype strings, and this catalog is the declarative
//! bridge to the excluded UI layer.

/// Declarative descriptor for one palette entry.
#[derive(Debug, Clone, Copy)]
pub struct BlockDescriptor {
    pub block_type: &'static str,
    pub subtype: &'static str,
    pub label: &'static str,
    /// Default `blockData` as a JSON document.
    pub default_data: &'static str,
    /// Target-platform code template; `{{field}}` placeholders are replaced
    /// with `blockData` values by [`crate::codegen::generate_code`].
    pub code_template: &'static str,
}

/// The built-in catalog, in palette order.
pub fn catalog() -> &'static [BlockDescriptor] {
    CATALOG
}

/// Finds the descriptor for a `(blockType, subtype)` pair, falling back to
/// the bare `blockType` entry when no subtype-specific template exists.
pub fn descriptor(block_type: &str, subtype: &str) -> Option<&'static BlockDescriptor> {
    CATALOG
        .iter()
        .find(|d| d.block_type == block_type && d.subtype == subtype)
        .or_else(|| {
            CATALOG
                .iter()
                .find(|d| d.block_type == block_type && d.subtype.is_empty())
        })
}

static CATALOG: &[BlockDescriptor] = &[
    BlockDescriptor {
        block_type: "event",
        subtype: "",
        label: "Message Event",
        default_data: r#"{"eventType":"message.text","condition":"","matchType":"contains"}"#,
        code_template: "// on {{eventType}} matching \"{{condition}}\"\n",
    },
    BlockDescriptor {
        block_type: "reply",
        subtype: "text",
        label: "Text Reply",
        default_data: r#"{"replyType":"text","text":""}"#,
        code_template: "await client.replyMessage(event.replyToken, { type: 'text', text: '{{text}}' });\n",
    },
    BlockDescriptor {
        block_type: "reply",
        subtype: "flex",
        label: "Flex Reply",
        default_data: r#"{"replyType":"flex","flexMessageName":"","altText":"Flex Message"}"#,
        code_template: "await client.replyMessage(event.replyToken, { type: 'flex', altText: '{{altText}}', contents: flexMessages['{{flexMessageName}}'] });\n",
    },
    BlockDescriptor {
        block_type: "reply",
        subtype: "sticker",
        label: "Sticker Reply",
        default_data: r#"{"replyType":"sticker","packageId":"1","stickerId":"1"}"#,
        code_template: "await client.replyMessage(event.replyToken, { type: 'sticker', packageId: '{{packageId}}', stickerId: '{{stickerId}}' });\n",
    },
    BlockDescriptor {
        block_type: "reply",
        subtype: "image",
        label: "Image Reply",
        default_data: r#"{"replyType":"image","originalContentUrl":""}"#,
        code_template: "await client.replyMessage(event.replyToken, { type: 'image', originalContentUrl: '{{originalContentUrl}}' });\n",
    },
    BlockDescriptor {
        block_type: "push",
        subtype: "",
        label: "Push Message",
        default_data: r#"{"replyType":"text","text":""}"#,
        code_template: "await client.pushMessage(userId, { type: 'text', text: '{{text}}' });\n",
    },
    BlockDescriptor {
        block_type: "control",
        subtype: "if",
        label: "If / Else",
        default_data: r#"{"controlType":"if","condition":""}"#,
        code_template: "if ({{condition}}) {\n",
    },
    BlockDescriptor {
        block_type: "control",
        subtype: "while",
        label: "While Loop",
        default_data: r#"{"controlType":"while","condition":"","maxIterations":100}"#,
        code_template: "while ({{condition}}) { // capped at {{maxIterations}}\n",
    },
    BlockDescriptor {
        block_type: "control",
        subtype: "for",
        label: "For Loop",
        default_data: r#"{"controlType":"for","loopVariable":"i","startValue":0,"endValue":10,"stepValue":1}"#,
        code_template: "for (let {{loopVariable}} = {{startValue}}; {{loopVariable}} < {{endValue}}; {{loopVariable}} += {{stepValue}}) {\n",
    },
    BlockDescriptor {
        block_type: "control",
        subtype: "wait",
        label: "Wait",
        default_data: r#"{"controlType":"wait","waitType":"time","waitTime":1000}"#,
        code_template: "await new Promise(r => setTimeout(r, {{waitTime}}));\n",
    },
    BlockDescriptor {
        block_type: "control",
        subtype: "try",
        label: "Try / Catch",
        default_data: r#"{"controlType":"try"}"#,
        code_template: "try {\n",
    },
    BlockDescriptor {
        block_type: "control",
        subtype: "switch",
        label: "Switch",
        default_data: r#"{"controlType":"switch","switchVariable":"","cases":[]}"#,
        code_template: "switch (String({{switchVariable}})) {\n",
    },
    BlockDescriptor {
        block_type: "setting",
        subtype: "",
        label: "Set Variable",
        default_data: r#"{"variable":"","value":null}"#,
        code_template: "context['{{variable}}'] = {{value}};\n",
    },
];
