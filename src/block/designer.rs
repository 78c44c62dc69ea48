use serde::{Deserialize, Serialize};

/// A bot document exactly as the visual editor serializes it: an unordered
/// list of block instances plus their declared connections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignerBot {
    #[serde(default)]
    pub blocks: Vec<DesignerBlock>,
    #[serde(default)]
    pub connections: Vec<DesignerConnection>,
}

impl DesignerBot {
    pub fn from_json(json: &str) -> Result<Self, crate::error::GraphError> {
        serde_json::from_str(json).map_err(|e| crate::error::GraphError::JsonParse(e.to_string()))
    }
}

/// One block instance. `block_data` is an open field map whose required keys
/// depend on the block type; typing happens in [`super::Block::from_designer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignerBlock {
    pub id: String,
    #[serde(alias = "blockType")]
    pub block_type: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "blockData")]
    pub block_data: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub children: Vec<String>,
}

/// A directed, typed edge between two blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignerConnection {
    #[serde(alias = "fromBlockId")]
    pub from: String,
    #[serde(alias = "toBlockId")]
    pub to: String,
    #[serde(alias = "connectionType")]
    pub kind: String,
}
