//! Block model for TASKBOARD.
//!
//! Blocks are the content of a board: cards, views, and the text, image
//! and comment blocks that make up a card. Every block belongs to exactly
//! one board.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of content a block holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Card,
    View,
    Text,
    Checkbox,
    Comment,
    Image,
    Divider,
    Attachment,
}

impl BlockType {
    /// Convert block type to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Card => "card",
            BlockType::View => "view",
            BlockType::Text => "text",
            BlockType::Checkbox => "checkbox",
            BlockType::Comment => "comment",
            BlockType::Image => "image",
            BlockType::Divider => "divider",
            BlockType::Attachment => "attachment",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "card" => Ok(BlockType::Card),
            "view" => Ok(BlockType::View),
            "text" => Ok(BlockType::Text),
            "checkbox" => Ok(BlockType::Checkbox),
            "comment" => Ok(BlockType::Comment),
            "image" => Ok(BlockType::Image),
            "divider" => Ok(BlockType::Divider),
            "attachment" => Ok(BlockType::Attachment),
            _ => Err(format!("unknown block type: {s}")),
        }
    }
}

/// Block entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    /// Parent block used for content ordering (a card for its contents).
    pub parent_id: Option<String>,
    pub board_id: String,
    pub created_by: String,
    pub modified_by: String,
    pub schema: i64,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub title: String,
    pub fields: Map<String, Value>,
    pub create_at: i64,
    pub update_at: i64,
    pub delete_at: Option<i64>,
}

impl Block {
    /// Create a block on a board with minimal required fields.
    pub fn new(
        id: impl Into<String>,
        board_id: impl Into<String>,
        block_type: BlockType,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            board_id: board_id.into(),
            created_by: String::new(),
            modified_by: String::new(),
            schema: 1,
            block_type,
            title: title.into(),
            fields: Map::new(),
            create_at: 0,
            update_at: 0,
            delete_at: None,
        }
    }

    /// Set the parent block.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Set a field value.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Whether the block has not been soft-deleted.
    pub fn is_active(&self) -> bool {
        self.delete_at.is_none()
    }
}

/// Partial update for a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockPatch {
    pub parent_id: Option<String>,
    pub schema: Option<i64>,
    #[serde(rename = "type")]
    pub block_type: Option<BlockType>,
    pub title: Option<String>,
    pub updated_fields: Map<String, Value>,
    pub deleted_fields: Vec<String>,
}

impl BlockPatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set a field value.
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.updated_fields.insert(key.into(), value);
        self
    }

    /// Apply the patch to a block in place.
    pub fn apply(&self, block: &mut Block) {
        if let Some(ref parent_id) = self.parent_id {
            block.parent_id = Some(parent_id.clone()).filter(|p| !p.is_empty());
        }
        if let Some(schema) = self.schema {
            block.schema = schema;
        }
        if let Some(block_type) = self.block_type {
            block.block_type = block_type;
        }
        if let Some(ref title) = self.title {
            block.title = title.clone();
        }
        for (key, value) in &self.updated_fields {
            block.fields.insert(key.clone(), value.clone());
        }
        for key in &self.deleted_fields {
            block.fields.remove(key);
        }
    }
}
