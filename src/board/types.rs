//! Board model for TASKBOARD.
//!
//! This module defines the Board struct, the BoardType enum and the partial
//! update applied by batch patches.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::permission::SchemeRole;

/// Board visibility type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoardType {
    /// Any team member may discover the board.
    #[default]
    #[serde(rename = "O")]
    Open,
    /// Only members may discover the board.
    #[serde(rename = "P")]
    Private,
}

impl BoardType {
    /// Convert board type to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardType::Open => "O",
            BoardType::Private => "P",
        }
    }
}

impl fmt::Display for BoardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BoardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "O" | "o" | "open" => Ok(BoardType::Open),
            "P" | "p" | "private" => Ok(BoardType::Private),
            _ => Err(format!("unknown board type: {s}")),
        }
    }
}

/// Board entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    pub team_id: String,
    /// Linked chat channel; channel members get synthetic editor access.
    pub channel_id: Option<String>,
    pub created_by: String,
    pub modified_by: String,
    #[serde(rename = "type")]
    pub board_type: BoardType,
    /// Floor applied to synthetic memberships only.
    pub minimum_role: SchemeRole,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub show_description: bool,
    pub is_template: bool,
    pub template_version: i32,
    pub properties: Map<String, Value>,
    pub card_properties: Vec<Value>,
    pub create_at: i64,
    pub update_at: i64,
    /// Soft-delete timestamp; `None` while the board is active.
    pub delete_at: Option<i64>,
}

impl Board {
    /// Create an open, non-template board with minimal required fields.
    pub fn new(id: impl Into<String>, team_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            team_id: team_id.into(),
            channel_id: None,
            created_by: String::new(),
            modified_by: String::new(),
            board_type: BoardType::Open,
            minimum_role: SchemeRole::None,
            title: title.into(),
            description: String::new(),
            icon: String::new(),
            show_description: false,
            is_template: false,
            template_version: 0,
            properties: Map::new(),
            card_properties: Vec::new(),
            create_at: 0,
            update_at: 0,
            delete_at: None,
        }
    }

    /// Set the board type.
    pub fn with_board_type(mut self, board_type: BoardType) -> Self {
        self.board_type = board_type;
        self
    }

    /// Link the board to a channel.
    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// Set the minimum role.
    pub fn with_minimum_role(mut self, role: SchemeRole) -> Self {
        self.minimum_role = role;
        self
    }

    /// Mark the board as a template.
    pub fn as_template(mut self, is_template: bool) -> Self {
        self.is_template = is_template;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the board has not been soft-deleted.
    pub fn is_active(&self) -> bool {
        self.delete_at.is_none()
    }

    /// Whether the board is linked to a channel.
    pub fn has_channel(&self) -> bool {
        self.channel_id.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// Partial update for a board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardPatch {
    #[serde(rename = "type")]
    pub board_type: Option<BoardType>,
    pub minimum_role: Option<SchemeRole>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub show_description: Option<bool>,
    /// `Some(None)` unlinks the channel.
    pub channel_id: Option<Option<String>>,
    pub updated_properties: Map<String, Value>,
    pub deleted_properties: Vec<String>,
}

impl BoardPatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set new description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set new board type.
    pub fn board_type(mut self, board_type: BoardType) -> Self {
        self.board_type = Some(board_type);
        self
    }

    /// Set new minimum role.
    pub fn minimum_role(mut self, role: SchemeRole) -> Self {
        self.minimum_role = Some(role);
        self
    }

    /// Set or clear the linked channel.
    pub fn channel_id(mut self, channel_id: Option<String>) -> Self {
        self.channel_id = Some(channel_id);
        self
    }

    /// Set a board property.
    pub fn property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.updated_properties.insert(key.into(), value);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.board_type.is_none()
            && self.minimum_role.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.icon.is_none()
            && self.show_description.is_none()
            && self.channel_id.is_none()
            && self.updated_properties.is_empty()
            && self.deleted_properties.is_empty()
    }

    /// Apply the patch to a board in place.
    ///
    /// Timestamps and the modifier are left to the caller.
    pub fn apply(&self, board: &mut Board) {
        if let Some(board_type) = self.board_type {
            board.board_type = board_type;
        }
        if let Some(role) = self.minimum_role {
            board.minimum_role = role;
        }
        if let Some(ref title) = self.title {
            board.title = title.clone();
        }
        if let Some(ref description) = self.description {
            board.description = description.clone();
        }
        if let Some(ref icon) = self.icon {
            board.icon = icon.clone();
        }
        if let Some(show) = self.show_description {
            board.show_description = show;
        }
        if let Some(ref channel_id) = self.channel_id {
            board.channel_id = channel_id.clone().filter(|c| !c.is_empty());
        }
        for (key, value) in &self.updated_properties {
            board.properties.insert(key.clone(), value.clone());
        }
        for key in &self.deleted_properties {
            board.properties.remove(key);
        }
    }
}
