//! Batch request and response types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::board::{Block, BlockPatch, Board, BoardPatch};
use crate::ids::new_id;
use crate::permission::BoardMember;
use crate::{Result, TaskboardError};

/// Block field listing the ordered child block IDs of a card.
pub const CONTENT_ORDER_FIELD: &str = "contentOrder";

/// Boards and their blocks, created or returned together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardsAndBlocks {
    pub boards: Vec<Board>,
    pub blocks: Vec<Block>,
}

impl BoardsAndBlocks {
    pub fn new(boards: Vec<Board>, blocks: Vec<Block>) -> Self {
        Self { boards, blocks }
    }

    /// Total number of entities in the bundle.
    pub fn len(&self) -> usize {
        self.boards.len() + self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty() && self.blocks.is_empty()
    }

    /// Re-key every board and block with a fresh ID.
    ///
    /// Block board IDs, parent IDs and content order entries that point
    /// inside the bundle follow the new IDs. References to anything outside
    /// the bundle are left alone.
    pub fn with_generated_ids(mut self) -> Self {
        let board_ids: HashMap<String, String> = self
            .boards
            .iter()
            .map(|b| (b.id.clone(), new_id()))
            .collect();
        let block_ids: HashMap<String, String> = self
            .blocks
            .iter()
            .map(|b| (b.id.clone(), new_id()))
            .collect();

        for board in &mut self.boards {
            if let Some(id) = board_ids.get(&board.id) {
                board.id = id.clone();
            }
        }
        remap_blocks(&mut self.blocks, &board_ids, &block_ids);
        self
    }
}

/// Created boards and blocks together with the memberships made for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardsAndBlocksWithMembers {
    pub boards: Vec<Board>,
    pub blocks: Vec<Block>,
    pub members: Vec<BoardMember>,
}

/// Parallel arrays of IDs and patches.
///
/// `board_patches[i]` applies to `board_ids[i]` and `block_patches[i]` to
/// `block_ids[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatchBoardsAndBlocks {
    pub board_ids: Vec<String>,
    pub board_patches: Vec<BoardPatch>,
    pub block_ids: Vec<String>,
    pub block_patches: Vec<BlockPatch>,
}

impl PatchBoardsAndBlocks {
    /// Parse a patch batch from JSON.
    ///
    /// One malformed patch, such as an unknown enum value, rejects the
    /// whole batch.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| TaskboardError::bad_request(format!("invalid patch batch: {e}")))
    }

    pub fn board(mut self, id: impl Into<String>, patch: BoardPatch) -> Self {
        self.board_ids.push(id.into());
        self.board_patches.push(patch);
        self
    }

    pub fn block(mut self, id: impl Into<String>, patch: BlockPatch) -> Self {
        self.block_ids.push(id.into());
        self.block_patches.push(patch);
        self
    }

    /// Total number of IDs named by the batch.
    pub fn len(&self) -> usize {
        self.board_ids.len() + self.block_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.board_ids.is_empty() && self.block_ids.is_empty()
    }
}

/// IDs of boards and blocks to delete together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteBoardsAndBlocks {
    pub boards: Vec<String>,
    pub blocks: Vec<String>,
}

impl DeleteBoardsAndBlocks {
    pub fn new(boards: Vec<String>, blocks: Vec<String>) -> Self {
        Self { boards, blocks }
    }

    pub fn len(&self) -> usize {
        self.boards.len() + self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty() && self.blocks.is_empty()
    }
}

/// Point blocks at re-keyed boards and blocks.
pub(crate) fn remap_blocks(
    blocks: &mut [Block],
    board_ids: &HashMap<String, String>,
    block_ids: &HashMap<String, String>,
) {
    for block in blocks {
        if let Some(id) = block_ids.get(&block.id) {
            block.id = id.clone();
        }
        if let Some(id) = board_ids.get(&block.board_id) {
            block.board_id = id.clone();
        }
        if let Some(parent) = block.parent_id.as_mut() {
            if let Some(id) = block_ids.get(parent).or_else(|| board_ids.get(parent)) {
                *parent = id.clone();
            }
        }
        if let Some(order) = block.fields.get_mut(CONTENT_ORDER_FIELD) {
            remap_content_order(order, block_ids);
        }
    }
}

// Entries are block IDs or nested arrays of block IDs.
fn remap_content_order(value: &mut Value, block_ids: &HashMap<String, String>) {
    match value {
        Value::String(id) => {
            if let Some(new) = block_ids.get(id.as_str()) {
                *id = new.clone();
            }
        }
        Value::Array(items) => {
            for item in items {
                remap_content_order(item, block_ids);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::board::BlockType;

    fn bundle() -> BoardsAndBlocks {
        BoardsAndBlocks::new(
            vec![Board::new("board-1", "t1", "Roadmap")],
            vec![
                Block::new("card-1", "board-1", BlockType::Card, "Card")
                    .with_parent("board-1")
                    .with_field(CONTENT_ORDER_FIELD, json!(["text-1", ["text-2", "outside"]])),
                Block::new("text-1", "board-1", BlockType::Text, "One").with_parent("card-1"),
                Block::new("text-2", "board-1", BlockType::Text, "Two").with_parent("card-1"),
                Block::new("view-1", "board-1", BlockType::View, "Table").with_parent("elsewhere"),
            ],
        )
    }

    #[test]
    fn test_with_generated_ids_rekeys_everything() {
        let original = bundle();
        let rekeyed = original.clone().with_generated_ids();

        let board_id = &rekeyed.boards[0].id;
        assert_ne!(board_id, "board-1");
        assert!(rekeyed.blocks.iter().all(|b| &b.board_id == board_id));

        let card = &rekeyed.blocks[0];
        assert_ne!(card.id, "card-1");
        assert_eq!(card.parent_id.as_deref(), Some(board_id.as_str()));

        let text_1 = &rekeyed.blocks[1];
        let text_2 = &rekeyed.blocks[2];
        assert_eq!(text_1.parent_id.as_deref(), Some(card.id.as_str()));
        assert_eq!(
            card.fields[CONTENT_ORDER_FIELD],
            json!([text_1.id, [text_2.id, "outside"]])
        );

        assert_eq!(rekeyed.blocks[3].parent_id.as_deref(), Some("elsewhere"));
    }

    #[test]
    fn test_patch_builder_keeps_arrays_paired() {
        let patch = PatchBoardsAndBlocks::default()
            .board("b1", BoardPatch::new().title("New"))
            .block("k1", BlockPatch::new().title("Card"));
        assert_eq!(patch.board_ids, vec!["b1"]);
        assert_eq!(patch.board_patches.len(), 1);
        assert_eq!(patch.block_ids, vec!["k1"]);
        assert_eq!(patch.block_patches.len(), 1);
        assert_eq!(patch.len(), 2);
    }

    #[test]
    fn test_patch_from_json() {
        let patch = PatchBoardsAndBlocks::from_json(
            r#"{"boardIds":["b1"],"boardPatches":[{"title":"Renamed","minimumRole":"viewer"}]}"#,
        )
        .unwrap();
        assert_eq!(patch.board_ids, vec!["b1"]);
        assert_eq!(patch.board_patches[0].title.as_deref(), Some("Renamed"));
        assert!(patch.block_ids.is_empty());

        let err = PatchBoardsAndBlocks::from_json(
            r#"{"boardIds":["b1","b2"],"boardPatches":[{"title":"ok"},{"type":"X"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TaskboardError::BadRequest(_)));
    }

    #[test]
    fn test_delete_len() {
        let delete = DeleteBoardsAndBlocks::new(vec!["b1".into()], vec!["k1".into(), "k2".into()]);
        assert_eq!(delete.len(), 3);
        assert!(!delete.is_empty());
        assert!(DeleteBoardsAndBlocks::default().is_empty());
    }
}
