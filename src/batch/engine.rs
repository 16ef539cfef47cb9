//! Atomic multi-entity mutations.
//!
//! Every operation validates the shape of its request first. It then opens
//! one write-locked transaction, reads what it is about to change, checks
//! it, and performs all of its writes there. A failure at any point leaves
//! storage exactly as it was, and concurrent batches apply one after the
//! other.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::board::{
    Block, BlockRepository, Board, BoardRepository, CategoryRepository, MemberRepository,
    SharingRepository,
};
use crate::config::BoardsConfig;
use crate::datetime::now_millis;
use crate::db::{Database, DbTransaction};
use crate::ids::new_id;
use crate::permission::BoardMember;
use crate::{Result, TaskboardError};

use super::types::{
    remap_blocks, BoardsAndBlocks, BoardsAndBlocksWithMembers, DeleteBoardsAndBlocks,
    PatchBoardsAndBlocks,
};
use super::validation::{validate_create, validate_delete, validate_patch};

/// Performs batch creates, patches, deletes and duplication.
pub struct BatchMutationEngine<'a> {
    db: &'a Database,
    limits: &'a BoardsConfig,
}

impl<'a> BatchMutationEngine<'a> {
    /// Create a new engine over the given database and limits.
    pub fn new(db: &'a Database, limits: &'a BoardsConfig) -> Self {
        Self { db, limits }
    }

    // ========== Create Operations ==========

    /// Create boards and their blocks.
    ///
    /// Returns the stored entities with their creator and timestamps set.
    pub async fn create_boards_and_blocks(
        &self,
        bundle: BoardsAndBlocks,
        user_id: &str,
    ) -> Result<BoardsAndBlocks> {
        let created = self.create(bundle, user_id, false).await?;
        Ok(BoardsAndBlocks::new(created.boards, created.blocks))
    }

    /// Create boards and their blocks, making `user_id` admin of every board.
    pub async fn create_boards_and_blocks_with_admin(
        &self,
        bundle: BoardsAndBlocks,
        user_id: &str,
    ) -> Result<BoardsAndBlocksWithMembers> {
        self.create(bundle, user_id, true).await
    }

    async fn create(
        &self,
        bundle: BoardsAndBlocks,
        user_id: &str,
        with_admin: bool,
    ) -> Result<BoardsAndBlocksWithMembers> {
        validate_create(&bundle, self.limits)
            .inspect_err(|e| warn!(user_id, error = %e, "rejected create batch"))?;

        let now = now_millis();
        let boards: Vec<Board> = bundle
            .boards
            .into_iter()
            .map(|board| stamp_new_board(board, user_id, now))
            .collect();
        let blocks: Vec<Block> = bundle
            .blocks
            .into_iter()
            .map(|block| stamp_new_block(block, user_id, now))
            .collect();
        let members: Vec<BoardMember> = if with_admin {
            boards
                .iter()
                .map(|b| BoardMember::admin(b.id.clone(), user_id))
                .collect()
        } else {
            Vec::new()
        };

        let mut tx = self.db.begin_immediate().await?;
        insert_all(&mut tx, &boards, &blocks, &members).await?;
        commit(tx).await?;

        info!(
            user_id,
            boards = boards.len(),
            blocks = blocks.len(),
            members = members.len(),
            "created boards and blocks"
        );
        Ok(BoardsAndBlocksWithMembers {
            boards,
            blocks,
            members,
        })
    }

    // ========== Update Operations ==========

    /// Apply board and block patches together.
    ///
    /// Every block named must belong to one of the boards named, whether or
    /// not its own patch changes anything. Mismatched ID and patch arrays
    /// are rejected before storage is consulted.
    pub async fn patch_boards_and_blocks(
        &self,
        patch: PatchBoardsAndBlocks,
        user_id: &str,
    ) -> Result<BoardsAndBlocks> {
        validate_patch(&patch, self.limits)
            .inspect_err(|e| warn!(user_id, error = %e, "rejected patch batch"))?;

        let mut tx = self.db.begin_immediate().await?;
        let mut boards = Vec::with_capacity(patch.board_ids.len());
        for id in &patch.board_ids {
            boards.push(BoardRepository::fetch_required(&mut *tx, id).await?);
        }

        let board_ids: HashSet<&str> = patch.board_ids.iter().map(String::as_str).collect();
        let mut blocks = load_blocks(&mut tx, &patch.block_ids).await?;
        for block in &blocks {
            check_block_in_boards(block, &board_ids)
                .inspect_err(|e| warn!(user_id, error = %e, "rejected patch batch"))?;
        }

        let now = now_millis();
        for (board, board_patch) in boards.iter_mut().zip(&patch.board_patches) {
            board_patch.apply(board);
            board.modified_by = user_id.to_string();
            board.update_at = now;
        }
        for (block, block_patch) in blocks.iter_mut().zip(&patch.block_patches) {
            block_patch.apply(block);
            block.modified_by = user_id.to_string();
            block.update_at = now;
        }

        for board in &boards {
            BoardRepository::update(&mut *tx, board).await?;
        }
        for block in &blocks {
            BlockRepository::update(&mut *tx, block).await?;
        }
        commit(tx).await?;

        info!(
            user_id,
            boards = boards.len(),
            blocks = blocks.len(),
            "patched boards and blocks"
        );
        Ok(BoardsAndBlocks::new(boards, blocks))
    }

    // ========== Delete Operations ==========

    /// Soft-delete boards and blocks together.
    ///
    /// Deleting a board also removes its memberships, its sharing record and
    /// its place in every user's categories.
    pub async fn delete_boards_and_blocks(
        &self,
        delete: DeleteBoardsAndBlocks,
        user_id: &str,
    ) -> Result<()> {
        validate_delete(&delete, self.limits)
            .inspect_err(|e| warn!(user_id, error = %e, "rejected delete batch"))?;

        let mut tx = self.db.begin_immediate().await?;
        for id in &delete.boards {
            BoardRepository::fetch_required(&mut *tx, id).await?;
        }

        let board_ids: HashSet<&str> = delete.boards.iter().map(String::as_str).collect();
        let blocks = load_blocks(&mut tx, &delete.blocks).await?;
        for block in &blocks {
            check_block_in_boards(block, &board_ids)
                .inspect_err(|e| warn!(user_id, error = %e, "rejected delete batch"))?;
        }

        let now = now_millis();
        for block in &blocks {
            BlockRepository::soft_delete(&mut *tx, &block.id, user_id, now).await?;
        }
        for id in &delete.boards {
            BoardRepository::soft_delete(&mut *tx, id, user_id, now).await?;
            MemberRepository::delete_for_board(&mut *tx, id).await?;
            SharingRepository::delete_for_board(&mut *tx, id).await?;
            CategoryRepository::remove_board_everywhere(&mut *tx, id).await?;
        }
        commit(tx).await?;

        info!(
            user_id,
            boards = delete.boards.len(),
            blocks = blocks.len(),
            "deleted boards and blocks"
        );
        Ok(())
    }

    /// Restore a soft-deleted board and make `user_id` its admin.
    ///
    /// Memberships are removed when a board is deleted, so the restoring
    /// user is the only member afterwards.
    pub async fn undelete_board(&self, board_id: &str, user_id: &str) -> Result<Board> {
        let mut tx = self.db.begin_immediate().await?;
        let board = BoardRepository::fetch_including_deleted(&mut *tx, board_id)
            .await?
            .ok_or_else(|| TaskboardError::not_found(format!("board {board_id}")))?;
        if board.is_active() {
            return Err(TaskboardError::bad_request(format!(
                "board {board_id} is not deleted"
            )));
        }

        BoardRepository::undelete(&mut *tx, board_id, user_id, now_millis()).await?;
        MemberRepository::save(&mut *tx, &BoardMember::admin(board_id, user_id)).await?;
        let restored = BoardRepository::fetch_required(&mut *tx, board_id).await?;
        commit(tx).await?;

        info!(user_id, board_id, "restored board");
        Ok(restored)
    }

    /// Restore a soft-deleted block on an active board.
    pub async fn undelete_block(&self, block_id: &str, user_id: &str) -> Result<Block> {
        let mut tx = self.db.begin_immediate().await?;
        let block = BlockRepository::fetch_including_deleted(&mut *tx, block_id)
            .await?
            .ok_or_else(|| TaskboardError::not_found(format!("block {block_id}")))?;
        if block.is_active() {
            return Err(TaskboardError::bad_request(format!(
                "block {block_id} is not deleted"
            )));
        }
        BoardRepository::fetch_required(&mut *tx, &block.board_id).await?;

        BlockRepository::undelete(&mut *tx, block_id, user_id, now_millis()).await?;
        let restored = BlockRepository::fetch_including_deleted(&mut *tx, block_id)
            .await?
            .ok_or_else(|| TaskboardError::not_found(format!("block {block_id}")))?;
        commit(tx).await?;

        info!(user_id, block_id, "restored block");
        Ok(restored)
    }

    // ========== Duplicate Operations ==========

    /// Copy a board and its active blocks under fresh IDs.
    ///
    /// The copy lands in `team_id` (the source team when empty), is not
    /// linked to any channel and has `user_id` as its only member, as admin.
    pub async fn duplicate_board(
        &self,
        board_id: &str,
        user_id: &str,
        team_id: &str,
        as_template: bool,
    ) -> Result<BoardsAndBlocksWithMembers> {
        let mut tx = self.db.begin_immediate().await?;
        let source = BoardRepository::fetch_required(&mut *tx, board_id).await?;
        let source_blocks = BlockRepository::fetch_for_board(&mut *tx, board_id).await?;

        let now = now_millis();
        let new_board_id = new_id();
        let board_ids = HashMap::from([(source.id.clone(), new_board_id.clone())]);
        let block_ids: HashMap<String, String> = source_blocks
            .iter()
            .map(|b| (b.id.clone(), new_id()))
            .collect();

        let mut board = source;
        board.id = new_board_id;
        if !team_id.is_empty() {
            board.team_id = team_id.to_string();
        }
        board.channel_id = None;
        board.is_template = as_template;
        let board = stamp_new_board(board, user_id, now);

        let mut blocks = source_blocks;
        remap_blocks(&mut blocks, &board_ids, &block_ids);
        let blocks: Vec<Block> = blocks
            .into_iter()
            .map(|block| stamp_new_block(block, user_id, now))
            .collect();

        let members = vec![BoardMember::admin(board.id.clone(), user_id)];
        let boards = vec![board];

        insert_all(&mut tx, &boards, &blocks, &members).await?;
        commit(tx).await?;

        info!(
            user_id,
            source = board_id,
            board_id = %boards[0].id,
            blocks = blocks.len(),
            as_template,
            "duplicated board"
        );
        Ok(BoardsAndBlocksWithMembers {
            boards,
            blocks,
            members,
        })
    }
}

/// Load active blocks by ID inside a transaction, failing on the first one
/// missing.
async fn load_blocks(tx: &mut DbTransaction, ids: &[String]) -> Result<Vec<Block>> {
    let found = BlockRepository::fetch_many(&mut **tx, ids).await?;
    let mut by_id: HashMap<String, Block> =
        found.into_iter().map(|b| (b.id.clone(), b)).collect();
    ids.iter()
        .map(|id| {
            by_id
                .remove(id)
                .ok_or_else(|| TaskboardError::not_found(format!("block {id}")))
        })
        .collect()
}

fn check_block_in_boards(block: &Block, board_ids: &HashSet<&str>) -> Result<()> {
    if board_ids.contains(block.board_id.as_str()) {
        return Ok(());
    }
    Err(TaskboardError::bad_request(format!(
        "block {} belongs to board {}, which is not part of the request",
        block.id, block.board_id
    )))
}

fn stamp_new_board(mut board: Board, user_id: &str, now: i64) -> Board {
    board.created_by = user_id.to_string();
    board.modified_by = user_id.to_string();
    board.create_at = now;
    board.update_at = now;
    board.delete_at = None;
    board
}

fn stamp_new_block(mut block: Block, user_id: &str, now: i64) -> Block {
    block.created_by = user_id.to_string();
    block.modified_by = user_id.to_string();
    block.create_at = now;
    block.update_at = now;
    block.delete_at = None;
    block
}

async fn insert_all(
    tx: &mut DbTransaction,
    boards: &[Board],
    blocks: &[Block],
    members: &[BoardMember],
) -> Result<()> {
    for board in boards {
        BoardRepository::insert(&mut **tx, board).await?;
    }
    for block in blocks {
        BlockRepository::insert(&mut **tx, block).await?;
    }
    for member in members {
        MemberRepository::save(&mut **tx, member).await?;
    }
    Ok(())
}

async fn commit(tx: DbTransaction) -> Result<()> {
    tx.commit()
        .await
        .map_err(|e| TaskboardError::Database(e.to_string()))
}
