//! Structural checks run before a batch touches storage.
//!
//! Everything here is pure: a batch that fails these checks is rejected
//! without a single read or write.

use std::collections::HashSet;

use crate::board::{BlockPatch, Board, BoardPatch};
use crate::config::BoardsConfig;
use crate::permission::SchemeRole;
use crate::{Result, TaskboardError};

use super::types::{BoardsAndBlocks, DeleteBoardsAndBlocks, PatchBoardsAndBlocks};

fn check_batch_size(count: usize, limits: &BoardsConfig) -> Result<()> {
    if count > limits.max_batch_entities {
        return Err(TaskboardError::bad_request(format!(
            "batch holds {count} entities, at most {} allowed",
            limits.max_batch_entities
        )));
    }
    Ok(())
}

fn check_title(kind: &str, id: &str, title: &str, limits: &BoardsConfig) -> Result<()> {
    if title.chars().count() > limits.max_title_length {
        return Err(TaskboardError::SizeLimitExceeded(format!(
            "title of {kind} {id} is longer than {} characters",
            limits.max_title_length
        )));
    }
    Ok(())
}

fn check_description(id: &str, description: &str, limits: &BoardsConfig) -> Result<()> {
    if description.chars().count() > limits.max_description_length {
        return Err(TaskboardError::SizeLimitExceeded(format!(
            "description of board {id} is longer than {} characters",
            limits.max_description_length
        )));
    }
    Ok(())
}

fn check_minimum_role(id: &str, role: SchemeRole) -> Result<()> {
    if !role.is_valid_minimum_role() {
        return Err(TaskboardError::bad_request(format!(
            "minimum role of board {id} cannot be {role}"
        )));
    }
    Ok(())
}

fn check_ids<'a>(kind: &str, ids: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.is_empty() {
            return Err(TaskboardError::bad_request(format!("{kind} with an empty ID")));
        }
        if !seen.insert(id) {
            return Err(TaskboardError::bad_request(format!("duplicate {kind} ID {id}")));
        }
    }
    Ok(())
}

fn check_board(board: &Board, limits: &BoardsConfig) -> Result<()> {
    check_title("board", &board.id, &board.title, limits)?;
    check_description(&board.id, &board.description, limits)?;
    check_minimum_role(&board.id, board.minimum_role)
}

/// Validate a bundle of boards and blocks to be created.
pub fn validate_create(bundle: &BoardsAndBlocks, limits: &BoardsConfig) -> Result<()> {
    let Some(first) = bundle.boards.first() else {
        return Err(TaskboardError::bad_request("at least one board is required"));
    };
    check_batch_size(bundle.len(), limits)?;
    check_ids(
        "entity",
        bundle
            .boards
            .iter()
            .map(|b| b.id.as_str())
            .chain(bundle.blocks.iter().map(|b| b.id.as_str())),
    )?;

    for board in &bundle.boards {
        if board.team_id != first.team_id {
            return Err(TaskboardError::bad_request(format!(
                "board {} is in team {}, expected {}",
                board.id, board.team_id, first.team_id
            )));
        }
        check_board(board, limits)?;
    }

    let board_ids: HashSet<&str> = bundle.boards.iter().map(|b| b.id.as_str()).collect();
    for block in &bundle.blocks {
        if !board_ids.contains(block.board_id.as_str()) {
            return Err(TaskboardError::bad_request(format!(
                "block {} belongs to board {}, which is not part of the batch",
                block.id, block.board_id
            )));
        }
        check_title("block", &block.id, &block.title, limits)?;
    }
    Ok(())
}

fn check_board_patch(id: &str, patch: &BoardPatch, limits: &BoardsConfig) -> Result<()> {
    if let Some(ref title) = patch.title {
        check_title("board", id, title, limits)?;
    }
    if let Some(ref description) = patch.description {
        check_description(id, description, limits)?;
    }
    if let Some(role) = patch.minimum_role {
        check_minimum_role(id, role)?;
    }
    Ok(())
}

fn check_block_patch(id: &str, patch: &BlockPatch, limits: &BoardsConfig) -> Result<()> {
    if let Some(ref title) = patch.title {
        check_title("block", id, title, limits)?;
    }
    Ok(())
}

/// Validate the shape of a patch batch.
pub fn validate_patch(patch: &PatchBoardsAndBlocks, limits: &BoardsConfig) -> Result<()> {
    if patch.board_ids.len() != patch.board_patches.len() {
        return Err(TaskboardError::bad_request(format!(
            "{} board IDs but {} board patches",
            patch.board_ids.len(),
            patch.board_patches.len()
        )));
    }
    if patch.block_ids.len() != patch.block_patches.len() {
        return Err(TaskboardError::bad_request(format!(
            "{} block IDs but {} block patches",
            patch.block_ids.len(),
            patch.block_patches.len()
        )));
    }
    if patch.is_empty() {
        return Err(TaskboardError::bad_request("nothing to patch"));
    }
    if patch.board_ids.is_empty() {
        return Err(TaskboardError::bad_request(
            "block patches need the IDs of their boards",
        ));
    }
    check_batch_size(patch.len(), limits)?;
    check_ids("board", patch.board_ids.iter().map(String::as_str))?;
    check_ids("block", patch.block_ids.iter().map(String::as_str))?;

    for (id, board_patch) in patch.board_ids.iter().zip(&patch.board_patches) {
        check_board_patch(id, board_patch, limits)?;
    }
    for (id, block_patch) in patch.block_ids.iter().zip(&patch.block_patches) {
        check_block_patch(id, block_patch, limits)?;
    }
    Ok(())
}

/// Validate the shape of a delete batch.
pub fn validate_delete(delete: &DeleteBoardsAndBlocks, limits: &BoardsConfig) -> Result<()> {
    if delete.is_empty() {
        return Err(TaskboardError::bad_request("nothing to delete"));
    }
    if delete.boards.is_empty() {
        return Err(TaskboardError::bad_request(
            "blocks can only be deleted together with their boards",
        ));
    }
    check_batch_size(delete.len(), limits)?;
    check_ids("board", delete.boards.iter().map(String::as_str))?;
    check_ids("block", delete.blocks.iter().map(String::as_str))
}
