//! Batch mutations for TASKBOARD.
//!
//! Boards and blocks are created, patched, deleted and duplicated in
//! batches. A batch is validated as a whole and written in one transaction,
//! so either every entity in it changes or none does.

mod engine;
mod types;
mod validation;

pub use engine::BatchMutationEngine;
pub use types::{
    BoardsAndBlocks, BoardsAndBlocksWithMembers, DeleteBoardsAndBlocks, PatchBoardsAndBlocks,
    CONTENT_ORDER_FIELD,
};
pub use validation::{validate_create, validate_delete, validate_patch};
