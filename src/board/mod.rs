//! Board module for TASKBOARD.
//!
//! This module holds the persisted entities and their repositories:
//! - Boards (open or private, optionally linked to a channel, optionally a template)
//! - Blocks, the content of a board
//! - Explicit board memberships
//! - Sharing tokens and sidebar categories, removed together with their board

mod block;
mod block_repository;
mod category;
mod member_repository;
mod repository;
mod sharing;
mod types;

pub use block::{Block, BlockPatch, BlockType};
pub use block_repository::BlockRepository;
pub use category::{Category, CategoryRepository};
pub use member_repository::MemberRepository;
pub use repository::BoardRepository;
pub use sharing::{generate_token, Sharing, SharingRepository};
pub use types::{Board, BoardPatch, BoardType};
