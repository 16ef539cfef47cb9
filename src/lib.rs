//! TASKBOARD - board permissions and batch mutations
//!
//! The core of a kanban-style boards service embedded in a chat platform:
//! role resolution over explicit and channel/team-derived memberships, and
//! all-or-nothing batch mutations of boards and blocks.

pub mod app;
pub mod batch;
pub mod board;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod ids;
pub mod logging;
pub mod permission;

pub use app::BoardsApp;
pub use batch::{
    BatchMutationEngine, BoardsAndBlocks, BoardsAndBlocksWithMembers, DeleteBoardsAndBlocks,
    PatchBoardsAndBlocks,
};
pub use board::{Block, BlockPatch, BlockType, Board, BoardPatch, BoardType};
pub use config::{BoardsConfig, Config};
pub use db::Database;
pub use error::{Result, TaskboardError};
pub use permission::{
    BoardMember, HostDirectory, Membership, MemoryDirectory, Permission, PermissionService,
    RoleResolver, SchemeRole, SystemAccount,
};
