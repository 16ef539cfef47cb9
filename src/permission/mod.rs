//! Board permissions for TASKBOARD.
//!
//! This module decides what a user may do on a board:
//! - Scheme roles and explicit membership records
//! - Synthetic memberships derived from channel and team membership
//! - The host directory the derivation consults
//! - Permission checks and board visibility predicates

mod directory;
mod membership;
mod resolver;
mod role;
mod service;
mod system_account;

pub use directory::{ChannelMember, HostDirectory, HostUser, MemoryDirectory, TeamMember};
pub use membership::Membership;
pub use resolver::RoleResolver;
pub use role::{BoardMember, SchemeFlags, SchemeRole};
pub use service::{Permission, PermissionService, VisibleBoardsQuery};
pub use system_account::SystemAccount;
