//! Effective role resolution.
//!
//! A user's membership on a board is resolved in order:
//!
//! 1. A stored membership row is returned as-is.
//! 2. The service account and guest users get nothing further.
//! 3. On a board linked to a channel, channel members become synthetic editors.
//! 4. On an open template, team members become synthetic viewers.
//!
//! Synthetic roles are raised to the board's minimum role. Explicit rows
//! are not.

use tracing::debug;

use super::directory::{membership_lookup, HostDirectory};
use super::membership::Membership;
use super::system_account::SystemAccount;
use crate::board::{BoardRepository, BoardType, MemberRepository};
use crate::db::Database;
use crate::{Result, TaskboardError};

/// Computes effective memberships from storage and the host directory.
pub struct RoleResolver<'a> {
    db: &'a Database,
    directory: &'a dyn HostDirectory,
    system_account: &'a SystemAccount,
}

impl<'a> RoleResolver<'a> {
    pub fn new(
        db: &'a Database,
        directory: &'a dyn HostDirectory,
        system_account: &'a SystemAccount,
    ) -> Self {
        Self {
            db,
            directory,
            system_account,
        }
    }

    /// Resolve the membership of `user_id` on `board_id`.
    ///
    /// Returns `NotFound` when the user has no membership of any kind.
    /// Host transport failures propagate unchanged.
    pub async fn resolve(&self, user_id: &str, board_id: &str) -> Result<Membership> {
        let members = MemberRepository::new(self.db.pool());
        if let Some(member) = members.get_for_board(board_id, user_id).await? {
            return Ok(Membership::Explicit(member));
        }

        let no_membership =
            || TaskboardError::not_found(format!("membership of {user_id} on board {board_id}"));

        if self.system_account.matches(user_id, self.directory).await? {
            debug!(user_id, board_id, "no synthetic membership for the service account");
            return Err(no_membership());
        }

        let user = match self.directory.get_user(user_id).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => return Err(no_membership()),
            Err(e) => return Err(e),
        };
        if user.is_guest {
            debug!(user_id, board_id, "no synthetic membership for guests");
            return Err(no_membership());
        }

        let board = BoardRepository::new(self.db.pool()).require(board_id).await?;

        if let Some(channel_id) = board.channel_id.as_deref().filter(|c| !c.is_empty()) {
            let lookup = self.directory.get_channel_member(channel_id, user_id).await;
            if membership_lookup(lookup)?.is_some() {
                debug!(user_id, board_id, channel_id, "synthetic channel membership");
                return Ok(Membership::channel(&board, user_id));
            }
        }

        if board.board_type == BoardType::Open && board.is_template {
            let lookup = self.directory.get_team_member(&board.team_id, user_id).await;
            if membership_lookup(lookup)?.is_some() {
                debug!(user_id, board_id, team_id = %board.team_id, "synthetic template membership");
                return Ok(Membership::team_template(&board, user_id));
            }
        }

        Err(no_membership())
    }
}
