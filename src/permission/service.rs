//! Permission decisions and board visibility.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::directory::{membership_lookup, HostDirectory};
use super::membership::Membership;
use super::resolver::RoleResolver;
use super::role::SchemeRole;
use super::system_account::SystemAccount;
use crate::board::{Board, BoardRepository, BoardType, MemberRepository};
use crate::db::Database;
use crate::Result;

/// Actions that can be checked against a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewBoard,
    CommentBoardCards,
    ManageBoardCards,
    ManageBoardProperties,
    ManageBoardMembers,
    DeleteBoard,
    ShareBoard,
    ManageBoardRoles,
    ManageBoardType,
    DeleteOthersComments,
}

impl Permission {
    /// The lowest role that grants this permission.
    pub fn required_role(&self) -> SchemeRole {
        match self {
            Permission::ViewBoard => SchemeRole::Viewer,
            Permission::CommentBoardCards => SchemeRole::Commenter,
            Permission::ManageBoardCards
            | Permission::ManageBoardProperties
            | Permission::ManageBoardMembers => SchemeRole::Editor,
            Permission::DeleteBoard
            | Permission::ShareBoard
            | Permission::ManageBoardRoles
            | Permission::ManageBoardType
            | Permission::DeleteOthersComments => SchemeRole::Admin,
        }
    }

    /// Whether `role` grants this permission.
    pub fn is_granted_to(&self, role: SchemeRole) -> bool {
        role.can_access(self.required_role())
    }
}

/// Predicate selecting the boards of a team a user may see.
///
/// A board matches when the user has an explicit membership, when it is
/// linked to one of `channel_ids`, or, if `include_public_templates` is set,
/// when it is an open template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleBoardsQuery {
    pub user_id: String,
    pub team_id: String,
    pub channel_ids: Vec<String>,
    pub include_public_templates: bool,
}

/// Answers permission questions for (user, board) pairs.
pub struct PermissionService<'a> {
    db: &'a Database,
    directory: &'a dyn HostDirectory,
    system_account: &'a SystemAccount,
}

impl<'a> PermissionService<'a> {
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

    fn resolver(&self) -> RoleResolver<'a> {
        RoleResolver::new(self.db, self.directory, self.system_account)
    }

    /// Resolve the effective membership of a user on a board.
    pub async fn membership(&self, user_id: &str, board_id: &str) -> Result<Membership> {
        self.resolver().resolve(user_id, board_id).await
    }

    /// Check whether a user may perform `permission` on a board.
    ///
    /// No membership means no permission. Lookup failures are logged and
    /// also answer `false`.
    pub async fn has_permission(
        &self,
        user_id: &str,
        board_id: &str,
        permission: Permission,
    ) -> bool {
        match self.resolver().resolve(user_id, board_id).await {
            Ok(membership) => permission.is_granted_to(membership.role()),
            Err(e) if e.is_not_found() => false,
            Err(e) => {
                warn!(user_id, board_id, ?permission, error = %e, "permission check failed");
                false
            }
        }
    }

    /// Build the visibility predicate for a user in a team.
    ///
    /// Guests only see boards they are explicit members of. Open templates
    /// are included when the caller opts in and the user belongs to the team.
    pub async fn visible_boards_query(
        &self,
        user_id: &str,
        team_id: &str,
        include_public: bool,
    ) -> Result<VisibleBoardsQuery> {
        let mut query = VisibleBoardsQuery {
            user_id: user_id.to_string(),
            team_id: team_id.to_string(),
            channel_ids: Vec::new(),
            include_public_templates: false,
        };

        if self.system_account.matches(user_id, self.directory).await? {
            return Ok(query);
        }
        let user = match self.directory.get_user(user_id).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => return Ok(query),
            Err(e) => return Err(e),
        };
        if user.is_guest {
            return Ok(query);
        }

        query.channel_ids = self
            .directory
            .list_channel_ids_for_user(user_id, team_id)
            .await?;
        if include_public {
            let lookup = self.directory.get_team_member(team_id, user_id).await;
            query.include_public_templates = membership_lookup(lookup)?.is_some();
        }
        Ok(query)
    }

    /// List the active boards of a team visible to a user.
    pub async fn visible_boards(
        &self,
        user_id: &str,
        team_id: &str,
        include_public: bool,
    ) -> Result<Vec<Board>> {
        let query = self
            .visible_boards_query(user_id, team_id, include_public)
            .await?;
        BoardRepository::new(self.db.pool()).list_visible(&query).await
    }

    /// Every membership of a user on the active boards of a team.
    ///
    /// A board reachable both explicitly and synthetically appears once,
    /// with the explicit membership. Results are ordered by board ID.
    pub async fn memberships_for_user(
        &self,
        user_id: &str,
        team_id: &str,
        include_public: bool,
    ) -> Result<Vec<Membership>> {
        let explicit = MemberRepository::new(self.db.pool())
            .list_for_user(user_id, team_id)
            .await?;
        let explicit_boards: HashSet<String> =
            explicit.iter().map(|m| m.board_id.clone()).collect();

        let query = self
            .visible_boards_query(user_id, team_id, include_public)
            .await?;
        let channels: HashSet<&str> = query.channel_ids.iter().map(String::as_str).collect();
        let boards = BoardRepository::new(self.db.pool()).list_visible(&query).await?;

        let mut memberships: Vec<Membership> =
            explicit.into_iter().map(Membership::Explicit).collect();
        for board in boards {
            if explicit_boards.contains(&board.id) {
                continue;
            }
            let in_channel = board
                .channel_id
                .as_deref()
                .is_some_and(|c| channels.contains(c));
            if in_channel {
                memberships.push(Membership::channel(&board, user_id));
            } else if query.include_public_templates
                && board.board_type == BoardType::Open
                && board.is_template
            {
                memberships.push(Membership::team_template(&board, user_id));
            }
        }

        memberships.sort_by(|a, b| a.board_id().cmp(b.board_id()));
        Ok(memberships)
    }
}
