//! Effective memberships.

use serde::Serialize;

use super::role::{BoardMember, SchemeRole};
use crate::board::Board;

/// The effective membership of a user on a board.
///
/// Only [`Membership::Explicit`] corresponds to a stored row. The synthetic
/// variants are computed on every resolution and cannot be saved; the
/// absence of any membership is reported as a `NotFound` error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum Membership {
    /// A stored membership row.
    Explicit(BoardMember),
    /// Granted by membership in the channel the board is linked to.
    #[serde(rename_all = "camelCase")]
    SyntheticChannel {
        board_id: String,
        user_id: String,
        role: SchemeRole,
    },
    /// Granted by team membership on an open template.
    #[serde(rename_all = "camelCase")]
    SyntheticTeamTemplate {
        board_id: String,
        user_id: String,
        role: SchemeRole,
    },
}

impl Membership {
    /// Synthetic channel membership: editor, raised to the board's floor.
    pub fn channel(board: &Board, user_id: &str) -> Self {
        Membership::SyntheticChannel {
            board_id: board.id.clone(),
            user_id: user_id.to_string(),
            role: synthetic_role(SchemeRole::Editor, board.minimum_role),
        }
    }

    /// Synthetic template membership: viewer, raised to the board's floor.
    pub fn team_template(board: &Board, user_id: &str) -> Self {
        Membership::SyntheticTeamTemplate {
            board_id: board.id.clone(),
            user_id: user_id.to_string(),
            role: synthetic_role(SchemeRole::Viewer, board.minimum_role),
        }
    }

    pub fn role(&self) -> SchemeRole {
        match self {
            Membership::Explicit(member) => member.role,
            Membership::SyntheticChannel { role, .. }
            | Membership::SyntheticTeamTemplate { role, .. } => *role,
        }
    }

    pub fn board_id(&self) -> &str {
        match self {
            Membership::Explicit(member) => &member.board_id,
            Membership::SyntheticChannel { board_id, .. }
            | Membership::SyntheticTeamTemplate { board_id, .. } => board_id,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Membership::Explicit(member) => &member.user_id,
            Membership::SyntheticChannel { user_id, .. }
            | Membership::SyntheticTeamTemplate { user_id, .. } => user_id,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        !matches!(self, Membership::Explicit(_))
    }

    /// Flatten into a member record, marked synthetic where applicable.
    pub fn to_board_member(&self) -> BoardMember {
        match self {
            Membership::Explicit(member) => member.clone(),
            _ => BoardMember {
                board_id: self.board_id().to_string(),
                user_id: self.user_id().to_string(),
                roles: String::new(),
                role: self.role(),
                synthetic: true,
            },
        }
    }
}

/// Raise a derived synthetic role to the board's minimum role.
///
/// The floor never exceeds editor, even if storage holds something higher.
pub(crate) fn synthetic_role(derived: SchemeRole, minimum_role: SchemeRole) -> SchemeRole {
    derived.max(minimum_role.min(SchemeRole::Editor))
}
