//! Scheme roles and membership records.
//!
//! Roles are totally ordered `none < viewer < commenter < editor < admin`
//! and compared by their ordinal. Persisted membership rows carry four
//! boolean scheme flags; [`SchemeFlags`] converts between the two forms at
//! the storage boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Access level of a user on a board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SchemeRole {
    /// No access. As a board minimum role this means "no floor".
    #[default]
    #[serde(rename = "", alias = "none")]
    None = 0,
    /// Read-only access.
    Viewer = 1,
    /// May read and comment.
    Commenter = 2,
    /// May change cards, properties and non-admin membership.
    Editor = 3,
    /// Full control of the board.
    Admin = 4,
}

impl SchemeRole {
    /// Ordinal rank used for every comparison.
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    /// Convert to the persisted string representation.
    ///
    /// `None` is stored as the empty string, matching the board
    /// `minimum_role` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeRole::None => "",
            SchemeRole::Viewer => "viewer",
            SchemeRole::Commenter => "commenter",
            SchemeRole::Editor => "editor",
            SchemeRole::Admin => "admin",
        }
    }

    /// Check if this role grants at least the required level.
    pub fn can_access(&self, required: SchemeRole) -> bool {
        *self >= required
    }

    /// Whether the role is acceptable as a board minimum role.
    ///
    /// A board floor can never hand out admin rights.
    pub fn is_valid_minimum_role(&self) -> bool {
        *self != SchemeRole::Admin
    }
}

impl fmt::Display for SchemeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemeRole::None => write!(f, "none"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

impl FromStr for SchemeRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "none" => Ok(SchemeRole::None),
            "viewer" => Ok(SchemeRole::Viewer),
            "commenter" => Ok(SchemeRole::Commenter),
            "editor" => Ok(SchemeRole::Editor),
            "admin" => Ok(SchemeRole::Admin),
            _ => Err(format!("unknown scheme role: {s}")),
        }
    }
}

/// The four persisted scheme flags of a membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchemeFlags {
    pub admin: bool,
    pub editor: bool,
    pub commenter: bool,
    pub viewer: bool,
}

impl SchemeFlags {
    /// The highest flag set wins.
    pub fn role(&self) -> SchemeRole {
        if self.admin {
            SchemeRole::Admin
        } else if self.editor {
            SchemeRole::Editor
        } else if self.commenter {
            SchemeRole::Commenter
        } else if self.viewer {
            SchemeRole::Viewer
        } else {
            SchemeRole::None
        }
    }
}

impl From<SchemeRole> for SchemeFlags {
    fn from(role: SchemeRole) -> Self {
        Self {
            admin: role == SchemeRole::Admin,
            editor: role == SchemeRole::Editor,
            commenter: role == SchemeRole::Commenter,
            viewer: role == SchemeRole::Viewer,
        }
    }
}

/// A membership of a user on a board.
///
/// Rows read from storage have `synthetic == false`. Synthetic members are
/// projections computed by the role resolver and are never written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardMember {
    pub board_id: String,
    pub user_id: String,
    /// Free-form custom roles carried alongside the scheme role.
    #[serde(default)]
    pub roles: String,
    pub role: SchemeRole,
    #[serde(default)]
    pub synthetic: bool,
}

impl BoardMember {
    /// Create an explicit membership.
    pub fn new(board_id: impl Into<String>, user_id: impl Into<String>, role: SchemeRole) -> Self {
        Self {
            board_id: board_id.into(),
            user_id: user_id.into(),
            roles: String::new(),
            role,
            synthetic: false,
        }
    }

    /// Create an explicit admin membership.
    pub fn admin(board_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::new(board_id, user_id, SchemeRole::Admin)
    }

    /// Scheme flags for persistence.
    pub fn flags(&self) -> SchemeFlags {
        SchemeFlags::from(self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_ordering() {
        assert_eq!(SchemeRole::None.rank(), 0);
        assert_eq!(SchemeRole::Viewer.rank(), 1);
        assert_eq!(SchemeRole::Commenter.rank(), 2);
        assert_eq!(SchemeRole::Editor.rank(), 3);
        assert_eq!(SchemeRole::Admin.rank(), 4);

        assert!(SchemeRole::None < SchemeRole::Viewer);
        assert!(SchemeRole::Viewer < SchemeRole::Commenter);
        assert!(SchemeRole::Commenter < SchemeRole::Editor);
        assert!(SchemeRole::Editor < SchemeRole::Admin);
        assert_eq!(SchemeRole::Viewer.max(SchemeRole::Editor), SchemeRole::Editor);
    }

    #[test]
    fn test_can_access() {
        assert!(SchemeRole::Admin.can_access(SchemeRole::Editor));
        assert!(SchemeRole::Editor.can_access(SchemeRole::Editor));
        assert!(!SchemeRole::Commenter.can_access(SchemeRole::Editor));
        assert!(SchemeRole::None.can_access(SchemeRole::None));
        assert!(!SchemeRole::None.can_access(SchemeRole::Viewer));
    }

    #[test]
    fn test_from_str() {
        assert_eq!(SchemeRole::from_str("").unwrap(), SchemeRole::None);
        assert_eq!(SchemeRole::from_str("none").unwrap(), SchemeRole::None);
        assert_eq!(SchemeRole::from_str("Viewer").unwrap(), SchemeRole::Viewer);
        assert_eq!(SchemeRole::from_str("commenter").unwrap(), SchemeRole::Commenter);
        assert_eq!(SchemeRole::from_str("EDITOR").unwrap(), SchemeRole::Editor);
        assert_eq!(SchemeRole::from_str("admin").unwrap(), SchemeRole::Admin);
        assert!(SchemeRole::from_str("owner").is_err());
    }

    #[test]
    fn test_as_str_and_display() {
        assert_eq!(SchemeRole::None.as_str(), "");
        assert_eq!(SchemeRole::Editor.as_str(), "editor");
        assert_eq!(format!("{}", SchemeRole::None), "none");
        assert_eq!(format!("{}", SchemeRole::Commenter), "commenter");
    }

    #[test]
    fn test_minimum_role_validity() {
        assert!(SchemeRole::None.is_valid_minimum_role());
        assert!(SchemeRole::Editor.is_valid_minimum_role());
        assert!(!SchemeRole::Admin.is_valid_minimum_role());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&SchemeRole::None).unwrap(), "\"\"");
        assert_eq!(serde_json::to_string(&SchemeRole::Viewer).unwrap(), "\"viewer\"");
        let role: SchemeRole = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(role, SchemeRole::None);
        assert!(serde_json::from_str::<SchemeRole>("\"superuser\"").is_err());
    }

    #[test]
    fn test_flags_highest_wins() {
        let flags = SchemeFlags {
            admin: false,
            editor: true,
            commenter: true,
            viewer: true,
        };
        assert_eq!(flags.role(), SchemeRole::Editor);

        let flags = SchemeFlags {
            admin: true,
            editor: false,
            commenter: false,
            viewer: true,
        };
        assert_eq!(flags.role(), SchemeRole::Admin);

        assert_eq!(SchemeFlags::default().role(), SchemeRole::None);
    }

    #[test]
    fn test_flags_from_role() {
        for role in [
            SchemeRole::None,
            SchemeRole::Viewer,
            SchemeRole::Commenter,
            SchemeRole::Editor,
            SchemeRole::Admin,
        ] {
            assert_eq!(SchemeFlags::from(role).role(), role);
        }
    }

    #[test]
    fn test_board_member_admin() {
        let member = BoardMember::admin("b1", "u1");
        assert_eq!(member.role, SchemeRole::Admin);
        assert!(!member.synthetic);
        assert!(member.flags().admin);
        assert!(!member.flags().viewer);
    }
}
