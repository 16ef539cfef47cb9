//! Board membership repository for TASKBOARD.
//!
//! Membership rows persist the four scheme flags; they are collapsed into a
//! single [`SchemeRole`] when read.

use sqlx::SqliteExecutor;

use crate::db::DbPool;
use crate::permission::{BoardMember, SchemeFlags};
use crate::{Result, TaskboardError};

/// Repository for explicit board memberships.
pub struct MemberRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> MemberRepository<'a> {
    /// Create a new MemberRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Get the explicit membership of a user on a board.
    pub async fn get_for_board(&self, board_id: &str, user_id: &str) -> Result<Option<BoardMember>> {
        let row: Option<MemberRow> = sqlx::query_as(
            "SELECT board_id, user_id, roles, scheme_admin, scheme_editor, scheme_commenter, scheme_viewer
             FROM board_members WHERE board_id = ? AND user_id = ?",
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(MemberRow::into_member))
    }

    /// List the explicit members of a board.
    pub async fn list_for_board(&self, board_id: &str) -> Result<Vec<BoardMember>> {
        let rows: Vec<MemberRow> = sqlx::query_as(
            "SELECT board_id, user_id, roles, scheme_admin, scheme_editor, scheme_commenter, scheme_viewer
             FROM board_members WHERE board_id = ? ORDER BY user_id",
        )
        .bind(board_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(MemberRow::into_member).collect())
    }

    /// List a user's explicit memberships on active boards of a team.
    pub async fn list_for_user(&self, user_id: &str, team_id: &str) -> Result<Vec<BoardMember>> {
        let rows: Vec<MemberRow> = sqlx::query_as(
            "SELECT m.board_id, m.user_id, m.roles, m.scheme_admin, m.scheme_editor,
                    m.scheme_commenter, m.scheme_viewer
             FROM board_members m
             JOIN boards b ON b.id = m.board_id
             WHERE m.user_id = ? AND b.team_id = ? AND b.delete_at IS NULL
             ORDER BY m.board_id",
        )
        .bind(user_id)
        .bind(team_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(MemberRow::into_member).collect())
    }

    /// Insert or replace an explicit membership.
    ///
    /// Synthetic memberships are projections and are refused.
    pub async fn save<'e>(executor: impl SqliteExecutor<'e>, member: &BoardMember) -> Result<()> {
        if member.synthetic {
            return Err(TaskboardError::bad_request(format!(
                "synthetic membership of {} on board {} cannot be stored",
                member.user_id, member.board_id
            )));
        }

        let flags = member.flags();
        sqlx::query(
            "INSERT INTO board_members
                (board_id, user_id, roles, scheme_admin, scheme_editor, scheme_commenter, scheme_viewer)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (board_id, user_id) DO UPDATE SET
                roles = excluded.roles,
                scheme_admin = excluded.scheme_admin,
                scheme_editor = excluded.scheme_editor,
                scheme_commenter = excluded.scheme_commenter,
                scheme_viewer = excluded.scheme_viewer",
        )
        .bind(&member.board_id)
        .bind(&member.user_id)
        .bind(&member.roles)
        .bind(flags.admin)
        .bind(flags.editor)
        .bind(flags.commenter)
        .bind(flags.viewer)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Remove one membership. Returns true if a row was deleted.
    pub async fn delete<'e>(
        executor: impl SqliteExecutor<'e>,
        board_id: &str,
        user_id: &str,
    ) -> Result<bool> {
        let result = sqlx::query("DELETE FROM board_members WHERE board_id = ? AND user_id = ?")
            .bind(board_id)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every membership of a board. Returns the number of rows deleted.
    pub async fn delete_for_board<'e>(executor: impl SqliteExecutor<'e>, board_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM board_members WHERE board_id = ?")
            .bind(board_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Internal struct for mapping database rows to BoardMember.
#[derive(sqlx::FromRow)]
struct MemberRow {
    board_id: String,
    user_id: String,
    roles: String,
    scheme_admin: bool,
    scheme_editor: bool,
    scheme_commenter: bool,
    scheme_viewer: bool,
}

impl MemberRow {
    fn into_member(self) -> BoardMember {
        let flags = SchemeFlags {
            admin: self.scheme_admin,
            editor: self.scheme_editor,
            commenter: self.scheme_commenter,
            viewer: self.scheme_viewer,
        };
        BoardMember {
            board_id: self.board_id,
            user_id: self.user_id,
            roles: self.roles,
            role: flags.role(),
            synthetic: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, BoardRepository};
    use crate::permission::SchemeRole;
    use crate::Database;

    async fn setup_db() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        for (id, team) in [("b1", "t1"), ("b2", "t1"), ("b3", "t2")] {
            let mut board = Board::new(id, team, id);
            board.created_by = "u1".to_string();
            board.modified_by = "u1".to_string();
            BoardRepository::insert(db.pool(), &board).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let db = setup_db().await;
        MemberRepository::save(db.pool(), &BoardMember::new("b1", "u1", SchemeRole::Commenter))
            .await
            .unwrap();

        let repo = MemberRepository::new(db.pool());
        let member = repo.get_for_board("b1", "u1").await.unwrap().unwrap();
        assert_eq!(member.role, SchemeRole::Commenter);
        assert!(!member.synthetic);
        assert!(repo.get_for_board("b1", "u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_upserts() {
        let db = setup_db().await;
        MemberRepository::save(db.pool(), &BoardMember::new("b1", "u1", SchemeRole::Viewer))
            .await
            .unwrap();
        MemberRepository::save(db.pool(), &BoardMember::admin("b1", "u1"))
            .await
            .unwrap();

        let repo = MemberRepository::new(db.pool());
        let members = repo.list_for_board("b1").await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].role, SchemeRole::Admin);
    }

    #[tokio::test]
    async fn test_save_rejects_synthetic() {
        let db = setup_db().await;
        let mut member = BoardMember::new("b1", "u1", SchemeRole::Editor);
        member.synthetic = true;

        let result = MemberRepository::save(db.pool(), &member).await;
        assert!(matches!(result, Err(TaskboardError::BadRequest(_))));
        let repo = MemberRepository::new(db.pool());
        assert!(repo.get_for_board("b1", "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_highest_flag_wins_on_read() {
        let db = setup_db().await;
        sqlx::query(
            "INSERT INTO board_members (board_id, user_id, scheme_admin, scheme_editor, scheme_commenter, scheme_viewer)
             VALUES ('b1', 'u1', 0, 1, 1, 1)",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let repo = MemberRepository::new(db.pool());
        let member = repo.get_for_board("b1", "u1").await.unwrap().unwrap();
        assert_eq!(member.role, SchemeRole::Editor);
    }

    #[tokio::test]
    async fn test_list_for_user_filters_team() {
        let db = setup_db().await;
        for board in ["b1", "b2", "b3"] {
            MemberRepository::save(db.pool(), &BoardMember::admin(board, "u1"))
                .await
                .unwrap();
        }

        let repo = MemberRepository::new(db.pool());
        let members = repo.list_for_user("u1", "t1").await.unwrap();
        let boards: Vec<&str> = members.iter().map(|m| m.board_id.as_str()).collect();
        assert_eq!(boards, vec!["b1", "b2"]);
    }

    #[tokio::test]
    async fn test_delete_for_board() {
        let db = setup_db().await;
        MemberRepository::save(db.pool(), &BoardMember::admin("b1", "u1"))
            .await
            .unwrap();
        MemberRepository::save(db.pool(), &BoardMember::new("b1", "u2", SchemeRole::Viewer))
            .await
            .unwrap();

        let deleted = MemberRepository::delete_for_board(db.pool(), "b1").await.unwrap();
        assert_eq!(deleted, 2);
        assert!(!MemberRepository::delete(db.pool(), "b1", "u1").await.unwrap());
    }
}
