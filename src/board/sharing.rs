//! Public sharing tokens for boards.

use rand::Rng;
use sqlx::SqliteExecutor;

use crate::db::DbPool;
use crate::Result;

const TOKEN_CHARS: &[u8] = b"abcdefghijkmnopqrstuvwxyz23456789";
const TOKEN_LENGTH: usize = 26;

/// Generate a random sharing token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LENGTH)
        .map(|_| TOKEN_CHARS[rng.random_range(0..TOKEN_CHARS.len())] as char)
        .collect()
}

/// Sharing state of a board.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Sharing {
    pub board_id: String,
    pub enabled: bool,
    pub token: String,
    pub modified_by: String,
    pub update_at: i64,
}

impl Sharing {
    /// Create an enabled sharing record with a fresh token.
    pub fn enabled(board_id: impl Into<String>, modified_by: impl Into<String>, at: i64) -> Self {
        Self {
            board_id: board_id.into(),
            enabled: true,
            token: generate_token(),
            modified_by: modified_by.into(),
            update_at: at,
        }
    }
}

/// Repository for sharing records.
pub struct SharingRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> SharingRepository<'a> {
    /// Create a new SharingRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Get the sharing record of a board.
    pub async fn get(&self, board_id: &str) -> Result<Option<Sharing>> {
        let sharing = sqlx::query_as::<_, Sharing>(
            "SELECT board_id, enabled, token, modified_by, update_at FROM sharing WHERE board_id = ?",
        )
        .bind(board_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(sharing)
    }

    /// Insert or replace the sharing record of a board.
    pub async fn upsert<'e>(executor: impl SqliteExecutor<'e>, sharing: &Sharing) -> Result<()> {
        sqlx::query(
            "INSERT INTO sharing (board_id, enabled, token, modified_by, update_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (board_id) DO UPDATE SET
                enabled = excluded.enabled,
                token = excluded.token,
                modified_by = excluded.modified_by,
                update_at = excluded.update_at",
        )
        .bind(&sharing.board_id)
        .bind(sharing.enabled)
        .bind(&sharing.token)
        .bind(&sharing.modified_by)
        .bind(sharing.update_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Remove the sharing record of a board. Returns true if one existed.
    pub async fn delete_for_board<'e>(executor: impl SqliteExecutor<'e>, board_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sharing WHERE board_id = ?")
            .bind(board_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
