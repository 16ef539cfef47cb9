//! Board repository for TASKBOARD.
//!
//! Reads go through the pool. Writes, and the reads the batch engine needs
//! to repeat inside its transaction, are associated functions taking any
//! SQLite executor.

use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

use super::types::{Board, BoardType};
use crate::db::DbPool;
use crate::permission::{SchemeRole, VisibleBoardsQuery};
use crate::{Result, TaskboardError};

const BOARD_COLUMNS: &str = "id, team_id, channel_id, created_by, modified_by, board_type,
    minimum_role, title, description, icon, show_description, is_template, template_version,
    properties, card_properties, create_at, update_at, delete_at";

/// Repository for board persistence.
pub struct BoardRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> BoardRepository<'a> {
    /// Create a new BoardRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Get an active board by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Board>> {
        Self::fetch_by_id(self.pool, id).await
    }

    /// Get a board by ID, including soft-deleted boards.
    pub async fn get_including_deleted(&self, id: &str) -> Result<Option<Board>> {
        Self::fetch_including_deleted(self.pool, id).await
    }

    /// Get an active board, failing with `NotFound` when it is missing.
    pub async fn require(&self, id: &str) -> Result<Board> {
        Self::fetch_required(self.pool, id).await
    }

    /// Get an active board by ID through any executor.
    pub async fn fetch_by_id<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
    ) -> Result<Option<Board>> {
        let query = format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = ? AND delete_at IS NULL");
        let row: Option<BoardRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        row.map(BoardRow::into_board).transpose()
    }

    /// Get a board by ID through any executor, including soft-deleted boards.
    pub async fn fetch_including_deleted<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
    ) -> Result<Option<Board>> {
        let query = format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = ?");
        let row: Option<BoardRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        row.map(BoardRow::into_board).transpose()
    }

    /// Get an active board through any executor, failing with `NotFound`
    /// when it is missing.
    pub async fn fetch_required<'e>(executor: impl SqliteExecutor<'e>, id: &str) -> Result<Board> {
        Self::fetch_by_id(executor, id)
            .await?
            .ok_or_else(|| TaskboardError::not_found(format!("board {id}")))
    }

    /// Get the active boards of a team whose IDs are in `ids`.
    ///
    /// Missing IDs are silently skipped; callers compare lengths when every
    /// ID must exist.
    pub async fn get_in_team_by_ids(&self, team_id: &str, ids: &[String]) -> Result<Vec<Board>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {BOARD_COLUMNS} FROM boards WHERE delete_at IS NULL AND team_id = "
        ));
        query.push_bind(team_id);
        query.push(" AND id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(") ORDER BY id");

        let rows: Vec<BoardRow> = query.build_query_as().fetch_all(self.pool).await?;
        rows.into_iter().map(BoardRow::into_board).collect()
    }

    /// Get the active boards whose IDs are in `ids`, in any team.
    pub async fn get_many(&self, ids: &[String]) -> Result<Vec<Board>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {BOARD_COLUMNS} FROM boards WHERE delete_at IS NULL AND id IN ("
        ));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(") ORDER BY id");

        let rows: Vec<BoardRow> = query.build_query_as().fetch_all(self.pool).await?;
        rows.into_iter().map(BoardRow::into_board).collect()
    }

    /// List active boards in a team.
    pub async fn list_for_team(&self, team_id: &str) -> Result<Vec<Board>> {
        let query = format!(
            "SELECT {BOARD_COLUMNS} FROM boards
             WHERE team_id = ? AND delete_at IS NULL ORDER BY title ASC, id ASC"
        );
        let rows: Vec<BoardRow> = sqlx::query_as(&query)
            .bind(team_id)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(BoardRow::into_board).collect()
    }

    /// List the active boards matched by a visibility query.
    ///
    /// A board is matched when the user holds an explicit membership, when
    /// it is linked to one of the query's channels, or, if the query opts
    /// in, when it is an open template of the team.
    pub async fn list_visible(&self, visible: &VisibleBoardsQuery) -> Result<Vec<Board>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {BOARD_COLUMNS} FROM boards WHERE delete_at IS NULL AND team_id = "
        ));
        query.push_bind(&visible.team_id);
        query.push(" AND (id IN (SELECT board_id FROM board_members WHERE user_id = ");
        query.push_bind(&visible.user_id);
        query.push(")");

        if !visible.channel_ids.is_empty() {
            query.push(" OR channel_id IN (");
            let mut separated = query.separated(", ");
            for channel_id in &visible.channel_ids {
                separated.push_bind(channel_id);
            }
            separated.push_unseparated(")");
        }

        if visible.include_public_templates {
            query.push(" OR (board_type = ");
            query.push_bind(BoardType::Open.as_str());
            query.push(" AND is_template = 1)");
        }

        query.push(") ORDER BY title ASC, id ASC");

        let rows: Vec<BoardRow> = query.build_query_as().fetch_all(self.pool).await?;
        rows.into_iter().map(BoardRow::into_board).collect()
    }

    /// Insert a new board row.
    pub async fn insert<'e>(executor: impl SqliteExecutor<'e>, board: &Board) -> Result<()> {
        sqlx::query(
            "INSERT INTO boards (id, team_id, channel_id, created_by, modified_by, board_type,
                minimum_role, title, description, icon, show_description, is_template,
                template_version, properties, card_properties, create_at, update_at, delete_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&board.id)
        .bind(&board.team_id)
        .bind(&board.channel_id)
        .bind(&board.created_by)
        .bind(&board.modified_by)
        .bind(board.board_type.as_str())
        .bind(board.minimum_role.as_str())
        .bind(&board.title)
        .bind(&board.description)
        .bind(&board.icon)
        .bind(board.show_description)
        .bind(board.is_template)
        .bind(board.template_version)
        .bind(json_text(&board.properties)?)
        .bind(json_text(&board.card_properties)?)
        .bind(board.create_at)
        .bind(board.update_at)
        .bind(board.delete_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Overwrite the mutable columns of an active board.
    ///
    /// Fails with `NotFound` when no active row was updated.
    pub async fn update<'e>(executor: impl SqliteExecutor<'e>, board: &Board) -> Result<()> {
        let result = sqlx::query(
            "UPDATE boards SET channel_id = ?, modified_by = ?, board_type = ?, minimum_role = ?,
                title = ?, description = ?, icon = ?, show_description = ?, is_template = ?,
                template_version = ?, properties = ?, card_properties = ?, update_at = ?
             WHERE id = ? AND delete_at IS NULL",
        )
        .bind(&board.channel_id)
        .bind(&board.modified_by)
        .bind(board.board_type.as_str())
        .bind(board.minimum_role.as_str())
        .bind(&board.title)
        .bind(&board.description)
        .bind(&board.icon)
        .bind(board.show_description)
        .bind(board.is_template)
        .bind(board.template_version)
        .bind(json_text(&board.properties)?)
        .bind(json_text(&board.card_properties)?)
        .bind(board.update_at)
        .bind(&board.id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TaskboardError::not_found(format!("board {}", board.id)));
        }
        Ok(())
    }

    /// Soft-delete an active board.
    pub async fn soft_delete<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
        modified_by: &str,
        at: i64,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE boards SET delete_at = ?, update_at = ?, modified_by = ?
             WHERE id = ? AND delete_at IS NULL",
        )
        .bind(at)
        .bind(at)
        .bind(modified_by)
        .bind(id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TaskboardError::not_found(format!("board {id}")));
        }
        Ok(())
    }

    /// Restore a soft-deleted board.
    pub async fn undelete<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
        modified_by: &str,
        at: i64,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE boards SET delete_at = NULL, update_at = ?, modified_by = ?
             WHERE id = ? AND delete_at IS NOT NULL",
        )
        .bind(at)
        .bind(modified_by)
        .bind(id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TaskboardError::not_found(format!("deleted board {id}")));
        }
        Ok(())
    }
}

pub(crate) fn json_text<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| TaskboardError::Database(format!("cannot encode JSON column: {e}")))
}

/// Decode a JSON column, naming the row when the stored text is malformed.
pub(crate) fn json_column<T: serde::de::DeserializeOwned>(
    text: &str,
    entity: &str,
    column: &str,
) -> Result<T> {
    serde_json::from_str(text)
        .map_err(|e| TaskboardError::Database(format!("{entity}: bad {column}: {e}")))
}

/// Internal struct for mapping database rows to Board.
#[derive(sqlx::FromRow)]
struct BoardRow {
    id: String,
    team_id: String,
    channel_id: Option<String>,
    created_by: String,
    modified_by: String,
    board_type: String,
    minimum_role: String,
    title: String,
    description: String,
    icon: String,
    show_description: bool,
    is_template: bool,
    template_version: i32,
    properties: String,
    card_properties: String,
    create_at: i64,
    update_at: i64,
    delete_at: Option<i64>,
}

impl BoardRow {
    /// Unknown enum values and malformed JSON are surfaced as errors.
    fn into_board(self) -> Result<Board> {
        let entity = format!("board {}", self.id);
        let board_type: BoardType = self
            .board_type
            .parse()
            .map_err(|e: String| TaskboardError::Database(format!("{entity}: {e}")))?;
        let minimum_role: SchemeRole = self
            .minimum_role
            .parse()
            .map_err(|e: String| TaskboardError::Database(format!("{entity}: {e}")))?;
        let properties = json_column(&self.properties, &entity, "properties")?;
        let card_properties = json_column(&self.card_properties, &entity, "card_properties")?;
        Ok(Board {
            id: self.id,
            team_id: self.team_id,
            channel_id: self.channel_id.filter(|c| !c.is_empty()),
            created_by: self.created_by,
            modified_by: self.modified_by,
            board_type,
            minimum_role,
            title: self.title,
            description: self.description,
            icon: self.icon,
            show_description: self.show_description,
            is_template: self.is_template,
            template_version: self.template_version,
            properties,
            card_properties,
            create_at: self.create_at,
            update_at: self.update_at,
            delete_at: self.delete_at,
        })
    }
}
