//! Block repository for TASKBOARD.

use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

use super::block::{Block, BlockType};
use super::repository::{json_column, json_text};
use crate::db::DbPool;
use crate::{Result, TaskboardError};

const BLOCK_COLUMNS: &str = "id, parent_id, board_id, created_by, modified_by, schema, block_type,
    title, fields, create_at, update_at, delete_at";

/// Repository for block persistence.
pub struct BlockRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> BlockRepository<'a> {
    /// Create a new BlockRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Get an active block by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Block>> {
        let query = format!("SELECT {BLOCK_COLUMNS} FROM blocks WHERE id = ? AND delete_at IS NULL");
        let row: Option<BlockRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        row.map(BlockRow::into_block).transpose()
    }

    /// Get a block by ID, including soft-deleted blocks.
    pub async fn get_including_deleted(&self, id: &str) -> Result<Option<Block>> {
        Self::fetch_including_deleted(self.pool, id).await
    }

    /// Get the active blocks whose IDs are in `ids`.
    pub async fn get_many(&self, ids: &[String]) -> Result<Vec<Block>> {
        Self::fetch_many(self.pool, ids).await
    }

    /// List the active blocks of a board, oldest first.
    pub async fn list_for_board(&self, board_id: &str) -> Result<Vec<Block>> {
        Self::fetch_for_board(self.pool, board_id).await
    }

    pub async fn fetch_including_deleted<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
    ) -> Result<Option<Block>> {
        let query = format!("SELECT {BLOCK_COLUMNS} FROM blocks WHERE id = ?");
        let row: Option<BlockRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        row.map(BlockRow::into_block).transpose()
    }

    pub async fn fetch_many<'e>(
        executor: impl SqliteExecutor<'e>,
        ids: &[String],
    ) -> Result<Vec<Block>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {BLOCK_COLUMNS} FROM blocks WHERE delete_at IS NULL AND id IN ("
        ));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(") ORDER BY id");

        let rows: Vec<BlockRow> = query.build_query_as().fetch_all(executor).await?;
        rows.into_iter().map(BlockRow::into_block).collect()
    }

    pub async fn fetch_for_board<'e>(
        executor: impl SqliteExecutor<'e>,
        board_id: &str,
    ) -> Result<Vec<Block>> {
        let query = format!(
            "SELECT {BLOCK_COLUMNS} FROM blocks
             WHERE board_id = ? AND delete_at IS NULL ORDER BY create_at ASC, id ASC"
        );
        let rows: Vec<BlockRow> = sqlx::query_as(&query)
            .bind(board_id)
            .fetch_all(executor)
            .await?;
        rows.into_iter().map(BlockRow::into_block).collect()
    }

    /// Insert a new block row.
    pub async fn insert<'e>(executor: impl SqliteExecutor<'e>, block: &Block) -> Result<()> {
        sqlx::query(
            "INSERT INTO blocks (id, parent_id, board_id, created_by, modified_by, schema,
                block_type, title, fields, create_at, update_at, delete_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&block.id)
        .bind(&block.parent_id)
        .bind(&block.board_id)
        .bind(&block.created_by)
        .bind(&block.modified_by)
        .bind(block.schema)
        .bind(block.block_type.as_str())
        .bind(&block.title)
        .bind(json_text(&block.fields)?)
        .bind(block.create_at)
        .bind(block.update_at)
        .bind(block.delete_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Overwrite the mutable columns of an active block.
    pub async fn update<'e>(executor: impl SqliteExecutor<'e>, block: &Block) -> Result<()> {
        let result = sqlx::query(
            "UPDATE blocks SET parent_id = ?, modified_by = ?, schema = ?, block_type = ?,
                title = ?, fields = ?, update_at = ?
             WHERE id = ? AND delete_at IS NULL",
        )
        .bind(&block.parent_id)
        .bind(&block.modified_by)
        .bind(block.schema)
        .bind(block.block_type.as_str())
        .bind(&block.title)
        .bind(json_text(&block.fields)?)
        .bind(block.update_at)
        .bind(&block.id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TaskboardError::not_found(format!("block {}", block.id)));
        }
        Ok(())
    }

    /// Soft-delete an active block.
    pub async fn soft_delete<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
        modified_by: &str,
        at: i64,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE blocks SET delete_at = ?, update_at = ?, modified_by = ?
             WHERE id = ? AND delete_at IS NULL",
        )
        .bind(at)
        .bind(at)
        .bind(modified_by)
        .bind(id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TaskboardError::not_found(format!("block {id}")));
        }
        Ok(())
    }

    /// Restore a soft-deleted block.
    pub async fn undelete<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
        modified_by: &str,
        at: i64,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE blocks SET delete_at = NULL, update_at = ?, modified_by = ?
             WHERE id = ? AND delete_at IS NOT NULL",
        )
        .bind(at)
        .bind(modified_by)
        .bind(id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TaskboardError::not_found(format!("deleted block {id}")));
        }
        Ok(())
    }
}

/// Internal struct for mapping database rows to Block.
#[derive(sqlx::FromRow)]
struct BlockRow {
    id: String,
    parent_id: Option<String>,
    board_id: String,
    created_by: String,
    modified_by: String,
    schema: i64,
    block_type: String,
    title: String,
    fields: String,
    create_at: i64,
    update_at: i64,
    delete_at: Option<i64>,
}

impl BlockRow {
    /// Unknown block types and malformed fields are surfaced as errors.
    fn into_block(self) -> Result<Block> {
        let entity = format!("block {}", self.id);
        let block_type: BlockType = self
            .block_type
            .parse()
            .map_err(|e: String| TaskboardError::Database(format!("{entity}: {e}")))?;
        let fields = json_column(&self.fields, &entity, "fields")?;
        Ok(Block {
            id: self.id,
            parent_id: self.parent_id.filter(|p| !p.is_empty()),
            board_id: self.board_id,
            created_by: self.created_by,
            modified_by: self.modified_by,
            schema: self.schema,
            block_type,
            title: self.title,
            fields,
            create_at: self.create_at,
            update_at: self.update_at,
            delete_at: self.delete_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, BoardRepository};
    use crate::Database;
    use serde_json::json;

    async fn setup_db() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        let mut board = Board::new("b1", "t1", "Board");
        board.created_by = "u1".to_string();
        board.modified_by = "u1".to_string();
        BoardRepository::insert(db.pool(), &board).await.unwrap();
        db
    }

    fn card(id: &str, at: i64) -> Block {
        Block {
            created_by: "u1".to_string(),
            modified_by: "u1".to_string(),
            create_at: at,
            update_at: at,
            ..Block::new(id, "b1", BlockType::Card, format!("card {id}"))
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = setup_db().await;
        let block = card("k1", 10).with_parent("b1").with_field("icon", json!("x"));
        BlockRepository::insert(db.pool(), &block).await.unwrap();

        let repo = BlockRepository::new(db.pool());
        assert_eq!(repo.get_by_id("k1").await.unwrap().unwrap(), block);
        assert!(repo.get_by_id("k2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_for_missing_board_fails() {
        let db = setup_db().await;
        let block = Block {
            board_id: "missing".to_string(),
            ..card("k1", 10)
        };
        assert!(BlockRepository::insert(db.pool(), &block).await.is_err());
    }

    #[tokio::test]
    async fn test_list_for_board_and_get_many() {
        let db = setup_db().await;
        for (id, at) in [("k2", 20), ("k1", 10), ("k3", 30)] {
            BlockRepository::insert(db.pool(), &card(id, at)).await.unwrap();
        }

        let repo = BlockRepository::new(db.pool());
        let ids: Vec<String> = repo
            .list_for_board("b1")
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["k1", "k2", "k3"]);

        let wanted = vec!["k3".to_string(), "k9".to_string()];
        let found = repo.get_many(&wanted).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "k3");
    }

    #[tokio::test]
    async fn test_update_soft_delete_undelete() {
        let db = setup_db().await;
        let mut block = card("k1", 10);
        BlockRepository::insert(db.pool(), &block).await.unwrap();
        let repo = BlockRepository::new(db.pool());

        block.title = "renamed".to_string();
        block.update_at = 20;
        BlockRepository::update(db.pool(), &block).await.unwrap();
        assert_eq!(repo.get_by_id("k1").await.unwrap().unwrap().title, "renamed");

        BlockRepository::soft_delete(db.pool(), "k1", "u2", 30).await.unwrap();
        assert!(repo.get_by_id("k1").await.unwrap().is_none());
        assert!(BlockRepository::update(db.pool(), &block)
            .await
            .unwrap_err()
            .is_not_found());
        let deleted = repo.get_including_deleted("k1").await.unwrap().unwrap();
        assert_eq!(deleted.delete_at, Some(30));

        BlockRepository::undelete(db.pool(), "k1", "u2", 40).await.unwrap();
        assert!(repo.get_by_id("k1").await.unwrap().unwrap().is_active());
    }

    #[tokio::test]
    async fn test_unknown_block_type_is_error() {
        let db = setup_db().await;
        sqlx::query(
            "INSERT INTO blocks (id, board_id, block_type, created_by, modified_by, create_at, update_at)
             VALUES ('k1', 'b1', 'hologram', 'u1', 'u1', 0, 0)",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let repo = BlockRepository::new(db.pool());
        assert!(matches!(
            repo.get_by_id("k1").await,
            Err(TaskboardError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_fields_are_reported() {
        let db = setup_db().await;
        BlockRepository::insert(db.pool(), &card("k1", 10)).await.unwrap();
        sqlx::query("UPDATE blocks SET fields = 'not json' WHERE id = 'k1'")
            .execute(db.pool())
            .await
            .unwrap();

        let err = BlockRepository::new(db.pool())
            .get_by_id("k1")
            .await
            .unwrap_err();
        assert!(matches!(err, TaskboardError::Database(_)));
        assert!(err.to_string().contains("k1"));
    }
}
