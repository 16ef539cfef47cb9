//! Sidebar categories grouping a user's boards.

use sqlx::SqliteExecutor;

use crate::db::DbPool;
use crate::Result;

/// A user's named group of boards within a team.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub team_id: String,
    pub create_at: i64,
    pub update_at: i64,
    pub delete_at: Option<i64>,
}

impl Category {
    /// Create a category with a fresh ID.
    pub fn new(
        name: impl Into<String>,
        user_id: impl Into<String>,
        team_id: impl Into<String>,
        at: i64,
    ) -> Self {
        Self {
            id: crate::ids::new_id(),
            name: name.into(),
            user_id: user_id.into(),
            team_id: team_id.into(),
            create_at: at,
            update_at: at,
            delete_at: None,
        }
    }
}

/// Repository for categories and their board associations.
pub struct CategoryRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new CategoryRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new category.
    pub async fn create(&self, category: &Category) -> Result<()> {
        sqlx::query(
            "INSERT INTO categories (id, name, user_id, team_id, create_at, update_at, delete_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.user_id)
        .bind(&category.team_id)
        .bind(category.create_at)
        .bind(category.update_at)
        .bind(category.delete_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// List a user's active categories in a team.
    pub async fn list_for_user(&self, user_id: &str, team_id: &str) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, user_id, team_id, create_at, update_at, delete_at
             FROM categories WHERE user_id = ? AND team_id = ? AND delete_at IS NULL
             ORDER BY create_at ASC, id ASC",
        )
        .bind(user_id)
        .bind(team_id)
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// File a board under a category for its owner.
    ///
    /// A board sits in at most one category per user; adding it again moves it.
    pub async fn add_board<'e>(
        executor: impl SqliteExecutor<'e>,
        category: &Category,
        board_id: &str,
        at: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO category_boards (user_id, category_id, board_id, create_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (user_id, board_id) DO UPDATE SET category_id = excluded.category_id",
        )
        .bind(&category.user_id)
        .bind(&category.id)
        .bind(board_id)
        .bind(at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// List the board IDs filed under a category.
    pub async fn list_board_ids(&self, category_id: &str) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT board_id FROM category_boards WHERE category_id = ? ORDER BY create_at, board_id",
        )
        .bind(category_id)
        .fetch_all(self.pool)
        .await?;
        Ok(ids)
    }

    /// Remove a board from every user's categories. Returns the rows removed.
    pub async fn remove_board_everywhere<'e>(
        executor: impl SqliteExecutor<'e>,
        board_id: &str,
    ) -> Result<u64> {
        let result = sqlx::query("DELETE FROM category_boards WHERE board_id = ?")
            .bind(board_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
