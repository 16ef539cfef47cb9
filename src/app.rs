//! Application module.
//!
//! [`BoardsApp`] owns the long-lived collaborators and hands out the
//! permission service and batch engine that borrow them.

use std::sync::Arc;

use crate::batch::BatchMutationEngine;
use crate::config::{BoardsConfig, Config};
use crate::db::Database;
use crate::error::Result;
use crate::permission::{HostDirectory, PermissionService, RoleResolver, SystemAccount};

/// The boards core of a host platform.
pub struct BoardsApp {
    /// Database connection.
    db: Database,
    /// Users, teams and channels of the host platform.
    directory: Arc<dyn HostDirectory>,
    /// Size limits and service account settings.
    config: BoardsConfig,
    /// Lazily created service account.
    system_account: SystemAccount,
}

impl BoardsApp {
    /// Create a new application instance.
    pub fn new(db: Database, directory: Arc<dyn HostDirectory>, config: BoardsConfig) -> Self {
        let system_account = SystemAccount::new(config.system_account_username.clone());
        Self {
            db,
            directory,
            config,
            system_account,
        }
    }

    /// Open the configured database and build the application.
    pub async fn open(config: &Config, directory: Arc<dyn HostDirectory>) -> Result<Self> {
        config.validate()?;
        let db = Database::open(&config.database.path, config.database.max_connections).await?;
        Ok(Self::new(db, directory, config.boards.clone()))
    }

    /// Get the database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Get the board limits.
    pub fn config(&self) -> &BoardsConfig {
        &self.config
    }

    /// Get the host directory.
    pub fn directory(&self) -> &dyn HostDirectory {
        self.directory.as_ref()
    }

    pub fn resolver(&self) -> RoleResolver<'_> {
        RoleResolver::new(&self.db, self.directory.as_ref(), &self.system_account)
    }

    pub fn permissions(&self) -> PermissionService<'_> {
        PermissionService::new(&self.db, self.directory.as_ref(), &self.system_account)
    }

    pub fn batch(&self) -> BatchMutationEngine<'_> {
        BatchMutationEngine::new(&self.db, &self.config)
    }

    /// ID of the service account, creating it on first use.
    pub async fn system_account_id(&self) -> Result<&str> {
        self.system_account.id(self.directory.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BoardsAndBlocks;
    use crate::board::Board;
    use crate::permission::{MemoryDirectory, Permission};

    #[tokio::test]
    async fn test_create_then_check_permission() {
        let directory = Arc::new(MemoryDirectory::new());
        directory.add_user("alice").unwrap();
        directory.add_user("bob").unwrap();

        let db = Database::open_in_memory().await.unwrap();
        let app = BoardsApp::new(db, directory, BoardsConfig::default());

        app.batch()
            .create_boards_and_blocks_with_admin(
                BoardsAndBlocks::new(vec![Board::new("b1", "t1", "Plans")], vec![]),
                "alice",
            )
            .await
            .unwrap();

        let permissions = app.permissions();
        assert!(permissions.has_permission("alice", "b1", Permission::DeleteBoard).await);
        assert!(!permissions.has_permission("bob", "b1", Permission::ViewBoard).await);
    }

    #[tokio::test]
    async fn test_system_account_uses_configured_name() {
        let directory = Arc::new(MemoryDirectory::new());
        let db = Database::open_in_memory().await.unwrap();
        let config = BoardsConfig {
            system_account_username: "boards-bot".to_string(),
            ..BoardsConfig::default()
        };
        let app = BoardsApp::new(db, directory.clone(), config);

        let id = app.system_account_id().await.unwrap().to_string();
        let user = directory.get_user(&id).await.unwrap();
        assert_eq!(user.username, "boards-bot");
        assert_eq!(app.system_account_id().await.unwrap(), id);
        assert_eq!(directory.bots_created(), 1);
    }

    #[tokio::test]
    async fn test_open_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.path = dir
            .path()
            .join("boards.db")
            .to_string_lossy()
            .into_owned();

        let app = BoardsApp::open(&config, Arc::new(MemoryDirectory::new()))
            .await
            .unwrap();
        assert!(app.db().table_exists("boards").await.unwrap());
    }
}
