//! The boards service account.

use tokio::sync::OnceCell;

use super::directory::HostDirectory;
use crate::Result;

/// Lazily created service account used for internal notifications.
///
/// The host is asked for the account at most once per owner; concurrent
/// first callers wait on the same initialization. A failed initialization
/// is not cached and the next caller tries again.
#[derive(Debug)]
pub struct SystemAccount {
    username: String,
    id: OnceCell<String>,
}

impl SystemAccount {
    /// Create an uninitialized account with the given username.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            id: OnceCell::new(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the account ID, creating the account on first use.
    pub async fn id(&self, directory: &dyn HostDirectory) -> Result<&str> {
        let id = self
            .id
            .get_or_try_init(|| directory.ensure_system_account(&self.username))
            .await?;
        Ok(id.as_str())
    }

    /// The account ID if it has already been initialized.
    pub fn cached_id(&self) -> Option<&str> {
        self.id.get().map(String::as_str)
    }

    /// Whether `user_id` is this service account.
    ///
    /// Only consults the cached ID; use [`SystemAccount::matches`] when the
    /// account may not have been created yet.
    pub fn is(&self, user_id: &str) -> bool {
        self.cached_id() == Some(user_id)
    }

    /// Whether `user_id` is this service account, creating it if needed.
    pub async fn matches(&self, user_id: &str, directory: &dyn HostDirectory) -> Result<bool> {
        Ok(self.id(directory).await? == user_id)
    }
}
