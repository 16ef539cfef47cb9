//! Host platform directory.
//!
//! The chat platform hosting the boards owns users, teams and channels.
//! [`HostDirectory`] is the narrow view the role resolver needs of it.
//! Lookups answer "not a member" with `Ok(None)`; an `Err` is a failure to
//! ask at all, except `NotFound`, which callers also read as "not a member".

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::{Result, TaskboardError};

/// A user as known to the host platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUser {
    pub id: String,
    pub username: String,
    pub is_guest: bool,
    pub is_bot: bool,
}

/// Membership of a user in a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMember {
    pub channel_id: String,
    pub user_id: String,
}

/// Membership of a user in a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    pub team_id: String,
    pub user_id: String,
}

/// Accessors the board core consumes from the host platform.
#[async_trait]
pub trait HostDirectory: Send + Sync {
    /// Look up a user; `NotFound` if the user does not exist.
    async fn get_user(&self, user_id: &str) -> Result<HostUser>;

    /// Look up a user's membership in a channel.
    async fn get_channel_member(&self, channel_id: &str, user_id: &str)
        -> Result<Option<ChannelMember>>;

    /// Look up a user's membership in a team.
    async fn get_team_member(&self, team_id: &str, user_id: &str) -> Result<Option<TeamMember>>;

    /// IDs of the channels of a team the user belongs to.
    async fn list_channel_ids_for_user(&self, user_id: &str, team_id: &str) -> Result<Vec<String>>;

    /// Find or create the bot account with the given username and return its ID.
    async fn ensure_system_account(&self, username: &str) -> Result<String>;
}

/// Read a lookup result, treating `NotFound` as "not a member".
pub(crate) fn membership_lookup<T>(result: Result<Option<T>>) -> Result<Option<T>> {
    match result {
        Err(e) if e.is_not_found() => Ok(None),
        other => other,
    }
}

#[derive(Default)]
struct DirectoryState {
    users: HashMap<String, HostUser>,
    team_members: HashMap<String, HashSet<String>>,
    channel_teams: HashMap<String, String>,
    channel_members: HashMap<String, HashSet<String>>,
}

/// In-process directory, for tests and standalone deployments.
#[derive(Default)]
pub struct MemoryDirectory {
    state: RwLock<DirectoryState>,
    unavailable: AtomicBool,
    bots_created: AtomicUsize,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, DirectoryState>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TaskboardError::Host("directory unavailable".to_string()));
        }
        self.state
            .read()
            .map_err(|_| TaskboardError::Host("directory lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, DirectoryState>> {
        self.state
            .write()
            .map_err(|_| TaskboardError::Host("directory lock poisoned".to_string()))
    }

    /// Register a regular user.
    pub fn add_user(&self, user_id: &str) -> Result<()> {
        self.insert_user(user_id, false)
    }

    /// Register a guest user.
    pub fn add_guest(&self, user_id: &str) -> Result<()> {
        self.insert_user(user_id, true)
    }

    fn insert_user(&self, user_id: &str, is_guest: bool) -> Result<()> {
        self.write()?.users.insert(
            user_id.to_string(),
            HostUser {
                id: user_id.to_string(),
                username: user_id.to_string(),
                is_guest,
                is_bot: false,
            },
        );
        Ok(())
    }

    /// Add a user to a team.
    pub fn add_team_member(&self, team_id: &str, user_id: &str) -> Result<()> {
        self.write()?
            .team_members
            .entry(team_id.to_string())
            .or_default()
            .insert(user_id.to_string());
        Ok(())
    }

    /// Create a channel inside a team.
    pub fn add_channel(&self, channel_id: &str, team_id: &str) -> Result<()> {
        self.write()?
            .channel_teams
            .insert(channel_id.to_string(), team_id.to_string());
        Ok(())
    }

    /// Add a user to a channel.
    pub fn add_channel_member(&self, channel_id: &str, user_id: &str) -> Result<()> {
        self.write()?
            .channel_members
            .entry(channel_id.to_string())
            .or_default()
            .insert(user_id.to_string());
        Ok(())
    }

    /// Make every lookup fail with a host error, as a lost connection would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of bot accounts created so far.
    pub fn bots_created(&self) -> usize {
        self.bots_created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostDirectory for MemoryDirectory {
    async fn get_user(&self, user_id: &str) -> Result<HostUser> {
        self.read()?
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| TaskboardError::not_found(format!("user {user_id}")))
    }

    async fn get_channel_member(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> Result<Option<ChannelMember>> {
        let state = self.read()?;
        let is_member = state
            .channel_members
            .get(channel_id)
            .is_some_and(|members| members.contains(user_id));
        Ok(is_member.then(|| ChannelMember {
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
        }))
    }

    async fn get_team_member(&self, team_id: &str, user_id: &str) -> Result<Option<TeamMember>> {
        let state = self.read()?;
        let is_member = state
            .team_members
            .get(team_id)
            .is_some_and(|members| members.contains(user_id));
        Ok(is_member.then(|| TeamMember {
            team_id: team_id.to_string(),
            user_id: user_id.to_string(),
        }))
    }

    async fn list_channel_ids_for_user(&self, user_id: &str, team_id: &str) -> Result<Vec<String>> {
        let state = self.read()?;
        let mut ids: Vec<String> = state
            .channel_members
            .iter()
            .filter(|(channel_id, members)| {
                members.contains(user_id)
                    && state.channel_teams.get(*channel_id).map(String::as_str) == Some(team_id)
            })
            .map(|(channel_id, _)| channel_id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn ensure_system_account(&self, username: &str) -> Result<String> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TaskboardError::Host("directory unavailable".to_string()));
        }
        let mut state = self.write()?;
        if let Some(bot) = state
            .users
            .values()
            .find(|u| u.is_bot && u.username == username)
        {
            return Ok(bot.id.clone());
        }

        let id = crate::ids::new_id();
        state.users.insert(
            id.clone(),
            HostUser {
                id: id.clone(),
                username: username.to_string(),
                is_guest: false,
                is_bot: true,
            },
        );
        self.bots_created.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> MemoryDirectory {
        let dir = MemoryDirectory::new();
        dir.add_user("alice").unwrap();
        dir.add_guest("gus").unwrap();
        dir.add_team_member("t1", "alice").unwrap();
        dir.add_channel("c1", "t1").unwrap();
        dir.add_channel("c2", "t2").unwrap();
        dir.add_channel_member("c1", "alice").unwrap();
        dir.add_channel_member("c2", "alice").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_get_user() {
        let dir = directory();
        assert!(!dir.get_user("alice").await.unwrap().is_guest);
        assert!(dir.get_user("gus").await.unwrap().is_guest);
        assert!(dir.get_user("nobody").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_memberships() {
        let dir = directory();
        assert!(dir.get_channel_member("c1", "alice").await.unwrap().is_some());
        assert!(dir.get_channel_member("c1", "gus").await.unwrap().is_none());
        assert!(dir.get_team_member("t1", "alice").await.unwrap().is_some());
        assert!(dir.get_team_member("t2", "alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_channel_ids_scoped_to_team() {
        let dir = directory();
        assert_eq!(
            dir.list_channel_ids_for_user("alice", "t1").await.unwrap(),
            vec!["c1"]
        );
        assert!(dir
            .list_channel_ids_for_user("gus", "t1")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_directory_errors() {
        let dir = directory();
        dir.set_unavailable(true);
        let err = dir.get_channel_member("c1", "alice").await.unwrap_err();
        assert!(matches!(err, TaskboardError::Host(_)));
        assert!(dir.ensure_system_account("boards").await.is_err());

        dir.set_unavailable(false);
        assert!(dir.get_channel_member("c1", "alice").await.is_ok());
    }

    #[tokio::test]
    async fn test_ensure_system_account_is_idempotent() {
        let dir = directory();
        let first = dir.ensure_system_account("boards").await.unwrap();
        let second = dir.ensure_system_account("boards").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(dir.bots_created(), 1);
        assert!(dir.get_user(&first).await.unwrap().is_bot);
    }

    #[test]
    fn test_membership_lookup_maps_not_found() {
        let not_found: Result<Option<()>> = Err(TaskboardError::not_found("member"));
        assert!(membership_lookup(not_found).unwrap().is_none());

        let host: Result<Option<()>> = Err(TaskboardError::Host("down".to_string()));
        assert!(membership_lookup(host).is_err());

        assert_eq!(membership_lookup(Ok(Some(1))).unwrap(), Some(1));
    }
}
