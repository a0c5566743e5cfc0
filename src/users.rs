//! User directory.
//!
//! Tasks refer to people by phone number. The board only needs two things
//! from a directory: whether an id exists and a display record for it, which
//! is the [`UserDirectory`] trait. [`UserBook`] is the JSON-file backed
//! directory the CLI uses.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::{read_json, write_json_atomic};
use crate::error::UserError;

/// Users are identified by phone number.
pub type UserId = u64;

/// Display record for one registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub position: String,
    #[serde(default = "active_default")]
    pub is_active: bool,
}

fn active_default() -> bool {
    true
}

/// Lookup service consumed by the task store and the notification scanner.
pub trait UserDirectory {
    fn user_exists(&self, id: UserId) -> bool;
    fn get_user(&self, id: UserId) -> Option<UserRecord>;
}

impl<D: UserDirectory + ?Sized> UserDirectory for &D {
    fn user_exists(&self, id: UserId) -> bool {
        (**self).user_exists(id)
    }

    fn get_user(&self, id: UserId) -> Option<UserRecord> {
        (**self).get_user(id)
    }
}

/// Display name for a user reference that never fails.
///
/// Unset references render as `-`, ids the directory cannot resolve as
/// `Unknown user (<id>)`.
pub fn display_name(directory: &impl UserDirectory, id: Option<UserId>) -> String {
    match id {
        None => "-".to_string(),
        Some(id) => directory
            .get_user(id)
            .map(|u| u.name)
            .unwrap_or_else(|| format!("Unknown user ({id})")),
    }
}

/// JSON-file backed user directory.
#[derive(Debug, Default)]
pub struct UserBook {
    path: Option<PathBuf>,
    users: BTreeMap<UserId, UserRecord>,
}

impl UserBook {
    /// Load the user file, starting empty if it does not exist.
    pub fn open(path: &Path) -> Result<Self, UserError> {
        let list: Vec<UserRecord> = read_json(path)?;
        Ok(UserBook {
            path: Some(path.to_path_buf()),
            users: list.into_iter().map(|u| (u.id, u)).collect(),
        })
    }

    /// A directory that lives only in memory.
    pub fn in_memory() -> Self {
        UserBook::default()
    }

    /// Register a new user. New users start active.
    pub fn register(&mut self, id: UserId, name: &str, position: &str) -> Result<UserRecord, UserError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(UserError::InvalidName);
        }
        if self.users.contains_key(&id) {
            return Err(UserError::DuplicateUser(id));
        }
        let user = UserRecord {
            id,
            name: name.to_string(),
            position: position.trim().to_string(),
            is_active: true,
        };
        let mut draft = self.users.clone();
        draft.insert(id, user.clone());
        self.commit(draft)?;
        info!(user = id, "registered user");
        Ok(user)
    }

    /// Change a user's activation status.
    pub fn set_active(&mut self, id: UserId, active: bool) -> Result<UserRecord, UserError> {
        let mut draft = self.users.clone();
        let user = draft.get_mut(&id).ok_or(UserError::UnknownUser(id))?;
        user.is_active = active;
        let user = user.clone();
        self.commit(draft)?;
        info!(user = id, active, "changed activation status");
        Ok(user)
    }

    /// All users ordered by id.
    pub fn list(&self) -> impl Iterator<Item = &UserRecord> {
        self.users.values()
    }

    fn commit(&mut self, draft: BTreeMap<UserId, UserRecord>) -> Result<(), UserError> {
        if let Some(path) = &self.path {
            let list: Vec<&UserRecord> = draft.values().collect();
            write_json_atomic(path, &list)?;
        }
        self.users = draft;
        Ok(())
    }
}

impl UserDirectory for UserBook {
    fn user_exists(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    fn get_user(&self, id: UserId) -> Option<UserRecord> {
        self.users.get(&id).cloned()
    }
}
