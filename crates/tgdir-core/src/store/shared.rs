use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ChatId, UserId},
    errors::Error,
    Result,
};

use super::{ChatRecord, Directory, DirectoryStore, UserRecord};

/// [`DirectoryStore`] over an in-memory [`Directory`], optionally persisted as a
/// JSON snapshot.
///
/// Every write happens under one async mutex, so concurrent handlers never see a
/// partial record and same-key writes resolve last-write-wins.
pub struct SharedDirectory {
    state: Mutex<Directory>,
    path: Option<PathBuf>,
}

impl SharedDirectory {
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(Directory::default()),
            path: None,
        }
    }

    /// Open (or start) a directory persisted at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = load_snapshot(&path).await?.unwrap_or_default();
        Ok(Self {
            state: Mutex::new(state),
            path: Some(path),
        })
    }

    /// Apply `f` to the state and persist when it reports a change.
    async fn mutate(&self, f: impl FnOnce(&mut Directory) -> bool + Send) -> Result<()> {
        let mut st = self.state.lock().await;
        let before = self.path.as_ref().map(|_| st.clone());
        if !f(&mut st) {
            return Ok(());
        }
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Err(e) = save_snapshot(path, &st).await {
            // Keep memory and disk in step: a failed write undoes the change.
            if let Some(before) = before {
                *st = before;
            }
            return Err(e);
        }
        Ok(())
    }
}

fn store_err(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Store(format!("{}: {e}", path.display()))
}

async fn load_snapshot(path: &Path) -> Result<Option<Directory>> {
    let txt = match tokio::fs::read_to_string(path).await {
        Ok(txt) => txt,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(store_err(path, e)),
    };
    if txt.trim().is_empty() {
        return Ok(None);
    }
    let dir = serde_json::from_str(&txt).map_err(|e| store_err(path, e))?;
    Ok(Some(dir))
}

async fn save_snapshot(path: &Path, dir: &Directory) -> Result<()> {
    let txt = serde_json::to_string(dir).map_err(|e| store_err(path, e))?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, txt)
        .await
        .map_err(|e| store_err(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| store_err(path, e))?;
    Ok(())
}

#[async_trait]
impl DirectoryStore for SharedDirectory {
    async fn record_activity(
        &self,
        user_id: UserId,
        username: Option<&str>,
        chat: Option<(ChatId, &str)>,
    ) -> Result<()> {
        self.mutate(|d| d.record_activity(user_id, username, chat))
            .await
    }

    async fn users_by_handle(&self, username: &str) -> Result<Vec<UserRecord>> {
        Ok(self.state.lock().await.users_by_handle(username))
    }

    async fn chat(&self, chat_id: ChatId) -> Result<Option<ChatRecord>> {
        Ok(self.state.lock().await.chat(chat_id).cloned())
    }

    async fn restriction(&self, chat_id: ChatId) -> Result<bool> {
        Ok(self.state.lock().await.restriction(chat_id))
    }

    async fn set_restriction(&self, chat_id: ChatId, restricted: bool) -> Result<()> {
        self.mutate(|d| d.set_restriction(chat_id, restricted)).await
    }

    async fn all_chats(&self) -> Result<Vec<ChatRecord>> {
        Ok(self.state.lock().await.all_chats())
    }

    async fn num_users(&self) -> Result<usize> {
        Ok(self.state.lock().await.num_users())
    }

    async fn num_chats(&self) -> Result<usize> {
        Ok(self.state.lock().await.num_chats())
    }

    async fn user_num_chats(&self, user_id: UserId) -> Result<usize> {
        Ok(self.state.lock().await.user_num_chats(user_id))
    }

    async fn migrate_chat(&self, old_id: ChatId, new_id: ChatId) -> Result<()> {
        self.mutate(|d| d.migrate_chat(old_id, new_id)).await
    }
}
