//! Handle -> user id resolution.

use std::{sync::Arc, time::Duration};

use tokio::time::timeout;

use crate::{
    domain::UserId,
    messaging::port::MessagingPort,
    store::{DirectoryStore, UserRecord},
    Result,
};

/// Telegram usernames are at least five characters long.
pub const MIN_HANDLE_LEN: usize = 5;

pub struct IdentityResolver {
    store: Arc<dyn DirectoryStore>,
    messenger: Arc<dyn MessagingPort>,
    lookup_timeout: Duration,
}

impl IdentityResolver {
    pub fn new(
        store: Arc<dyn DirectoryStore>,
        messenger: Arc<dyn MessagingPort>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            store,
            messenger,
            lookup_timeout,
        }
    }

    /// Resolve `@handle` (or `handle`) to a user id.
    ///
    /// Handles are not unique in the directory: old accounts keep the handle they
    /// were last seen with. When several users match, each candidate is checked
    /// against its live profile in storage order and the first one still using
    /// the handle wins.
    pub async fn resolve(&self, input: &str) -> Result<Option<UserId>> {
        let input = input.trim();
        let handle = input.strip_prefix('@').unwrap_or(input);
        if handle.chars().count() < MIN_HANDLE_LEN {
            return Ok(None);
        }

        let users = self.store.users_by_handle(handle).await?;
        match users.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(only.user_id)),
            candidates => {
                for candidate in candidates {
                    if let Some(id) = self.verify_live(candidate, handle).await {
                        return Ok(Some(id));
                    }
                }
                Ok(None)
            }
        }
    }

    async fn verify_live(&self, candidate: &UserRecord, handle: &str) -> Option<UserId> {
        let user_id = candidate.user_id.0;
        match timeout(self.lookup_timeout, self.messenger.get_chat(user_id)).await {
            Ok(Ok(profile)) => {
                (profile.username.as_deref() == Some(handle)).then_some(UserId(profile.id))
            }
            Ok(Err(e)) if e.is_not_found() => None,
            Ok(Err(e)) => {
                tracing::error!(user_id, error = %e, "error extracting user id");
                None
            }
            Err(_) => {
                tracing::warn!(user_id, timeout = ?self.lookup_timeout, "profile lookup timed out");
                None
            }
        }
    }
}
