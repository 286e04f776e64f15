use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{ChatId, UserId};

use super::{ChatRecord, UserRecord};

/// In-memory directory state.
///
/// Mutating methods return `true` when the state actually changed so callers
/// can skip persisting no-op updates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Snapshot", into = "Snapshot")]
pub struct Directory {
    users: BTreeMap<UserId, UserRecord>,
    chats: BTreeMap<ChatId, ChatRecord>,
    memberships: BTreeSet<(UserId, ChatId)>,
}

/// On-disk layout (flat lists; JSON object keys must be strings).
#[derive(Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    users: Vec<UserRecord>,
    #[serde(default)]
    chats: Vec<ChatRecord>,
    #[serde(default)]
    memberships: Vec<Membership>,
}

#[derive(Serialize, Deserialize)]
struct Membership {
    user_id: UserId,
    chat_id: ChatId,
}

impl From<Snapshot> for Directory {
    fn from(s: Snapshot) -> Self {
        Self {
            users: s.users.into_iter().map(|u| (u.user_id, u)).collect(),
            chats: s.chats.into_iter().map(|c| (c.chat_id, c)).collect(),
            memberships: s
                .memberships
                .into_iter()
                .map(|m| (m.user_id, m.chat_id))
                .collect(),
        }
    }
}

impl From<Directory> for Snapshot {
    fn from(d: Directory) -> Self {
        Self {
            users: d.users.into_values().collect(),
            chats: d.chats.into_values().collect(),
            memberships: d
                .memberships
                .into_iter()
                .map(|(user_id, chat_id)| Membership { user_id, chat_id })
                .collect(),
        }
    }
}

impl Directory {
    pub fn record_activity(
        &mut self,
        user_id: UserId,
        username: Option<&str>,
        chat: Option<(ChatId, &str)>,
    ) -> bool {
        let mut changed = false;

        let user = self.users.entry(user_id).or_insert_with(|| {
            changed = true;
            UserRecord {
                user_id,
                username: None,
            }
        });
        if user.username.as_deref() != username {
            user.username = username.map(str::to_string);
            changed = true;
        }

        let Some((chat_id, chat_name)) = chat else {
            return changed;
        };

        let chat = self.chats.entry(chat_id).or_insert_with(|| {
            changed = true;
            ChatRecord {
                chat_id,
                chat_name: String::new(),
                restricted: false,
            }
        });
        if chat.chat_name != chat_name {
            chat.chat_name = chat_name.to_string();
            changed = true;
        }

        changed |= self.memberships.insert((user_id, chat_id));
        changed
    }

    /// Storage order is ascending user id.
    pub fn users_by_handle(&self, username: &str) -> Vec<UserRecord> {
        self.users
            .values()
            .filter(|u| u.username.as_deref() == Some(username))
            .cloned()
            .collect()
    }

    pub fn chat(&self, chat_id: ChatId) -> Option<&ChatRecord> {
        self.chats.get(&chat_id)
    }

    pub fn restriction(&self, chat_id: ChatId) -> bool {
        self.chats.get(&chat_id).is_some_and(|c| c.restricted)
    }

    pub fn set_restriction(&mut self, chat_id: ChatId, restricted: bool) -> bool {
        match self.chats.get_mut(&chat_id) {
            Some(chat) if chat.restricted == restricted => false,
            Some(chat) => {
                chat.restricted = restricted;
                true
            }
            None => {
                self.chats.insert(
                    chat_id,
                    ChatRecord {
                        chat_id,
                        chat_name: String::new(),
                        restricted,
                    },
                );
                true
            }
        }
    }

    pub fn all_chats(&self) -> Vec<ChatRecord> {
        self.chats.values().cloned().collect()
    }

    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    pub fn num_chats(&self) -> usize {
        self.chats.len()
    }

    pub fn user_num_chats(&self, user_id: UserId) -> usize {
        self.memberships
            .range((user_id, ChatId(i64::MIN))..=(user_id, ChatId(i64::MAX)))
            .count()
    }

    /// Re-key the chat and its memberships from `old_id` to `new_id`.
    ///
    /// An existing `new_id` record wins (name and restriction flag); memberships
    /// are merged.
    pub fn migrate_chat(&mut self, old_id: ChatId, new_id: ChatId) -> bool {
        if old_id == new_id {
            return false;
        }
        let mut changed = false;

        if let Some(mut old) = self.chats.remove(&old_id) {
            changed = true;
            if !self.chats.contains_key(&new_id) {
                old.chat_id = new_id;
                self.chats.insert(new_id, old);
            }
        }

        let moved: Vec<(UserId, ChatId)> = self
            .memberships
            .iter()
            .filter(|(_, c)| *c == old_id)
            .copied()
            .collect();
        for (user_id, chat_id) in moved {
            self.memberships.remove(&(user_id, chat_id));
            self.memberships.insert((user_id, new_id));
            changed = true;
        }

        changed
    }
}
