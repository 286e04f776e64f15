//! In-crate fakes shared by unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, ChatProfile, MessageId, MessageRef},
    errors::Error,
    messaging::port::MessagingPort,
    Result,
};

#[derive(Default)]
pub struct FakeMessenger {
    next_id: Mutex<i32>,
    sends: Mutex<Vec<(ChatId, String)>>,
    documents: Mutex<Vec<(ChatId, String, String, String)>>,
    left: Mutex<Vec<ChatId>>,
    lookups: Mutex<Vec<i64>>,

    profiles: Mutex<HashMap<i64, ChatProfile>>,
    failing_sends: Mutex<HashSet<i64>>,
    failing_lookups: Mutex<HashSet<i64>>,
    hanging_lookups: Mutex<HashSet<i64>>,
    fail_leave: Mutex<bool>,
}

impl FakeMessenger {
    pub fn with_profile(self, profile: ChatProfile) -> Self {
        self.profiles.lock().unwrap().insert(profile.id, profile);
        self
    }

    pub fn failing_send_to(self, chat_id: ChatId) -> Self {
        self.failing_sends.lock().unwrap().insert(chat_id.0);
        self
    }

    /// Lookups of `id` fail with a non-"not found" error.
    pub fn failing_lookup(self, id: i64) -> Self {
        self.failing_lookups.lock().unwrap().insert(id);
        self
    }

    /// Lookups of `id` never complete.
    pub fn hanging_lookup(self, id: i64) -> Self {
        self.hanging_lookups.lock().unwrap().insert(id);
        self
    }

    pub fn failing_leave(self) -> Self {
        *self.fail_leave.lock().unwrap() = true;
        self
    }

    fn alloc(&self, chat_id: ChatId) -> MessageRef {
        let mut guard = self.next_id.lock().unwrap();
        *guard += 1;
        MessageRef {
            chat_id,
            message_id: MessageId(*guard),
        }
    }

    fn deliver(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.sends
            .lock()
            .unwrap()
            .push((chat_id, text.to_string()));
        if self.failing_sends.lock().unwrap().contains(&chat_id.0) {
            return Err(Error::External("Forbidden: bot was kicked".to_string()));
        }
        Ok(self.alloc(chat_id))
    }

    /// Every attempted send, including the ones that failed.
    pub fn sends(&self) -> Vec<(ChatId, String)> {
        self.sends.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: ChatId) -> Vec<String> {
        self.sends()
            .into_iter()
            .filter(|(c, _)| *c == chat_id)
            .map(|(_, t)| t)
            .collect()
    }

    pub fn documents(&self) -> Vec<(ChatId, String, String, String)> {
        self.documents.lock().unwrap().clone()
    }

    pub fn left_chats(&self) -> Vec<ChatId> {
        self.left.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> Vec<i64> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.deliver(chat_id, html)
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.deliver(chat_id, text)
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        bytes: Vec<u8>,
        file_name: &str,
        caption: &str,
    ) -> Result<MessageRef> {
        self.documents.lock().unwrap().push((
            chat_id,
            String::from_utf8_lossy(&bytes).to_string(),
            file_name.to_string(),
            caption.to_string(),
        ));
        Ok(self.alloc(chat_id))
    }

    async fn get_chat(&self, id: i64) -> Result<ChatProfile> {
        self.lookups.lock().unwrap().push(id);
        let hang = self.hanging_lookups.lock().unwrap().contains(&id);
        if hang {
            std::future::pending::<()>().await;
        }
        if self.failing_lookups.lock().unwrap().contains(&id) {
            return Err(Error::External("Bad Gateway".to_string()));
        }
        self.profiles
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::ChatNotFound(id.to_string()))
    }

    async fn leave_chat(&self, chat_id: ChatId) -> Result<()> {
        self.left.lock().unwrap().push(chat_id);
        if *self.fail_leave.lock().unwrap() {
            return Err(Error::External("Bad Request: leave failed".to_string()));
        }
        Ok(())
    }
}
