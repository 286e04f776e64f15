//! Telegram update handlers.
//!
//! Every message goes through activity logging first (group chats only), then
//! membership enforcement, then command dispatch.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use tgdir_core::{activity::record_event, messaging::types::IncomingEvent};

use crate::events::to_event;
use crate::router::AppState;

mod commands;
mod membership;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Some(event) = to_event(&msg) {
        if let Err(e) = record_event(state.store.as_ref(), &event).await {
            tracing::error!(chat_id = msg.chat.id.0, error = %e, "failed to record activity");
        }

        if let IncomingEvent::MembershipChange(change) = &event {
            membership::handle_membership_change(change, &state).await;
        }
    }

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(&msg, state).await;
        }
    }

    Ok(())
}
