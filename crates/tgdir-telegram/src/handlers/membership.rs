use tgdir_core::{
    domain::UserId, messaging::types::MembershipChange, restriction::BotAddedOutcome,
};

use crate::router::AppState;

fn bot_was_added(change: &MembershipChange, bot_id: UserId) -> bool {
    change.added.iter().any(|p| p.id == bot_id)
}

/// Enforce restrictions when the bot itself shows up among the new members.
pub async fn handle_membership_change(change: &MembershipChange, state: &AppState) {
    if !bot_was_added(change, state.bot_id) {
        return;
    }

    match state
        .restrictions
        .on_bot_added(&change.chat, &change.actor)
        .await
    {
        Ok(BotAddedOutcome::Refused { left: false }) => {
            tracing::warn!(
                chat_id = change.chat.id.0,
                "re-added to a restricted chat and could not leave"
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!(chat_id = change.chat.id.0, error = %e, "restriction check failed");
        }
    }
}
