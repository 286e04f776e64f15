//! teloxide `Message` -> core `IncomingEvent`.

use teloxide::types::{Message, User};

use tgdir_core::{
    domain::{ChatId, ChatInfo, Participant, UserId},
    messaging::types::{
        ChatMigration, ForwardedMessage, IncomingEvent, MembershipChange, TextMessage,
    },
};

pub fn participant(u: &User) -> Participant {
    Participant {
        id: UserId(u.id.0 as i64),
        username: u.username.clone(),
        first_name: u.first_name.clone(),
    }
}

/// Classify a message. `None` for messages without a sender (channel posts).
pub fn to_event(msg: &Message) -> Option<IncomingEvent> {
    let chat = ChatInfo {
        id: ChatId(msg.chat.id.0),
        title: msg.chat.title().map(str::to_string),
    };

    if let Some(new_id) = msg.migrate_to_chat_id() {
        return Some(IncomingEvent::ChatMigrated(ChatMigration {
            old_id: chat.id,
            new_id: ChatId(new_id.0),
        }));
    }

    let sender = participant(msg.from()?);

    if let Some(members) = msg.new_chat_members() {
        return Some(IncomingEvent::MembershipChange(MembershipChange {
            chat,
            actor: sender,
            added: members.iter().map(participant).collect(),
        }));
    }

    if let Some(origin) = msg.forward_from_user() {
        return Some(IncomingEvent::Forwarded(ForwardedMessage {
            chat,
            sender,
            origin: participant(origin),
        }));
    }

    Some(IncomingEvent::Text(TextMessage {
        chat,
        sender,
        reply_to: msg
            .reply_to_message()
            .and_then(|r| r.from())
            .map(participant),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group_message(extra: serde_json::Value) -> Message {
        let mut v = json!({
            "message_id": 10,
            "date": 1_700_000_000,
            "chat": { "id": -100, "type": "supergroup", "title": "Cats" },
            "from": { "id": 1, "is_bot": false, "first_name": "Ann", "username": "annie" }
        });
        for (k, val) in extra.as_object().unwrap() {
            v[k] = val.clone();
        }
        serde_json::from_value(v).unwrap()
    }

    fn user_json(id: i64, name: &str) -> serde_json::Value {
        json!({ "id": id, "is_bot": false, "first_name": name, "username": name })
    }

    #[test]
    fn plain_text_with_reply() {
        let reply = json!({
            "message_id": 9,
            "date": 1_699_999_999,
            "chat": { "id": -100, "type": "supergroup", "title": "Cats" },
            "from": user_json(2, "bobby"),
            "text": "earlier"
        });
        let msg = group_message(json!({ "text": "hi", "reply_to_message": reply }));

        let Some(IncomingEvent::Text(t)) = to_event(&msg) else {
            panic!("expected text event");
        };
        assert_eq!(t.chat.id, ChatId(-100));
        assert_eq!(t.chat.title.as_deref(), Some("Cats"));
        assert_eq!(t.sender.id, UserId(1));
        assert_eq!(t.sender.username.as_deref(), Some("annie"));
        assert_eq!(t.reply_to.map(|p| p.id), Some(UserId(2)));
    }

    #[test]
    fn new_members_become_membership_change() {
        let msg = group_message(json!({
            "new_chat_members": [user_json(5, "dirbot"), user_json(6, "carol")]
        }));

        let Some(IncomingEvent::MembershipChange(m)) = to_event(&msg) else {
            panic!("expected membership change");
        };
        assert_eq!(m.actor.id, UserId(1));
        let added: Vec<UserId> = m.added.iter().map(|p| p.id).collect();
        assert_eq!(added, vec![UserId(5), UserId(6)]);
    }

    #[test]
    fn forwarded_message_keeps_origin() {
        let msg = group_message(json!({
            "text": "fwd",
            "forward_from": user_json(3, "carol"),
            "forward_date": 1_600_000_000
        }));

        let Some(IncomingEvent::Forwarded(f)) = to_event(&msg) else {
            panic!("expected forwarded message");
        };
        assert_eq!(f.origin.id, UserId(3));
        assert_eq!(f.sender.id, UserId(1));
    }

    #[test]
    fn migration_service_message() {
        let msg = group_message(json!({ "migrate_to_chat_id": -1_001_234 }));

        let Some(IncomingEvent::ChatMigrated(m)) = to_event(&msg) else {
            panic!("expected migration");
        };
        assert_eq!(m.old_id, ChatId(-100));
        assert_eq!(m.new_id, ChatId(-1_001_234));
    }
}
