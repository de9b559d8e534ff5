//! Telegram Bot API wire types (the subset this bot uses).

use serde::{Deserialize, Serialize};

/// Envelope every Bot API response arrives in.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

/// An incoming update from `getUpdates`.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// An incoming message.
#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

/// The Telegram account a message came from.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Identity returned by `getMe`.
#[derive(Debug, Deserialize)]
pub struct BotIdentity {
    pub id: i64,
    pub username: Option<String>,
}

/// Payload for `sendMessage`.
#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

/// Reply markup variants we send.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Keyboard(ReplyKeyboardMarkup),
    Remove(ReplyKeyboardRemove),
}

/// A persistent reply keyboard shown under the input field.
#[derive(Debug, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
}

#[derive(Debug, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyKeyboardRemove {
    pub remove_keyboard: bool,
}

impl ReplyMarkup {
    /// Build a keyboard from rows of button labels.
    #[must_use]
    pub fn keyboard(rows: &[&[&str]]) -> Self {
        Self::Keyboard(ReplyKeyboardMarkup {
            keyboard: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|text| KeyboardButton {
                            text: (*text).to_owned(),
                        })
                        .collect()
                })
                .collect(),
            resize_keyboard: true,
        })
    }

    /// Markup that removes any visible keyboard.
    #[must_use]
    pub const fn remove() -> Self {
        Self::Remove(ReplyKeyboardRemove {
            remove_keyboard: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_markup_serializes_rows() {
        let markup = ReplyMarkup::keyboard(&[&["A", "B"], &["C"]]);
        let value = serde_json::to_value(&markup).unwrap();
        assert_eq!(value["keyboard"][0][1]["text"], "B");
        assert_eq!(value["keyboard"][1][0]["text"], "C");
        assert_eq!(value["resize_keyboard"], true);
    }

    #[test]
    fn update_deserializes_without_message() {
        let update: Update = serde_json::from_str(r#"{"update_id": 7}"#).unwrap();
        assert_eq!(update.update_id, 7);
        assert!(update.message.is_none());
    }

    #[test]
    fn message_deserializes_from_api_shape() {
        let json = r#"{
            "message_id": 1,
            "from": {"id": 42, "first_name": "Anna", "username": "anna"},
            "chat": {"id": 42},
            "text": "/start invite_manager_3_ABCD1234"
        }"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(
            message.text.as_deref(),
            Some("/start invite_manager_3_ABCD1234")
        );
    }
}
