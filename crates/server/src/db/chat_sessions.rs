//! Chat session repository: per-chat conversation state for the bot.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;

use tablecraft_core::{ChatSessionId, InvitationId, Role, TelegramId, UserId};

use super::RepositoryError;

/// Registration details carried across the multi-step bot dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRegistration {
    pub role: Role,
    pub manager_id: Option<UserId>,
    pub invitation_id: Option<InvitationId>,
}

/// Where a Telegram chat currently is in its dialogue with the bot.
///
/// Serialized into the session row as a state label plus a JSON payload, so
/// a restarted bot resumes every conversation where it stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingChoice,
    AwaitingInvitationCode,
    AwaitingUsername {
        registration: PendingRegistration,
    },
    AwaitingPassword {
        registration: PendingRegistration,
        username: String,
    },
    AwaitingNewPassword,
}

impl ConversationState {
    /// The label stored in the `state` column.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingChoice => "awaiting_choice",
            Self::AwaitingInvitationCode => "awaiting_invitation_code",
            Self::AwaitingUsername { .. } => "awaiting_username",
            Self::AwaitingPassword { .. } => "awaiting_password",
            Self::AwaitingNewPassword => "awaiting_new_password",
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChatSessionRow {
    id: i32,
    telegram_id: i64,
    state: String,
    data: Value,
}

/// A persisted chat session.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: ChatSessionId,
    pub telegram_id: TelegramId,
    pub state: ConversationState,
}

impl TryFrom<ChatSessionRow> for ChatSession {
    type Error = RepositoryError;

    fn try_from(row: ChatSessionRow) -> Result<Self, Self::Error> {
        let state = serde_json::from_value(row.data).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "chat session {} has invalid state data: {e}",
                row.id
            ))
        })?;
        Ok(Self {
            id: ChatSessionId::new(row.id),
            telegram_id: TelegramId::new(row.telegram_id),
            state,
        })
    }
}

/// Repository for chat session database operations.
pub struct ChatSessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ChatSessionRepository<'a> {
    /// Create a new chat session repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current state for a chat, defaulting to `Idle` when no row exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored payload is invalid.
    pub async fn state(
        &self,
        telegram_id: TelegramId,
    ) -> Result<ConversationState, RepositoryError> {
        let row = sqlx::query_as::<_, ChatSessionRow>(
            "SELECT id, telegram_id, state, data FROM chat_sessions WHERE telegram_id = $1",
        )
        .bind(telegram_id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(ChatSession::try_from(row)?.state),
            None => Ok(ConversationState::Idle),
        }
    }

    /// Store the state for a chat, creating the session row if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_state(
        &self,
        telegram_id: TelegramId,
        state: &ConversationState,
    ) -> Result<(), RepositoryError> {
        let data = serde_json::to_value(state).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize chat state: {e}"))
        })?;

        sqlx::query(
            "INSERT INTO chat_sessions (telegram_id, state, data) VALUES ($1, $2, $3) \
             ON CONFLICT (telegram_id) \
             DO UPDATE SET state = EXCLUDED.state, data = EXCLUDED.data, updated_at = NOW()",
        )
        .bind(telegram_id.as_i64())
        .bind(state.label())
        .bind(data)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Reset a chat back to `Idle`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, telegram_id: TelegramId) -> Result<(), RepositoryError> {
        self.set_state(telegram_id, &ConversationState::Idle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> PendingRegistration {
        PendingRegistration {
            role: Role::Waiter,
            manager_id: Some(UserId::new(7)),
            invitation_id: None,
        }
    }

    #[test]
    fn state_serializes_with_label_and_payload() {
        let state = ConversationState::AwaitingUsername {
            registration: registration(),
        };
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["state"], "awaiting_username");
        assert_eq!(value["data"]["registration"]["role"], "waiter");
    }

    #[test]
    fn state_round_trips() {
        let states = [
            ConversationState::Idle,
            ConversationState::AwaitingChoice,
            ConversationState::AwaitingInvitationCode,
            ConversationState::AwaitingUsername {
                registration: registration(),
            },
            ConversationState::AwaitingPassword {
                registration: registration(),
                username: "anna_w".to_owned(),
            },
            ConversationState::AwaitingNewPassword,
        ];
        for state in states {
            let json = serde_json::to_string(&state).unwrap();
            let back: ConversationState = serde_json::from_str(&json).unwrap();
            assert_eq!(back, state);
        }
    }

    #[test]
    fn label_matches_serialized_tag() {
        let state = ConversationState::AwaitingPassword {
            registration: registration(),
            username: "anna_w".to_owned(),
        };
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["state"], state.label());
    }

    #[test]
    fn default_state_is_idle() {
        assert_eq!(ConversationState::default(), ConversationState::Idle);
    }
}
