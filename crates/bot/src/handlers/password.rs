//! The `/reset_password` dialogue.

use tablecraft_core::TelegramId;
use tablecraft_server::db::ConversationState;
use tablecraft_server::services::auth;

use crate::keyboards;

use super::{BotContext, BotError};

/// `/reset_password`: registered users move to the new-password prompt.
pub async fn request_reset(
    ctx: &BotContext,
    telegram_id: TelegramId,
    chat_id: i64,
) -> Result<(), BotError> {
    if ctx.users().get_by_telegram_id(telegram_id).await?.is_none() {
        return ctx
            .send(chat_id, "You are not registered yet. Use /start with an invitation link.")
            .await;
    }

    ctx.sessions()
        .set_state(telegram_id, &ConversationState::AwaitingNewPassword)
        .await?;
    ctx.send(chat_id, "Send me your new password: 6 to 50 characters. Or /cancel.")
        .await
}

/// The new password arrived: validate, re-hash, persist, clear state.
pub async fn complete_reset(
    ctx: &BotContext,
    telegram_id: TelegramId,
    chat_id: i64,
    password: &str,
) -> Result<(), BotError> {
    let Some(user) = ctx.users().get_by_telegram_id(telegram_id).await? else {
        // Account disappeared mid-dialogue.
        ctx.sessions().clear(telegram_id).await?;
        return ctx
            .send(chat_id, "You are not registered yet. Use /start with an invitation link.")
            .await;
    };

    if let Err(e) = auth::validate_password(password) {
        return ctx.send(chat_id, &format!("{e} Try again, or /cancel.")).await;
    }

    let hash = auth::hash_password(password)?;
    ctx.users().set_password_hash(user.id, &hash).await?;
    ctx.sessions().clear(telegram_id).await?;

    tracing::info!(user_id = user.id.as_i32(), "Password reset via bot");
    ctx.send_with(chat_id, "Password updated.", keyboards::for_role(user.role))
        .await
}
