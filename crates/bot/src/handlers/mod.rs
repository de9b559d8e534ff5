//! Update dispatch: commands first, then dialogue state, then role
//! keyboards, then the generic help fallback.

pub mod admin;
pub mod manager;
pub mod password;
pub mod registration;
pub mod waiter;

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use tablecraft_core::TelegramId;
use tablecraft_server::ServerConfig;
use tablecraft_server::db::{
    ChatSessionRepository, ConversationState, RepositoryError, TelegramIdentity, User,
    UserRepository,
};
use tablecraft_server::error::AppError;

use crate::keyboards;
use crate::telegram::types::{Message, ReplyMarkup, Update};
use crate::telegram::{TelegramClient, TelegramError};

pub const HELP_TEXT: &str = "Available commands:\n\
    /start - begin, or redeem an invitation link\n\
    /help - this message\n\
    /reset_password - set a new password\n\
    /myid - show your Telegram ID\n\
    /cancel - abandon the current dialogue";

const TRY_AGAIN_TEXT: &str = "Something went wrong on our side, please try again.";

/// Handler errors. `App` carries recoverable outcomes such as validation
/// failures; everything else is logged and answered with a generic message.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Telegram(#[from] TelegramError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Everything a handler needs: the Bot API client, the database pool, and
/// the server configuration (admin bootstrap, base URL, bot username).
#[derive(Clone)]
pub struct BotContext {
    pub client: TelegramClient,
    pub pool: PgPool,
    pub config: Arc<ServerConfig>,
}

impl BotContext {
    pub async fn send(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        self.client.send_message(chat_id, text, None).await?;
        Ok(())
    }

    pub async fn send_with(
        &self,
        chat_id: i64,
        text: &str,
        markup: ReplyMarkup,
    ) -> Result<(), BotError> {
        self.client.send_message(chat_id, text, Some(markup)).await?;
        Ok(())
    }

    pub fn sessions(&self) -> ChatSessionRepository<'_> {
        ChatSessionRepository::new(&self.pool)
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.pool)
    }

    pub fn bot_username(&self) -> &str {
        &self.config.telegram.bot_username
    }
}

/// The Telegram identity attached to a message, if the sender is known.
#[must_use]
pub fn sender_identity(message: &Message) -> Option<TelegramIdentity> {
    message.from.as_ref().map(|from| TelegramIdentity {
        id: TelegramId::new(from.id),
        username: from.username.clone(),
        first_name: Some(from.first_name.clone()),
        last_name: from.last_name.clone(),
    })
}

/// Entry point for one update. Errors never escape: store and API failures
/// are logged and the chat gets a generic retry message.
pub async fn handle_update(ctx: &BotContext, update: Update) {
    let Some(message) = update.message else {
        return;
    };
    let chat_id = message.chat.id;

    if let Err(error) = handle_message(ctx, &message).await {
        tracing::error!(chat_id, %error, "Failed to handle message");
        if let Err(error) = ctx.send(chat_id, TRY_AGAIN_TEXT).await {
            tracing::error!(chat_id, %error, "Failed to send error reply");
        }
    }
}

async fn handle_message(ctx: &BotContext, message: &Message) -> Result<(), BotError> {
    let Some(text) = message.text.as_deref() else {
        return Ok(());
    };
    let text = text.trim();
    let chat_id = message.chat.id;
    let telegram_id = TelegramId::new(chat_id);

    // Commands interrupt whatever dialogue is in progress.
    if let Some(command) = text.strip_prefix('/') {
        let (command, payload) = match command.split_once(char::is_whitespace) {
            Some((command, payload)) => (command, Some(payload.trim())),
            None => (command, None),
        };
        match command {
            "start" => return registration::start(ctx, message, payload).await,
            "help" => return ctx.send(chat_id, HELP_TEXT).await,
            "myid" => return ctx.send(chat_id, &format!("Your Telegram ID: {chat_id}")).await,
            "cancel" => return cancel(ctx, telegram_id, chat_id).await,
            "reset_password" => return password::request_reset(ctx, telegram_id, chat_id).await,
            _ => return ctx.send(chat_id, HELP_TEXT).await,
        }
    }

    // Dialogue in progress takes the raw text.
    match ctx.sessions().state(telegram_id).await? {
        ConversationState::Idle => {}
        state @ (ConversationState::AwaitingChoice
        | ConversationState::AwaitingInvitationCode
        | ConversationState::AwaitingUsername { .. }
        | ConversationState::AwaitingPassword { .. }) => {
            return registration::advance(ctx, message, state).await;
        }
        ConversationState::AwaitingNewPassword => {
            return password::complete_reset(ctx, telegram_id, chat_id, text).await;
        }
    }

    // Idle: match keyboard buttons for the sender's role.
    match ctx.users().get_by_telegram_id(telegram_id).await? {
        Some(user) => dispatch_button(ctx, &user, chat_id, text).await,
        None => {
            ctx.sessions()
                .set_state(telegram_id, &ConversationState::AwaitingChoice)
                .await?;
            ctx.send_with(
                chat_id,
                registration::CHOOSE_REGISTRATION_TEXT,
                keyboards::unregistered(),
            )
            .await
        }
    }
}

async fn dispatch_button(
    ctx: &BotContext,
    user: &User,
    chat_id: i64,
    text: &str,
) -> Result<(), BotError> {
    use tablecraft_core::Role;

    match (user.role, text) {
        (Role::Admin, keyboards::INVITE_MANAGER) => admin::invite_manager(ctx, user, chat_id).await,
        (Role::Admin, keyboards::STATISTICS) => admin::statistics(ctx, chat_id).await,
        (Role::Manager, keyboards::INVITATION_LINK) => {
            manager::invitation_link(ctx, user, chat_id).await
        }
        (Role::Manager, keyboards::MY_WAITERS) => manager::my_waiters(ctx, user, chat_id).await,
        (Role::Manager, keyboards::WAITER_STATISTICS) => {
            manager::waiter_statistics(ctx, user, chat_id).await
        }
        (Role::Manager, keyboards::WORK_WITH_MENU) => {
            manager::work_with_menu(ctx, user, chat_id).await
        }
        (Role::Manager, keyboards::CREATE_RESTAURANT) => {
            manager::create_restaurant(ctx, user, chat_id).await
        }
        (Role::Waiter, keyboards::MENU) => waiter::menu(ctx, user, chat_id).await,
        _ => ctx.send(chat_id, HELP_TEXT).await,
    }
}

async fn cancel(ctx: &BotContext, telegram_id: TelegramId, chat_id: i64) -> Result<(), BotError> {
    ctx.sessions().clear(telegram_id).await?;
    match ctx.users().get_by_telegram_id(telegram_id).await? {
        Some(user) => {
            ctx.send_with(chat_id, "Cancelled.", keyboards::for_role(user.role))
                .await
        }
        None => {
            ctx.send_with(chat_id, "Cancelled.", keyboards::unregistered())
                .await
        }
    }
}
