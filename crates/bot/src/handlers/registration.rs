//! The `/start` command and the invite-code registration dialogue.

use secrecy::ExposeSecret;
use tablecraft_core::{Role, TelegramId, Username};
use tablecraft_server::db::{ConversationState, PendingRegistration};
use tablecraft_server::error::AppError;
use tablecraft_server::services::provisioning::{self, AdminBootstrap, RegistrationRequest};
use tablecraft_server::services::invites;

use crate::keyboards;
use crate::telegram::types::{Message, ReplyMarkup};

use super::{BotContext, BotError, sender_identity};

pub(crate) const CHOOSE_REGISTRATION_TEXT: &str = "Hi! How would you like to register? \
    Sign up as a manager, or use the invitation from your manager if you are joining as staff.";

const INVALID_INVITE_TEXT: &str = "That invitation is invalid or already used. \
    Check the link with whoever sent it, or /cancel.";

const USERNAME_PROMPT: &str = "Choose a username: 3-20 letters, digits, or underscores.";

const PASSWORD_PROMPT: &str = "Now choose a password: 6 to 50 characters.";

/// `/start`, with an optional `invite_<code>` deep-link payload.
pub async fn start(
    ctx: &BotContext,
    message: &Message,
    payload: Option<&str>,
) -> Result<(), BotError> {
    let chat_id = message.chat.id;
    let telegram_id = TelegramId::new(chat_id);
    let identity = sender_identity(message);

    // The configured admin ID provisions itself on first contact.
    if telegram_id == ctx.config.admin.telegram_id {
        let bootstrap =
            provisioning::ensure_admin_provisioned(&ctx.pool, &ctx.config.admin, identity.as_ref())
                .await?;
        ctx.sessions().clear(telegram_id).await?;
        // The credentials are echoed once, on creation only.
        let greeting = match &bootstrap {
            AdminBootstrap::Created(user) => format!(
                "Welcome, {}! Your admin account is ready.\nLogin: {}\nPassword: {}",
                user.display_name(),
                ctx.config.admin.username,
                ctx.config.admin.password.expose_secret()
            ),
            AdminBootstrap::Existing(user) => {
                format!("Welcome back, {}!", user.display_name())
            }
        };
        return ctx
            .send_with(chat_id, &greeting, keyboards::for_role(Role::Admin))
            .await;
    }

    if let Some(user) = ctx.users().get_by_telegram_id(telegram_id).await? {
        ctx.sessions().clear(telegram_id).await?;
        return ctx
            .send_with(
                chat_id,
                &format!("Welcome back, {}!", user.display_name()),
                keyboards::for_role(user.role),
            )
            .await;
    }

    match payload {
        Some(code) if !code.is_empty() => begin_with_code(ctx, telegram_id, chat_id, code).await,
        _ => {
            ctx.sessions()
                .set_state(telegram_id, &ConversationState::AwaitingChoice)
                .await?;
            ctx.send_with(chat_id, CHOOSE_REGISTRATION_TEXT, keyboards::unregistered())
                .await
        }
    }
}

/// One step of the registration dialogue, for a chat already mid-flow.
pub async fn advance(
    ctx: &BotContext,
    message: &Message,
    state: ConversationState,
) -> Result<(), BotError> {
    let chat_id = message.chat.id;
    let telegram_id = TelegramId::new(chat_id);
    let text = message.text.as_deref().unwrap_or_default().trim();

    match state {
        ConversationState::AwaitingChoice => match text {
            t if t == keyboards::REGISTER_MANAGER => {
                let registration = PendingRegistration {
                    role: Role::Manager,
                    manager_id: None,
                    invitation_id: None,
                };
                ctx.sessions()
                    .set_state(telegram_id, &ConversationState::AwaitingUsername { registration })
                    .await?;
                ctx.send_with(
                    chat_id,
                    &format!("Registering as a manager. {USERNAME_PROMPT}"),
                    ReplyMarkup::remove(),
                )
                .await
            }
            t if t == keyboards::HAVE_INVITE => {
                ctx.sessions()
                    .set_state(telegram_id, &ConversationState::AwaitingInvitationCode)
                    .await?;
                ctx.send_with(
                    chat_id,
                    "Send me your invitation code.",
                    ReplyMarkup::remove(),
                )
                .await
            }
            _ => {
                ctx.send_with(chat_id, CHOOSE_REGISTRATION_TEXT, keyboards::unregistered())
                    .await
            }
        },
        ConversationState::AwaitingInvitationCode => {
            begin_with_code(ctx, telegram_id, chat_id, text).await
        }
        ConversationState::AwaitingUsername { registration } => {
            take_username(ctx, telegram_id, chat_id, text, registration).await
        }
        ConversationState::AwaitingPassword {
            registration,
            username,
        } => take_password(ctx, message, registration, &username).await,
        ConversationState::Idle | ConversationState::AwaitingNewPassword => Ok(()),
    }
}

async fn begin_with_code(
    ctx: &BotContext,
    telegram_id: TelegramId,
    chat_id: i64,
    code: &str,
) -> Result<(), BotError> {
    match invites::resolve_invite(&ctx.pool, code).await {
        Ok(registration) => {
            ctx.sessions()
                .set_state(telegram_id, &invites::registration_state(registration))
                .await?;
            ctx.send_with(
                chat_id,
                &format!("Invitation accepted! {USERNAME_PROMPT}"),
                ReplyMarkup::remove(),
            )
            .await
        }
        Err(AppError::InvalidInvitation) => ctx.send(chat_id, INVALID_INVITE_TEXT).await,
        Err(e) => Err(e.into()),
    }
}

async fn take_username(
    ctx: &BotContext,
    telegram_id: TelegramId,
    chat_id: i64,
    text: &str,
    registration: PendingRegistration,
) -> Result<(), BotError> {
    let username = match Username::parse(text) {
        Ok(username) => username,
        Err(e) => return ctx.send(chat_id, &format!("{e} Try another username.")).await,
    };

    if ctx.users().get_by_username(username.as_str()).await?.is_some() {
        return ctx
            .send(chat_id, "That username is taken. Try another one.")
            .await;
    }

    ctx.sessions()
        .set_state(
            telegram_id,
            &ConversationState::AwaitingPassword {
                registration,
                username: username.as_str().to_owned(),
            },
        )
        .await?;
    ctx.send(chat_id, PASSWORD_PROMPT).await
}

async fn take_password(
    ctx: &BotContext,
    message: &Message,
    registration: PendingRegistration,
    username: &str,
) -> Result<(), BotError> {
    let chat_id = message.chat.id;
    let telegram_id = TelegramId::new(chat_id);
    let identity = sender_identity(message);
    let password = message.text.as_deref().unwrap_or_default().trim();

    let request = RegistrationRequest {
        username,
        password,
        telegram: identity.as_ref(),
    };

    match provisioning::register(&ctx.pool, &registration, &request).await {
        Ok(user) => {
            ctx.sessions().clear(telegram_id).await?;
            let text = match user.role {
                Role::Manager => format!(
                    "You're all set, {}! You are registered as a manager. \
                     Create your restaurant to get started.",
                    user.display_name()
                ),
                _ => format!(
                    "You're all set, {}! You are registered as a waiter.",
                    user.display_name()
                ),
            };
            ctx.send_with(chat_id, &text, keyboards::for_role(user.role))
                .await
        }
        // Validation failures re-prompt in place.
        Err(AppError::Validation(reason)) => {
            ctx.send(chat_id, &format!("{reason} Try another password.")).await
        }
        // Lost a username race between the availability check and the insert.
        Err(AppError::Conflict(_)) => {
            ctx.sessions()
                .set_state(
                    telegram_id,
                    &ConversationState::AwaitingUsername { registration },
                )
                .await?;
            ctx.send(chat_id, "That username was just taken. Choose another one.")
                .await
        }
        Err(AppError::InvalidInvitation) => {
            ctx.sessions().clear(telegram_id).await?;
            ctx.send(chat_id, INVALID_INVITE_TEXT).await
        }
        Err(e) => Err(e.into()),
    }
}
