//! Account provisioning: invitation redemption and admin bootstrap.
//!
//! Registration is a single database transaction. If the invitation was
//! consumed by a concurrent redeemer, or the first-waiter slot was lost,
//! nothing is committed and the caller sees a clean error.

use secrecy::ExposeSecret;
use sqlx::{PgPool, Postgres, Transaction};
use tablecraft_core::{Role, TelegramId, UserId, Username};

use crate::config::AdminBootstrapConfig;
use crate::db::{self, PendingRegistration, TelegramIdentity, User, UserRepository};
use crate::error::AppError;
use crate::services::auth;

/// Credentials and identity collected during the bot dialogue.
#[derive(Debug)]
pub struct RegistrationRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub telegram: Option<&'a TelegramIdentity>,
}

/// Outcome of the admin bootstrap check.
#[derive(Debug)]
pub enum AdminBootstrap {
    /// The admin account was created just now.
    Created(User),
    /// The admin account already existed.
    Existing(User),
}

impl AdminBootstrap {
    #[must_use]
    pub const fn user(&self) -> &User {
        match self {
            Self::Created(user) | Self::Existing(user) => user,
        }
    }
}

/// Provision an account from a validated invitation.
///
/// All writes happen in one transaction: the user row, the invitation
/// redemption, and (for a manager's first waiter) the restaurant
/// assignment commit together or not at all.
///
/// # Errors
///
/// - `AppError::Validation` for a bad username or password
/// - `AppError::Conflict` if the username or Telegram account is taken
/// - `AppError::InvalidInvitation` if the code was consumed concurrently
pub async fn register(
    pool: &PgPool,
    registration: &PendingRegistration,
    request: &RegistrationRequest<'_>,
) -> Result<User, AppError> {
    let username =
        Username::parse(request.username).map_err(|e| AppError::Validation(e.to_string()))?;
    auth::validate_password(request.password)?;
    let password_hash = auth::hash_password(request.password)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(db::RepositoryError::Database)
        .map_err(AppError::from)?;

    let user = insert_user(
        &mut tx,
        &username,
        &password_hash,
        registration.role,
        request.telegram,
        registration.manager_id,
    )
    .await?;

    if let Some(invitation_id) = registration.invitation_id {
        let telegram_id = request.telegram.map(|t| t.id);
        if !redeem_in_tx(&mut tx, invitation_id, telegram_id).await? {
            tx.rollback()
                .await
                .map_err(db::RepositoryError::Database)
                .map_err(AppError::from)?;
            return Err(AppError::InvalidInvitation);
        }
    }

    // A manager's first waiter is auto-assigned to the manager's first
    // restaurant; later waiters join the staff unassigned.
    if registration.role == Role::Waiter
        && let Some(manager_id) = registration.manager_id
    {
        assign_first_waiter_in_tx(&mut tx, user.id, manager_id).await?;
    }

    tx.commit()
        .await
        .map_err(db::RepositoryError::Database)
        .map_err(AppError::from)?;

    tracing::info!(
        user_id = user.id.as_i32(),
        role = %user.role,
        "Provisioned account from invitation"
    );
    Ok(user)
}

/// Make sure the configured admin account exists, creating it on first
/// contact. Safe to call on every `/start` from the admin's Telegram ID.
///
/// # Errors
///
/// Returns `AppError::Validation` if the configured admin credentials are
/// themselves invalid.
pub async fn ensure_admin_provisioned(
    pool: &PgPool,
    config: &AdminBootstrapConfig,
    telegram: Option<&TelegramIdentity>,
) -> Result<AdminBootstrap, AppError> {
    let users = UserRepository::new(pool);
    if let Some(user) = users.get_by_telegram_id(config.telegram_id).await? {
        return Ok(AdminBootstrap::Existing(user));
    }

    let username =
        Username::parse(&config.username).map_err(|e| AppError::Validation(e.to_string()))?;
    let password_hash = auth::hash_password(config.password.expose_secret())?;

    let fallback_identity = TelegramIdentity {
        id: config.telegram_id,
        username: None,
        first_name: None,
        last_name: None,
    };
    let telegram = telegram.unwrap_or(&fallback_identity);

    match users
        .create(&username, &password_hash, Role::Admin, Some(telegram), None)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = user.id.as_i32(), "Bootstrapped admin account");
            Ok(AdminBootstrap::Created(user))
        }
        // Lost a bootstrap race; the winner's row is the admin.
        Err(db::RepositoryError::Conflict(_)) => {
            let user = users
                .get_by_telegram_id(config.telegram_id)
                .await?
                .ok_or_else(|| AppError::Internal("admin bootstrap race left no row".to_owned()))?;
            Ok(AdminBootstrap::Existing(user))
        }
        Err(e) => Err(e.into()),
    }
}

async fn insert_user(
    tx: &mut Transaction<'_, Postgres>,
    username: &Username,
    password_hash: &str,
    role: Role,
    telegram: Option<&TelegramIdentity>,
    manager_id: Option<UserId>,
) -> Result<User, AppError> {
    let row = sqlx::query_as::<_, db::users::UserRow>(&format!(
        "INSERT INTO users (username, password_hash, role, telegram_id, \
             telegram_username, telegram_first_name, telegram_last_name, \
             is_telegram_user, manager_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {}",
        db::users::USER_COLUMNS
    ))
    .bind(username.as_str())
    .bind(password_hash)
    .bind(role.as_str())
    .bind(telegram.map(|t| t.id.as_i64()))
    .bind(telegram.and_then(|t| t.username.clone()))
    .bind(telegram.and_then(|t| t.first_name.clone()))
    .bind(telegram.and_then(|t| t.last_name.clone()))
    .bind(telegram.is_some())
    .bind(manager_id.map(|id| id.as_i32()))
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| db::conflict_on_unique(e, "username already registered"))?;

    Ok(row.try_into()?)
}

async fn redeem_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    invitation_id: tablecraft_core::InvitationId,
    telegram_id: Option<TelegramId>,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE invitations \
         SET is_used = TRUE, used_at = NOW(), telegram_id = $2 \
         WHERE id = $1 AND is_used = FALSE",
    )
    .bind(invitation_id.as_i32())
    .bind(telegram_id.map(|t| t.as_i64()))
    .execute(&mut **tx)
    .await
    .map_err(db::RepositoryError::Database)?;

    Ok(result.rows_affected() == 1)
}

async fn assign_first_waiter_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    waiter_id: UserId,
    manager_id: UserId,
) -> Result<(), AppError> {
    // Conditional update: only succeeds while the slot is empty, so a
    // concurrent registration cannot displace the first waiter.
    sqlx::query(
        "UPDATE restaurants SET waiter_id = $1 \
         WHERE id = (SELECT id FROM restaurants WHERE manager_id = $2 ORDER BY id LIMIT 1) \
           AND waiter_id IS NULL",
    )
    .bind(waiter_id.as_i32())
    .bind(manager_id.as_i32())
    .execute(&mut **tx)
    .await
    .map_err(db::RepositoryError::Database)?;

    Ok(())
}
