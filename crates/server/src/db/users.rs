//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tablecraft_core::{Role, TelegramId, UserId, Username};

use super::RepositoryError;

/// A user account (domain type).
///
/// The password hash is deliberately not carried here; fetch it through
/// [`UserRepository::credentials_by_username`] when verifying a login.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login username.
    pub username: Username,
    /// Assigned role.
    pub role: Role,
    /// Inactive users cannot authenticate.
    pub is_active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// Telegram identity, present for bot-registered users.
    pub telegram_id: Option<TelegramId>,
    pub telegram_username: Option<String>,
    pub telegram_first_name: Option<String>,
    pub telegram_last_name: Option<String>,
    pub is_telegram_user: bool,
    /// Permanent waiter-invitation link (managers only, lazily created).
    pub waiter_link: Option<String>,
    /// The manager this waiter reports to.
    pub manager_id: Option<UserId>,
}

impl User {
    /// Display name preferring the Telegram first name over the login.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.telegram_first_name
            .as_deref()
            .unwrap_or_else(|| self.username.as_str())
    }
}

/// Telegram identity fields attached to a user at registration.
#[derive(Debug, Clone)]
pub struct TelegramIdentity {
    pub id: TelegramId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: i32,
    username: String,
    password_hash: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    telegram_id: Option<i64>,
    telegram_username: Option<String>,
    telegram_first_name: Option<String>,
    telegram_last_name: Option<String>,
    is_telegram_user: bool,
    waiter_link: Option<String>,
    manager_id: Option<i32>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        let role = row.role.parse::<Role>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            username,
            role,
            is_active: row.is_active,
            created_at: row.created_at,
            telegram_id: row.telegram_id.map(TelegramId::new),
            telegram_username: row.telegram_username,
            telegram_first_name: row.telegram_first_name,
            telegram_last_name: row.telegram_last_name,
            is_telegram_user: row.is_telegram_user,
            waiter_link: row.waiter_link,
            manager_id: row.manager_id.map(UserId::new),
        })
    }
}

pub(crate) const USER_COLUMNS: &str = "id, username, password_hash, role, is_active, created_at, \
     telegram_id, telegram_username, telegram_first_name, telegram_last_name, \
     is_telegram_user, waiter_link, manager_id";

/// Overview of a manager for the admin statistics screen.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ManagerOverview {
    pub username: String,
    pub telegram_first_name: Option<String>,
    pub waiters_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by Telegram ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_telegram_id(
        &self,
        telegram_id: TelegramId,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE telegram_id = $1"
        ))
        .bind(telegram_id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user together with their password hash, for login verification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn credentials_by_username(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => {
                let hash = row.password_hash.clone();
                Ok(Some((row.try_into()?, hash)))
            }
            None => Ok(None),
        }
    }

    /// Create a user, optionally with a Telegram identity and manager link.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or Telegram ID is
    /// already taken, `RepositoryError::Database` for other failures.
    pub async fn create(
        &self,
        username: &Username,
        password_hash: &str,
        role: Role,
        telegram: Option<&TelegramIdentity>,
        manager_id: Option<UserId>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (username, password_hash, role, telegram_id, \
                 telegram_username, telegram_first_name, telegram_last_name, \
                 is_telegram_user, manager_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {USER_COLUMNS}"
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
        .fetch_one(self.pool)
        .await
        .map_err(|e| super::conflict_on_unique(e, "username already registered"))?;

        row.try_into()
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Store a manager's permanent waiter link if none is set yet, and
    /// return whichever link is stored afterwards.
    ///
    /// The conditional update makes get-or-create idempotent under
    /// concurrent calls: only the first writer wins, everyone reads the
    /// same stored link back.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the manager does not exist.
    pub async fn claim_waiter_link(
        &self,
        id: UserId,
        link: &str,
    ) -> Result<String, RepositoryError> {
        sqlx::query("UPDATE users SET waiter_link = $1 WHERE id = $2 AND waiter_link IS NULL")
            .bind(link)
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        let stored: Option<Option<String>> =
            sqlx::query_scalar("SELECT waiter_link FROM users WHERE id = $1")
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        stored
            .ok_or(RepositoryError::NotFound)?
            .ok_or_else(|| RepositoryError::DataCorruption("waiter link vanished".to_owned()))
    }

    /// List the waiters reporting to a manager.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn waiters_of_manager(
        &self,
        manager_id: UserId,
    ) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE manager_id = $1 ORDER BY created_at"
        ))
        .bind(manager_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Count users holding a given role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_role(&self, role: Role) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Per-manager summary for the admin statistics view.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn manager_overview(&self) -> Result<Vec<ManagerOverview>, RepositoryError> {
        let rows = sqlx::query_as::<_, ManagerOverview>(
            "SELECT m.username, m.telegram_first_name, m.created_at, \
                    (SELECT COUNT(*) FROM users w WHERE w.manager_id = m.id) AS waiters_count \
             FROM users m WHERE m.role = 'manager' ORDER BY m.created_at",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
