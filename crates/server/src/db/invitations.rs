//! Invitation repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tablecraft_core::{InvitationId, TelegramId, UserId};

use super::RepositoryError;

/// A one-shot invitation code stored in the database.
///
/// Manager reusable links live on the `users` row instead; only
/// single-redemption codes (admin-issued manager invites and legacy bare
/// codes) are persisted here.
#[derive(Debug, Clone)]
pub struct Invitation {
    pub id: InvitationId,
    pub code: String,
    /// The user who issued the code (the admin for manager invites).
    pub manager_id: UserId,
    pub telegram_id: Option<TelegramId>,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct InvitationRow {
    id: i32,
    code: String,
    manager_id: i32,
    telegram_id: Option<i64>,
    is_used: bool,
    used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<InvitationRow> for Invitation {
    fn from(row: InvitationRow) -> Self {
        Self {
            id: InvitationId::new(row.id),
            code: row.code,
            manager_id: UserId::new(row.manager_id),
            telegram_id: row.telegram_id.map(TelegramId::new),
            is_used: row.is_used,
            used_at: row.used_at,
            created_at: row.created_at,
        }
    }
}

const COLUMNS: &str = "id, code, manager_id, telegram_id, is_used, used_at, created_at";

/// Repository for invitation database operations.
pub struct InvitationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InvitationRepository<'a> {
    /// Create a new invitation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up an unredeemed invitation by its exact code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code_unused(
        &self,
        code: &str,
    ) -> Result<Option<Invitation>, RepositoryError> {
        let row = sqlx::query_as::<_, InvitationRow>(&format!(
            "SELECT {COLUMNS} FROM invitations WHERE code = $1 AND is_used = FALSE"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Persist a new invitation code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    pub async fn create(
        &self,
        code: &str,
        issued_by: UserId,
    ) -> Result<Invitation, RepositoryError> {
        let row = sqlx::query_as::<_, InvitationRow>(&format!(
            "INSERT INTO invitations (code, manager_id) VALUES ($1, $2) RETURNING {COLUMNS}"
        ))
        .bind(code)
        .bind(issued_by.as_i32())
        .fetch_one(self.pool)
        .await
        .map_err(|e| super::conflict_on_unique(e, "invitation code already exists"))?;

        Ok(row.into())
    }
}
