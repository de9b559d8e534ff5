//! Section repository for database operations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use tablecraft_core::{RestaurantId, SectionId};

use super::RepositoryError;

/// A menu section, the top level of a restaurant's menu.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    pub description: Option<String>,
    pub restaurant_id: RestaurantId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct SectionRow {
    id: i32,
    name: String,
    description: Option<String>,
    restaurant_id: i32,
    created_at: DateTime<Utc>,
}

impl From<SectionRow> for Section {
    fn from(row: SectionRow) -> Self {
        Self {
            id: SectionId::new(row.id),
            name: row.name,
            description: row.description,
            restaurant_id: RestaurantId::new(row.restaurant_id),
            created_at: row.created_at,
        }
    }
}

const COLUMNS: &str = "id, name, description, restaurant_id, created_at";

/// Repository for section database operations.
pub struct SectionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SectionRepository<'a> {
    /// Create a new section repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a section by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: SectionId) -> Result<Option<Section>, RepositoryError> {
        let row = sqlx::query_as::<_, SectionRow>(&format!(
            "SELECT {COLUMNS} FROM sections WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List sections with skip/limit pagination.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Section>, RepositoryError> {
        let rows = sqlx::query_as::<_, SectionRow>(&format!(
            "SELECT {COLUMNS} FROM sections ORDER BY id OFFSET $1 LIMIT $2"
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Sections belonging to a restaurant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_restaurant(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<Section>, RepositoryError> {
        let rows = sqlx::query_as::<_, SectionRow>(&format!(
            "SELECT {COLUMNS} FROM sections WHERE restaurant_id = $1 ORDER BY id"
        ))
        .bind(restaurant_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a section.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        restaurant_id: RestaurantId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Section, RepositoryError> {
        let row = sqlx::query_as::<_, SectionRow>(&format!(
            "INSERT INTO sections (name, description, restaurant_id) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(name)
        .bind(description)
        .bind(restaurant_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update a section's name and description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the section does not exist.
    pub async fn update(
        &self,
        id: SectionId,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE sections SET name = $1, description = $2 WHERE id = $3")
            .bind(name)
            .bind(description)
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a section.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the section does not exist.
    pub async fn delete(&self, id: SectionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM sections WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
