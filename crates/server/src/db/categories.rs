//! Category repository for database operations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use tablecraft_core::{CategoryId, RestaurantId, SectionId};

use super::RepositoryError;

/// A menu category inside a section.
///
/// Carries the denormalized restaurant ID so access checks resolve the
/// owning restaurant without a join chain.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    pub description: Option<String>,
    pub section_id: SectionId,
    pub restaurant_id: RestaurantId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    title: String,
    description: Option<String>,
    section_id: i32,
    restaurant_id: i32,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            title: row.title,
            description: row.description,
            section_id: SectionId::new(row.section_id),
            restaurant_id: RestaurantId::new(row.restaurant_id),
            created_at: row.created_at,
        }
    }
}

const COLUMNS: &str = "id, title, description, section_id, restaurant_id, created_at";

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List categories with skip/limit pagination.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {COLUMNS} FROM categories ORDER BY id OFFSET $1 LIMIT $2"
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Categories belonging to a section.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_section(
        &self,
        section_id: SectionId,
    ) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {COLUMNS} FROM categories WHERE section_id = $1 ORDER BY id"
        ))
        .bind(section_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a category under a section, stamping the owning restaurant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        section_id: SectionId,
        restaurant_id: RestaurantId,
        title: &str,
        description: Option<&str>,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "INSERT INTO categories (title, description, section_id, restaurant_id) \
             VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        ))
        .bind(title)
        .bind(description)
        .bind(section_id.as_i32())
        .bind(restaurant_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update a category's title and description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn update(
        &self,
        id: CategoryId,
        title: &str,
        description: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE categories SET title = $1, description = $2 WHERE id = $3")
                .bind(title)
                .bind(description)
                .bind(id.as_i32())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
