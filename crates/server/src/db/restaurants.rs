//! Restaurant repository for database operations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use tablecraft_core::{RestaurantId, UserId};

use super::RepositoryError;

/// A restaurant (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    pub concept: Option<String>,
    pub manager_id: Option<UserId>,
    pub waiter_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Restaurant {
    /// A restaurant with neither manager nor waiter is the public demo.
    #[must_use]
    pub const fn is_demo(&self) -> bool {
        self.manager_id.is_none() && self.waiter_id.is_none()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RestaurantRow {
    id: i32,
    name: String,
    concept: Option<String>,
    manager_id: Option<i32>,
    waiter_id: Option<i32>,
    created_at: DateTime<Utc>,
}

impl From<RestaurantRow> for Restaurant {
    fn from(row: RestaurantRow) -> Self {
        Self {
            id: RestaurantId::new(row.id),
            name: row.name,
            concept: row.concept,
            manager_id: row.manager_id.map(UserId::new),
            waiter_id: row.waiter_id.map(UserId::new),
            created_at: row.created_at,
        }
    }
}

const COLUMNS: &str = "id, name, concept, manager_id, waiter_id, created_at";

/// New restaurant data.
#[derive(Debug, Clone)]
pub struct NewRestaurant {
    pub name: String,
    pub concept: Option<String>,
    pub manager_id: Option<UserId>,
}

/// Repository for restaurant database operations.
pub struct RestaurantRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RestaurantRepository<'a> {
    /// Create a new restaurant repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a restaurant by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: RestaurantId) -> Result<Option<Restaurant>, RepositoryError> {
        let row = sqlx::query_as::<_, RestaurantRow>(&format!(
            "SELECT {COLUMNS} FROM restaurants WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List restaurants with skip/limit pagination.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Restaurant>, RepositoryError> {
        let rows = sqlx::query_as::<_, RestaurantRow>(&format!(
            "SELECT {COLUMNS} FROM restaurants ORDER BY id OFFSET $1 LIMIT $2"
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// The demo restaurant: the first restaurant, provided it is bound to
    /// neither a manager nor a waiter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn demo(&self) -> Result<Option<Restaurant>, RepositoryError> {
        let first = self.list(0, 1).await?;
        Ok(first.into_iter().next().filter(Restaurant::is_demo))
    }

    /// Restaurants managed by a given user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_manager(
        &self,
        manager_id: UserId,
    ) -> Result<Vec<Restaurant>, RepositoryError> {
        let rows = sqlx::query_as::<_, RestaurantRow>(&format!(
            "SELECT {COLUMNS} FROM restaurants WHERE manager_id = $1 ORDER BY id"
        ))
        .bind(manager_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Restaurants a waiter is assigned to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_waiter(&self, waiter_id: UserId) -> Result<Vec<Restaurant>, RepositoryError> {
        let rows = sqlx::query_as::<_, RestaurantRow>(&format!(
            "SELECT {COLUMNS} FROM restaurants WHERE waiter_id = $1 ORDER BY id"
        ))
        .bind(waiter_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a restaurant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, new: &NewRestaurant) -> Result<Restaurant, RepositoryError> {
        let row = sqlx::query_as::<_, RestaurantRow>(&format!(
            "INSERT INTO restaurants (name, concept, manager_id) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.concept)
        .bind(new.manager_id.map(|id| id.as_i32()))
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update a restaurant's name and concept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the restaurant does not exist.
    pub async fn update(
        &self,
        id: RestaurantId,
        name: &str,
        concept: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE restaurants SET name = $1, concept = $2 WHERE id = $3")
            .bind(name)
            .bind(concept)
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
