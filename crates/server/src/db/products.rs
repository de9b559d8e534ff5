//! Product repository for database operations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use tablecraft_core::{CategoryId, ProductId, RestaurantId};

use super::RepositoryError;

/// A menu product (the full menu card entry).
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub weight: Option<String>,
    pub ingredients: String,
    pub allergens: Option<String>,
    pub description: Option<String>,
    pub features: Option<String>,
    pub table_setting: Option<String>,
    pub gastronomic_pairings: Option<String>,
    pub image_path: Option<String>,
    pub category_id: CategoryId,
    pub restaurant_id: RestaurantId,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    title: String,
    weight: Option<String>,
    ingredients: String,
    allergens: Option<String>,
    description: Option<String>,
    features: Option<String>,
    table_setting: Option<String>,
    gastronomic_pairings: Option<String>,
    image_path: Option<String>,
    category_id: i32,
    restaurant_id: i32,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            title: row.title,
            weight: row.weight,
            ingredients: row.ingredients,
            allergens: row.allergens,
            description: row.description,
            features: row.features,
            table_setting: row.table_setting,
            gastronomic_pairings: row.gastronomic_pairings,
            image_path: row.image_path,
            category_id: CategoryId::new(row.category_id),
            restaurant_id: RestaurantId::new(row.restaurant_id),
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

const COLUMNS: &str = "id, title, weight, ingredients, allergens, description, features, \
     table_setting, gastronomic_pairings, image_path, category_id, restaurant_id, \
     created_at, modified_at";

/// Fields accepted when creating or editing a product.
#[derive(Debug, Clone, Default)]
pub struct ProductInput {
    pub title: String,
    pub weight: Option<String>,
    pub ingredients: String,
    pub allergens: Option<String>,
    pub description: Option<String>,
    pub features: Option<String>,
    pub table_setting: Option<String>,
    pub gastronomic_pairings: Option<String>,
    pub image_path: Option<String>,
}

/// Repository for product database operations.
///
/// Deleted products are soft-deleted; every read filters them out.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {COLUMNS} FROM products WHERE id = $1 AND NOT is_deleted"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List products with skip/limit pagination.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {COLUMNS} FROM products WHERE NOT is_deleted ORDER BY id OFFSET $1 LIMIT $2"
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Products belonging to a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {COLUMNS} FROM products WHERE category_id = $1 AND NOT is_deleted ORDER BY id"
        ))
        .bind(category_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Most recently modified products across a set of restaurants, for the
    /// recent-changes page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_by_restaurants(
        &self,
        restaurant_ids: &[RestaurantId],
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i32> = restaurant_ids.iter().map(|id| id.as_i32()).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {COLUMNS} FROM products \
             WHERE restaurant_id = ANY($1) AND NOT is_deleted \
             ORDER BY modified_at DESC LIMIT $2"
        ))
        .bind(&ids)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a product under a category, stamping the owning restaurant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        category_id: CategoryId,
        restaurant_id: RestaurantId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (title, weight, ingredients, allergens, description, \
                 features, table_setting, gastronomic_pairings, image_path, \
                 category_id, restaurant_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.weight)
        .bind(&input.ingredients)
        .bind(&input.allergens)
        .bind(&input.description)
        .bind(&input.features)
        .bind(&input.table_setting)
        .bind(&input.gastronomic_pairings)
        .bind(&input.image_path)
        .bind(category_id.as_i32())
        .bind(restaurant_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update a product, bumping its modification timestamp.
    ///
    /// A `None` `image_path` in the input leaves the stored image untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET title = $1, weight = $2, ingredients = $3, allergens = $4, \
                 description = $5, features = $6, table_setting = $7, \
                 gastronomic_pairings = $8, image_path = COALESCE($9, image_path), \
                 modified_at = NOW() \
             WHERE id = $10 AND NOT is_deleted",
        )
        .bind(&input.title)
        .bind(&input.weight)
        .bind(&input.ingredients)
        .bind(&input.allergens)
        .bind(&input.description)
        .bind(&input.features)
        .bind(&input.table_setting)
        .bind(&input.gastronomic_pairings)
        .bind(&input.image_path)
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Soft-delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn soft_delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET is_deleted = TRUE, modified_at = NOW() \
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
