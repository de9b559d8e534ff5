//! Section, category, and product API endpoints.
//!
//! Per-object handlers resolve the owning restaurant first and apply the
//! view/manage rule there; nothing below a restaurant has its own access
//! policy. The flat collection listings only require authentication.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tablecraft_core::{CategoryId, ProductId, SectionId};

use super::Pagination;

use crate::db::{
    Category, CategoryRepository, Product, ProductInput, ProductRepository, Section,
    SectionRepository,
};
use crate::error::AppError;
use crate::middleware::ApiAuth;
use crate::services::access;
use crate::state::AppState;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSectionPayload {
    pub restaurant_id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSectionPayload {
    pub name: String,
    pub description: Option<String>,
}

/// `GET /api/v1/sections`
pub async fn list_sections(
    State(state): State<AppState>,
    ApiAuth(_user): ApiAuth,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Section>>, AppError> {
    let sections = SectionRepository::new(state.pool())
        .list(page.skip, page.limit)
        .await?;
    Ok(Json(sections))
}

/// `POST /api/v1/sections`
pub async fn create_section(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Json(payload): Json<CreateSectionPayload>,
) -> Result<(StatusCode, Json<Section>), AppError> {
    let restaurant = access::manageable_restaurant(
        state.pool(),
        &user,
        tablecraft_core::RestaurantId::new(payload.restaurant_id),
    )
    .await?;
    let section = SectionRepository::new(state.pool())
        .create(restaurant.id, &payload.name, payload.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(section)))
}

/// `GET /api/v1/sections/{id}`
pub async fn show_section(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Path(id): Path<i32>,
) -> Result<Json<Section>, AppError> {
    let (section, _) = access::viewable_section(state.pool(), Some(&user), SectionId::new(id)).await?;
    Ok(Json(section))
}

/// `PUT /api/v1/sections/{id}`
pub async fn update_section(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateSectionPayload>,
) -> Result<Json<Section>, AppError> {
    let (section, _) = access::manageable_section(state.pool(), &user, SectionId::new(id)).await?;
    let repo = SectionRepository::new(state.pool());
    repo.update(section.id, &payload.name, payload.description.as_deref())
        .await?;
    let updated = repo
        .get(section.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("section {id}")))?;
    Ok(Json(updated))
}

/// `DELETE /api/v1/sections/{id}`
pub async fn delete_section(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let (section, _) = access::manageable_section(state.pool(), &user, SectionId::new(id)).await?;
    SectionRepository::new(state.pool()).delete(section.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/v1/sections/{id}/categories`
pub async fn section_categories(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Category>>, AppError> {
    let (section, _) = access::viewable_section(state.pool(), Some(&user), SectionId::new(id)).await?;
    let categories = CategoryRepository::new(state.pool())
        .by_section(section.id)
        .await?;
    Ok(Json(categories))
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCategoryPayload {
    pub section_id: i32,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryPayload {
    pub title: String,
    pub description: Option<String>,
}

/// `GET /api/v1/categories`
pub async fn list_categories(
    State(state): State<AppState>,
    ApiAuth(_user): ApiAuth,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = CategoryRepository::new(state.pool())
        .list(page.skip, page.limit)
        .await?;
    Ok(Json(categories))
}

/// `POST /api/v1/categories`
pub async fn create_category(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let (section, restaurant) =
        access::manageable_section(state.pool(), &user, SectionId::new(payload.section_id)).await?;
    let category = CategoryRepository::new(state.pool())
        .create(
            section.id,
            restaurant.id,
            &payload.title,
            payload.description.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// `GET /api/v1/categories/{id}`
pub async fn show_category(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Path(id): Path<i32>,
) -> Result<Json<Category>, AppError> {
    let (category, _) = access::viewable_category(state.pool(), Some(&user), CategoryId::new(id)).await?;
    Ok(Json(category))
}

/// `PUT /api/v1/categories/{id}`
pub async fn update_category(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCategoryPayload>,
) -> Result<Json<Category>, AppError> {
    let (category, _) =
        access::manageable_category(state.pool(), &user, CategoryId::new(id)).await?;
    let repo = CategoryRepository::new(state.pool());
    repo.update(category.id, &payload.title, payload.description.as_deref())
        .await?;
    let updated = repo
        .get(category.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;
    Ok(Json(updated))
}

/// `DELETE /api/v1/categories/{id}`
pub async fn delete_category(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let (category, _) =
        access::manageable_category(state.pool(), &user, CategoryId::new(id)).await?;
    CategoryRepository::new(state.pool()).delete(category.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/v1/categories/{id}/products`
pub async fn category_products(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Product>>, AppError> {
    let (category, _) = access::viewable_category(state.pool(), Some(&user), CategoryId::new(id)).await?;
    let products = ProductRepository::new(state.pool())
        .by_category(category.id)
        .await?;
    Ok(Json(products))
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProductPayload {
    pub category_id: i32,
    #[serde(flatten)]
    pub fields: ProductFields,
}

#[derive(Debug, Deserialize)]
pub struct ProductFields {
    pub title: String,
    pub weight: Option<String>,
    #[serde(default)]
    pub ingredients: String,
    pub allergens: Option<String>,
    pub description: Option<String>,
    pub features: Option<String>,
    pub table_setting: Option<String>,
    pub gastronomic_pairings: Option<String>,
}

impl ProductFields {
    fn into_input(self) -> ProductInput {
        ProductInput {
            title: self.title,
            weight: self.weight,
            ingredients: self.ingredients,
            allergens: self.allergens,
            description: self.description,
            features: self.features,
            table_setting: self.table_setting,
            gastronomic_pairings: self.gastronomic_pairings,
            image_path: None,
        }
    }
}

/// `GET /api/v1/products`
pub async fn list_products(
    State(state): State<AppState>,
    ApiAuth(_user): ApiAuth,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = ProductRepository::new(state.pool())
        .list(page.skip, page.limit)
        .await?;
    Ok(Json(products))
}

/// `POST /api/v1/products`
///
/// Image upload happens through the web UI; the API creates products
/// without an image.
pub async fn create_product(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Json(payload): Json<CreateProductPayload>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let (category, restaurant) =
        access::manageable_category(state.pool(), &user, CategoryId::new(payload.category_id))
            .await?;
    let product = ProductRepository::new(state.pool())
        .create(category.id, restaurant.id, &payload.fields.into_input())
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /api/v1/products/{id}`
pub async fn show_product(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Path(id): Path<i32>,
) -> Result<Json<Product>, AppError> {
    let (product, _) = access::viewable_product(state.pool(), Some(&user), ProductId::new(id)).await?;
    Ok(Json(product))
}

/// `PUT /api/v1/products/{id}`
pub async fn update_product(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Path(id): Path<i32>,
    Json(payload): Json<ProductFields>,
) -> Result<Json<Product>, AppError> {
    let (product, _) = access::manageable_product(state.pool(), &user, ProductId::new(id)).await?;
    let repo = ProductRepository::new(state.pool());
    repo.update(product.id, &payload.into_input()).await?;
    let updated = repo
        .get(product.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(updated))
}

/// `DELETE /api/v1/products/{id}`
pub async fn delete_product(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let (product, _) = access::manageable_product(state.pool(), &user, ProductId::new(id)).await?;
    ProductRepository::new(state.pool()).soft_delete(product.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
