//! Restaurant API endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tablecraft_core::RestaurantId;

use super::Pagination;

use crate::db::{NewRestaurant, Restaurant, RestaurantRepository, Section, SectionRepository};
use crate::error::AppError;
use crate::middleware::ApiAuth;
use crate::services::access;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RestaurantPayload {
    pub name: String,
    pub concept: Option<String>,
}

/// `GET /api/v1/restaurants`
pub async fn list(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Restaurant>>, AppError> {
    let restaurants = access::visible_restaurants(state.pool(), &user, page.skip, page.limit).await?;
    Ok(Json(restaurants))
}

/// `GET /api/v1/restaurants/{id}`
pub async fn show(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Path(id): Path<i32>,
) -> Result<Json<Restaurant>, AppError> {
    let restaurant =
        access::viewable_restaurant(state.pool(), Some(&user), RestaurantId::new(id)).await?;
    Ok(Json(restaurant))
}

/// `POST /api/v1/restaurants`
///
/// Managers own at most one restaurant; a second create is rejected.
pub async fn create(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Json(payload): Json<RestaurantPayload>,
) -> Result<(StatusCode, Json<Restaurant>), AppError> {
    access::require_manager_role(&user)?;

    let repo = RestaurantRepository::new(state.pool());
    if user.role == tablecraft_core::Role::Manager && !repo.by_manager(user.id).await?.is_empty() {
        return Err(AppError::Conflict(
            "You already manage a restaurant".to_owned(),
        ));
    }

    let restaurant = repo
        .create(&NewRestaurant {
            name: payload.name,
            concept: payload.concept,
            manager_id: Some(user.id),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(restaurant)))
}

/// `PUT /api/v1/restaurants/{id}`
pub async fn update(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Path(id): Path<i32>,
    Json(payload): Json<RestaurantPayload>,
) -> Result<Json<Restaurant>, AppError> {
    let restaurant =
        access::manageable_restaurant(state.pool(), &user, RestaurantId::new(id)).await?;

    let repo = RestaurantRepository::new(state.pool());
    repo.update(restaurant.id, &payload.name, payload.concept.as_deref())
        .await?;
    let updated = repo
        .get(restaurant.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("restaurant {id}")))?;
    Ok(Json(updated))
}

/// `GET /api/v1/restaurants/{id}/sections`
pub async fn sections(
    State(state): State<AppState>,
    ApiAuth(user): ApiAuth,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Section>>, AppError> {
    let restaurant =
        access::viewable_restaurant(state.pool(), Some(&user), RestaurantId::new(id)).await?;
    let sections = SectionRepository::new(state.pool())
        .by_restaurant(restaurant.id)
        .await?;
    Ok(Json(sections))
}
