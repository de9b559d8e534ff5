//! Redirects for the old flat management URLs.
//!
//! Early deployments exposed `/manage/sections/{id}/edit` style URLs with
//! no restaurant context. These now resolve the entity's position in the
//! hierarchy and redirect to the canonical nested URL; the target handler
//! does the access checking. Deletes use 307 so the POST survives the
//! redirect.

use axum::{
    Router,
    extract::{Path, State},
    response::Redirect,
    routing::{get, post},
};
use tablecraft_core::{CategoryId, ProductId, SectionId};

use crate::db::{CategoryRepository, ProductRepository, SectionRepository};
use crate::error::AppError;
use crate::state::AppState;

use super::WebError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/manage/restaurants/{r}/edit",
            get(|Path(r): Path<i32>| async move {
                Redirect::to(&format!("/restaurants/{r}/manage/edit"))
            }),
        )
        .route("/manage/sections/{s}/edit", get(section_edit))
        .route("/manage/sections/{s}/delete", post(section_delete))
        .route("/manage/categories/{c}/edit", get(category_edit))
        .route("/manage/categories/{c}/delete", post(category_delete))
        .route("/manage/products/{p}/edit", get(product_edit))
        .route("/manage/products/{p}/delete", post(product_delete))
}

async fn section_nested_prefix(state: &AppState, s: i32) -> Result<String, AppError> {
    let section = SectionRepository::new(state.pool())
        .get(SectionId::new(s))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("section {s}")))?;
    Ok(format!(
        "/restaurants/{}/sections/{}",
        section.restaurant_id, section.id
    ))
}

async fn category_nested_prefix(state: &AppState, c: i32) -> Result<String, AppError> {
    let category = CategoryRepository::new(state.pool())
        .get(CategoryId::new(c))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {c}")))?;
    Ok(format!(
        "/restaurants/{}/sections/{}/categories/{}",
        category.restaurant_id, category.section_id, category.id
    ))
}

async fn product_nested_prefix(state: &AppState, p: i32) -> Result<String, AppError> {
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(p))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {p}")))?;
    let category = CategoryRepository::new(state.pool())
        .get(product.category_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {}", product.category_id)))?;
    Ok(format!(
        "/restaurants/{}/sections/{}/categories/{}/products/{}",
        product.restaurant_id, category.section_id, category.id, product.id
    ))
}

async fn section_edit(
    State(state): State<AppState>,
    Path(s): Path<i32>,
) -> Result<Redirect, WebError> {
    Ok(Redirect::to(&format!(
        "{}/manage/edit",
        section_nested_prefix(&state, s).await?
    )))
}

async fn section_delete(
    State(state): State<AppState>,
    Path(s): Path<i32>,
) -> Result<Redirect, WebError> {
    Ok(Redirect::temporary(&format!(
        "{}/manage/delete",
        section_nested_prefix(&state, s).await?
    )))
}

async fn category_edit(
    State(state): State<AppState>,
    Path(c): Path<i32>,
) -> Result<Redirect, WebError> {
    Ok(Redirect::to(&format!(
        "{}/manage/edit",
        category_nested_prefix(&state, c).await?
    )))
}

async fn category_delete(
    State(state): State<AppState>,
    Path(c): Path<i32>,
) -> Result<Redirect, WebError> {
    Ok(Redirect::temporary(&format!(
        "{}/manage/delete",
        category_nested_prefix(&state, c).await?
    )))
}

async fn product_edit(
    State(state): State<AppState>,
    Path(p): Path<i32>,
) -> Result<Redirect, WebError> {
    Ok(Redirect::to(&format!(
        "{}/manage/edit",
        product_nested_prefix(&state, p).await?
    )))
}

async fn product_delete(
    State(state): State<AppState>,
    Path(p): Path<i32>,
) -> Result<Redirect, WebError> {
    Ok(Redirect::temporary(&format!(
        "{}/manage/delete",
        product_nested_prefix(&state, p).await?
    )))
}
