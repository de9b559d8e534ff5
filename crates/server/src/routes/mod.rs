//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Landing page
//! GET  /about                   - About page
//! GET  /demo                    - Redirect to the demo restaurant
//! GET  /recent-changes          - Recently modified products
//!
//! # Auth
//! GET  /login                   - Login page
//! POST /login                   - Login action (sets the token cookie)
//! POST /logout                  - Logout action
//!
//! # Browsing (signed-in users; access checked per restaurant)
//! GET  /restaurants
//! GET  /restaurants/{r}
//! GET  /restaurants/{r}/sections/{s}
//! GET  /restaurants/{r}/sections/{s}/categories/{c}
//! GET  /restaurants/{r}/sections/{s}/categories/{c}/products/{p}
//!
//! # Management (managers; `/manage/` marks the mutating surface)
//! GET+POST /restaurants/manage/new
//! GET+POST /restaurants/{r}/manage/edit
//! GET+POST /restaurants/{r}/manage/sections/new
//! GET+POST /restaurants/{r}/sections/{s}/manage/edit
//! POST     /restaurants/{r}/sections/{s}/manage/delete
//! GET+POST /restaurants/{r}/sections/{s}/manage/categories/new
//! GET+POST /restaurants/{r}/sections/{s}/categories/{c}/manage/edit
//! POST     /restaurants/{r}/sections/{s}/categories/{c}/manage/delete
//! GET+POST /restaurants/{r}/sections/{s}/categories/{c}/manage/products/new
//! GET+POST /restaurants/{r}/sections/{s}/categories/{c}/products/{p}/manage/edit
//! POST     /restaurants/{r}/sections/{s}/categories/{c}/products/{p}/manage/delete
//!
//! # Legacy flat management URLs (redirects to the nested form)
//! GET  /manage/...              - Redirect to the nested URL
//!
//! # JSON API
//! /api/v1/...                   - See [`api`]
//! ```

pub mod api;
pub mod web;

use axum::Router;

use crate::state::AppState;

/// Create the complete application router (web UI plus API).
pub fn routes() -> Router<AppState> {
    web::routes()
        .nest("/api/v1", api::routes())
        .fallback(web::not_found)
}
