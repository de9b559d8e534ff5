//! JSON API under `/api/v1`.
//!
//! # Route Structure
//!
//! ```text
//! POST /api/v1/auth/register          - Redeem an invite code for an account
//! POST /api/v1/auth/login             - Exchange credentials for a bearer token
//! GET  /api/v1/users/me               - Current user
//!
//! GET  /api/v1/restaurants            - Restaurants visible to the caller
//! POST /api/v1/restaurants            - Create a restaurant (manager)
//! GET  /api/v1/restaurants/{id}       - Restaurant detail
//! PUT  /api/v1/restaurants/{id}       - Update a restaurant (manager)
//! GET  /api/v1/restaurants/{id}/sections
//!
//! GET  /api/v1/sections               - All sections (paginated)
//! POST /api/v1/sections               - Create a section (manager)
//! GET  /api/v1/sections/{id}          - Section detail
//! PUT  /api/v1/sections/{id}          - Update (manager)
//! DELETE /api/v1/sections/{id}        - Delete (manager)
//! GET  /api/v1/sections/{id}/categories
//!
//! GET  /api/v1/categories             - All categories (paginated)
//! POST /api/v1/categories             - Create a category (manager)
//! GET  /api/v1/categories/{id}        - Category detail
//! PUT  /api/v1/categories/{id}        - Update (manager)
//! DELETE /api/v1/categories/{id}      - Delete (manager)
//! GET  /api/v1/categories/{id}/products
//!
//! GET  /api/v1/products               - All products (paginated)
//! POST /api/v1/products               - Create a product (manager)
//! GET  /api/v1/products/{id}          - Product detail
//! PUT  /api/v1/products/{id}          - Update (manager)
//! DELETE /api/v1/products/{id}        - Soft-delete (manager)
//! ```

pub mod auth;
pub mod menu;
pub mod restaurants;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;

use crate::state::AppState;

/// `skip`/`limit` query parameters shared by the collection endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "Pagination::default_limit")]
    pub limit: i64,
}

impl Pagination {
    const fn default_limit() -> i64 {
        100
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Self::default_limit(),
        }
    }
}

/// Create the `/api/v1` router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/users/me", get(auth::me))
        .route(
            "/restaurants",
            get(restaurants::list).post(restaurants::create),
        )
        .route(
            "/restaurants/{id}",
            get(restaurants::show).put(restaurants::update),
        )
        .route("/restaurants/{id}/sections", get(restaurants::sections))
        .route(
            "/sections",
            get(menu::list_sections).post(menu::create_section),
        )
        .route(
            "/sections/{id}",
            get(menu::show_section)
                .put(menu::update_section)
                .delete(menu::delete_section),
        )
        .route("/sections/{id}/categories", get(menu::section_categories))
        .route(
            "/categories",
            get(menu::list_categories).post(menu::create_category),
        )
        .route(
            "/categories/{id}",
            get(menu::show_category)
                .put(menu::update_category)
                .delete(menu::delete_category),
        )
        .route("/categories/{id}/products", get(menu::category_products))
        .route(
            "/products",
            get(menu::list_products).post(menu::create_product),
        )
        .route(
            "/products/{id}",
            get(menu::show_product)
                .put(menu::update_product)
                .delete(menu::delete_product),
        )
}

#[cfg(test)]
mod tests {
    use super::Pagination;

    #[test]
    fn pagination_defaults_to_first_hundred() {
        let page: Pagination = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit, 100);
    }

    #[test]
    fn pagination_accepts_explicit_bounds() {
        let page: Pagination =
            serde_json::from_value(serde_json::json!({ "skip": 40, "limit": 10 })).unwrap();
        assert_eq!(page.skip, 40);
        assert_eq!(page.limit, 10);
    }
}
