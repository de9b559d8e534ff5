//! Server-rendered web UI.

pub mod auth;
pub mod browse;
pub mod home;
pub mod legacy;
pub mod manage;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tablecraft_core::{CategoryId, ProductId, RestaurantId, SectionId};

use crate::db::{RepositoryError, User};
use crate::error::AppError;
use crate::state::AppState;

/// The signed-in user as rendered in the page chrome.
pub struct CurrentUser {
    pub name: String,
    pub role: &'static str,
    pub is_manager: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            name: user.display_name().to_owned(),
            role: user.role.as_str(),
            is_manager: user.role.can_manage(),
        }
    }
}

/// Error page template.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub current_user: Option<CurrentUser>,
    pub status: u16,
    pub message: String,
}

/// Wrapper that renders errors as the HTML error page instead of the
/// plain-text response the API uses.
#[derive(Debug)]
pub struct WebError(pub AppError);

impl From<AppError> for WebError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl From<RepositoryError> for WebError {
    fn from(e: RepositoryError) -> Self {
        Self(AppError::from(e))
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        // Anonymous visitors go to the login form, matching the WebAuth
        // extractor; the error page is for signed-in users.
        if matches!(self.0, AppError::Unauthorized) {
            return Redirect::to("/login").into_response();
        }

        let status = self.0.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request error");
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_owned()
        } else {
            self.0.to_string()
        };

        let page = ErrorTemplate {
            current_user: None,
            status: status.as_u16(),
            message,
        };
        (status, page).into_response()
    }
}

/// Fallback for URLs no route matches.
pub async fn not_found() -> WebError {
    WebError(AppError::NotFound("page".to_owned()))
}

// Canonical nested URLs; the single source for links and redirects.

#[must_use]
pub fn restaurant_path(r: RestaurantId) -> String {
    format!("/restaurants/{r}")
}

#[must_use]
pub fn section_path(r: RestaurantId, s: SectionId) -> String {
    format!("/restaurants/{r}/sections/{s}")
}

#[must_use]
pub fn category_path(r: RestaurantId, s: SectionId, c: CategoryId) -> String {
    format!("/restaurants/{r}/sections/{s}/categories/{c}")
}

#[must_use]
pub fn product_path(r: RestaurantId, s: SectionId, c: CategoryId, p: ProductId) -> String {
    format!("/restaurants/{r}/sections/{s}/categories/{c}/products/{p}")
}

/// Create the web UI router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/about", get(home::about))
        .route("/demo", get(home::demo))
        .route("/recent-changes", get(home::recent_changes))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .merge(browse_routes())
        .merge(manage_routes())
        .merge(legacy::routes())
}

fn browse_routes() -> Router<AppState> {
    Router::new()
        .route("/restaurants", get(browse::restaurants))
        .route("/restaurants/{r}", get(browse::restaurant))
        .route("/restaurants/{r}/sections/{s}", get(browse::section))
        .route(
            "/restaurants/{r}/sections/{s}/categories/{c}",
            get(browse::category),
        )
        .route(
            "/restaurants/{r}/sections/{s}/categories/{c}/products/{p}",
            get(browse::product),
        )
}

fn manage_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/restaurants/manage/new",
            get(manage::new_restaurant_page).post(manage::create_restaurant),
        )
        .route(
            "/restaurants/{r}/manage/edit",
            get(manage::edit_restaurant_page).post(manage::update_restaurant),
        )
        .route(
            "/restaurants/{r}/manage/sections/new",
            get(manage::new_section_page).post(manage::create_section),
        )
        .route(
            "/restaurants/{r}/sections/{s}/manage/edit",
            get(manage::edit_section_page).post(manage::update_section),
        )
        .route(
            "/restaurants/{r}/sections/{s}/manage/delete",
            post(manage::delete_section),
        )
        .route(
            "/restaurants/{r}/sections/{s}/manage/categories/new",
            get(manage::new_category_page).post(manage::create_category),
        )
        .route(
            "/restaurants/{r}/sections/{s}/categories/{c}/manage/edit",
            get(manage::edit_category_page).post(manage::update_category),
        )
        .route(
            "/restaurants/{r}/sections/{s}/categories/{c}/manage/delete",
            post(manage::delete_category),
        )
        .route(
            "/restaurants/{r}/sections/{s}/categories/{c}/manage/products/new",
            get(manage::new_product_page).post(manage::create_product),
        )
        .route(
            "/restaurants/{r}/sections/{s}/categories/{c}/products/{p}/manage/edit",
            get(manage::edit_product_page).post(manage::update_product),
        )
        .route(
            "/restaurants/{r}/sections/{s}/categories/{c}/products/{p}/manage/delete",
            post(manage::delete_product),
        )
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header};

    use super::*;

    #[test]
    fn anonymous_errors_redirect_to_login() {
        let response = WebError(AppError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[test]
    fn forbidden_renders_the_error_page() {
        let response = WebError(AppError::Forbidden("not yours".to_owned())).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
