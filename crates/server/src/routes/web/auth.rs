//! Web login and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::auth::{login_cookie, logout_cookie};
use crate::routes::api;
use crate::state::AppState;

use super::{CurrentUser, WebError};

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// `GET /login`
pub async fn login_page() -> impl IntoResponse {
    LoginTemplate {
        current_user: None,
        error: None,
    }
}

/// `POST /login`
///
/// On success stores the access token in a cookie and goes to the
/// restaurant list. On bad credentials re-renders the form.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    match api::auth::issue_token(&state, &form.username, &form.password).await {
        Ok(token) => Ok((
            [(header::SET_COOKIE, login_cookie(&token))],
            Redirect::to("/restaurants"),
        )
            .into_response()),
        Err(AppError::Unauthorized) => Ok(LoginTemplate {
            current_user: None,
            error: Some("Invalid username or password".to_owned()),
        }
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// `POST /logout`
pub async fn logout() -> impl IntoResponse {
    ([(header::SET_COOKIE, logout_cookie())], Redirect::to("/"))
}
