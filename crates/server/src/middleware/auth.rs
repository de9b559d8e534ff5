//! Authentication extractors.
//!
//! Two surfaces, one token: the REST API reads a bearer token from the
//! `Authorization` header, the web UI reads the same JWT from the
//! `access_token` cookie. Both resolve the token subject to a live user
//! row on every request, so a deactivated account is locked out
//! immediately.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};

use crate::db::{User, UserRepository};
use crate::services::auth::decode_access_token;
use crate::state::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Extractor requiring a bearer token on an API route.
///
/// Rejects with `401 Unauthorized`; no redirects on the API surface.
pub struct ApiAuth(pub User);

/// Extractor requiring a signed-in user on a web UI route.
///
/// Rejects by redirecting to the login page.
pub struct WebAuth(pub User);

/// Like [`WebAuth`] but yields `None` instead of redirecting, for pages
/// that render for guests too.
pub struct OptionalWebAuth(pub Option<User>);

/// Rejection for failed authentication.
pub enum AuthRejection {
    Unauthorized,
    RedirectToLogin,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
        }
    }
}

/// Resolve a token to an active user, or `None`.
async fn user_from_token(state: &AppState, token: &str) -> Option<User> {
    let claims = decode_access_token(token, state.secret_key()).ok()?;
    UserRepository::new(state.pool())
        .get_by_username(&claims.sub)
        .await
        .ok()
        .flatten()
        .filter(|user| user.is_active)
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Pull a named cookie value out of the `Cookie` header.
fn cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    let cookies = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

impl FromRequestParts<AppState> for ApiAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthRejection::Unauthorized)?;
        let user = user_from_token(state, token)
            .await
            .ok_or(AuthRejection::Unauthorized)?;
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for WebAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token =
            cookie_value(parts, ACCESS_TOKEN_COOKIE).ok_or(AuthRejection::RedirectToLogin)?;
        let user = user_from_token(state, token)
            .await
            .ok_or(AuthRejection::RedirectToLogin)?;
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for OptionalWebAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = match cookie_value(parts, ACCESS_TOKEN_COOKIE) {
            Some(token) => user_from_token(state, token).await,
            None => None,
        };
        Ok(Self(user))
    }
}

/// `Set-Cookie` value that stores the access token for the web UI.
#[must_use]
pub fn login_cookie(token: &str) -> String {
    format!("{ACCESS_TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value that clears the access token.
#[must_use]
pub fn logout_cookie() -> String {
    format!("{ACCESS_TOKEN_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with_cookie(value: &str) -> Parts {
        let request = Request::builder()
            .uri("/")
            .header(header::COOKIE, value)
            .body(())
            .unwrap();
        request.into_parts().0
    }

    #[test]
    fn cookie_parsing_finds_the_token_among_others() {
        let parts = parts_with_cookie("theme=dark; access_token=abc.def.ghi; lang=en");
        assert_eq!(cookie_value(&parts, ACCESS_TOKEN_COOKIE), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_cookie_yields_none() {
        let parts = parts_with_cookie("theme=dark");
        assert_eq!(cookie_value(&parts, ACCESS_TOKEN_COOKIE), None);
    }

    #[test]
    fn bearer_header_parsing() {
        let request = Request::builder()
            .uri("/api/v1/users/me")
            .header(header::AUTHORIZATION, "Bearer abc.def.ghi")
            .body(())
            .unwrap();
        let (parts, ()) = request.into_parts();
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));
    }

    #[test]
    fn non_bearer_authorization_is_ignored() {
        let request = Request::builder()
            .uri("/api/v1/users/me")
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(())
            .unwrap();
        let (parts, ()) = request.into_parts();
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn logout_cookie_expires_immediately() {
        assert!(logout_cookie().contains("Max-Age=0"));
    }
}
