//! Landing, about, demo, and recent-changes pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tablecraft_core::Role;

use crate::db::{CategoryRepository, Product, ProductRepository, Restaurant, RestaurantRepository};
use crate::error::AppError;
use crate::middleware::{OptionalWebAuth, WebAuth};
use crate::services::access;
use crate::state::AppState;

use super::{CurrentUser, WebError};

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub current_user: Option<CurrentUser>,
}

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub current_user: Option<CurrentUser>,
}

/// A recently changed product with its breadcrumb link.
pub struct RecentProduct {
    pub title: String,
    pub modified_at: String,
    pub url: String,
}

/// Recent-changes page template.
#[derive(Template, WebTemplate)]
#[template(path = "recent_changes.html")]
pub struct RecentChangesTemplate {
    pub current_user: Option<CurrentUser>,
    pub products: Vec<RecentProduct>,
}

/// `GET /`
///
/// A signed-in manager or waiter lands straight on their restaurant;
/// everyone else gets the landing page.
pub async fn index(
    State(state): State<AppState>,
    OptionalWebAuth(user): OptionalWebAuth,
) -> Result<Response, WebError> {
    if let Some(u) = &user
        && u.role != Role::Admin
        && let Some(own) = own_restaurant(&state, u).await?
    {
        return Ok(Redirect::to(&super::restaurant_path(own.id)).into_response());
    }

    Ok(IndexTemplate {
        current_user: user.as_ref().map(CurrentUser::from),
    }
    .into_response())
}

/// The restaurant a manager or waiter belongs to, if any.
async fn own_restaurant(
    state: &AppState,
    user: &crate::db::User,
) -> Result<Option<Restaurant>, AppError> {
    let repo = RestaurantRepository::new(state.pool());
    let mut restaurants = match user.role {
        Role::Manager => repo.by_manager(user.id).await?,
        Role::Waiter => repo.by_waiter(user.id).await?,
        Role::Admin => Vec::new(),
    };
    Ok(if restaurants.is_empty() {
        None
    } else {
        Some(restaurants.remove(0))
    })
}

/// `GET /about`
pub async fn about(OptionalWebAuth(user): OptionalWebAuth) -> impl IntoResponse {
    AboutTemplate {
        current_user: user.as_ref().map(CurrentUser::from),
    }
}

/// `GET /demo`
///
/// Jumps to the demo restaurant, which is browsable without signing in.
pub async fn demo(State(state): State<AppState>) -> Result<Redirect, WebError> {
    let demo = RestaurantRepository::new(state.pool())
        .demo()
        .await?
        .ok_or_else(|| AppError::NotFound("demo restaurant".to_owned()))?;
    Ok(Redirect::to(&super::restaurant_path(demo.id)))
}

const RECENT_LIMIT: i64 = 20;

/// `GET /recent-changes`
pub async fn recent_changes(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
) -> Result<RecentChangesTemplate, WebError> {
    let restaurants = access::visible_restaurants(state.pool(), &user, 0, 500).await?;
    let ids: Vec<_> = restaurants.iter().map(|r| r.id).collect();
    let recent = ProductRepository::new(state.pool())
        .recent_by_restaurants(&ids, RECENT_LIMIT)
        .await?;

    let mut products = Vec::with_capacity(recent.len());
    for product in recent {
        products.push(RecentProduct {
            url: product_url(&state, &product).await?,
            title: product.title,
            modified_at: product.modified_at.format("%Y-%m-%d %H:%M").to_string(),
        });
    }

    Ok(RecentChangesTemplate {
        current_user: Some(CurrentUser::from(&user)),
        products,
    })
}

/// Resolve a product's full nested URL through its category.
async fn product_url(state: &AppState, product: &Product) -> Result<String, AppError> {
    let category = CategoryRepository::new(state.pool())
        .get(product.category_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {}", product.category_id)))?;
    Ok(super::product_path(
        product.restaurant_id,
        category.section_id,
        category.id,
        product.id,
    ))
}
