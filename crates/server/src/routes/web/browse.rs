//! Read-only menu browsing pages.
//!
//! Every page resolves the restaurant from the URL and applies the access
//! rule there. Child IDs from the URL must actually belong to their
//! parents, otherwise the page is a 404 rather than leaking another
//! restaurant's data.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tablecraft_core::{CategoryId, ProductId, RestaurantId, SectionId};

use crate::db::{
    Category, CategoryRepository, Product, ProductRepository, Restaurant, Section,
    SectionRepository, User,
};
use crate::error::AppError;
use crate::middleware::{OptionalWebAuth, WebAuth};
use crate::services::{access, invites};
use crate::state::AppState;

use super::{CurrentUser, WebError};

/// A linked list entry (restaurant, section, category, product alike).
pub struct Entry {
    pub title: String,
    pub subtitle: Option<String>,
    pub url: String,
}

/// Restaurant list template.
#[derive(Template, WebTemplate)]
#[template(path = "restaurants.html")]
pub struct RestaurantsTemplate {
    pub current_user: Option<CurrentUser>,
    pub restaurants: Vec<Entry>,
    pub can_create: bool,
}

/// Restaurant page template.
#[derive(Template, WebTemplate)]
#[template(path = "restaurant.html")]
pub struct RestaurantTemplate {
    pub current_user: Option<CurrentUser>,
    pub restaurant: Restaurant,
    pub sections: Vec<Entry>,
    pub can_manage: bool,
    /// The manager's shareable waiter invitation link.
    pub waiter_link: Option<String>,
}

/// Section page template.
#[derive(Template, WebTemplate)]
#[template(path = "section.html")]
pub struct SectionTemplate {
    pub current_user: Option<CurrentUser>,
    pub restaurant: Restaurant,
    pub section: Section,
    pub categories: Vec<Entry>,
    pub can_manage: bool,
}

/// Category page template.
#[derive(Template, WebTemplate)]
#[template(path = "category.html")]
pub struct CategoryTemplate {
    pub current_user: Option<CurrentUser>,
    pub restaurant: Restaurant,
    pub section: Section,
    pub category: Category,
    pub products: Vec<Entry>,
    pub can_manage: bool,
}

/// Product menu-card template.
#[derive(Template, WebTemplate)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub current_user: Option<CurrentUser>,
    pub restaurant: Restaurant,
    pub section: Section,
    pub category: Category,
    pub product: Product,
    pub can_manage: bool,
}

/// `GET /restaurants`
pub async fn restaurants(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
) -> Result<RestaurantsTemplate, WebError> {
    let visible = access::visible_restaurants(state.pool(), &user, 0, 500).await?;
    let restaurants = visible
        .into_iter()
        .map(|r| Entry {
            url: super::restaurant_path(r.id),
            subtitle: r.concept.clone(),
            title: r.name,
        })
        .collect();

    let can_create = user.role == tablecraft_core::Role::Manager
        && crate::db::RestaurantRepository::new(state.pool())
            .by_manager(user.id)
            .await?
            .is_empty();

    Ok(RestaurantsTemplate {
        current_user: Some(CurrentUser::from(&user)),
        restaurants,
        can_create,
    })
}

/// `GET /restaurants/{r}`
pub async fn restaurant(
    State(state): State<AppState>,
    OptionalWebAuth(user): OptionalWebAuth,
    Path(r): Path<i32>,
) -> Result<RestaurantTemplate, WebError> {
    let restaurant =
        access::viewable_restaurant(state.pool(), user.as_ref(), RestaurantId::new(r)).await?;
    let can_manage = user
        .as_ref()
        .is_some_and(|u| access::can_manage_restaurant(u, &restaurant));

    let sections = SectionRepository::new(state.pool())
        .by_restaurant(restaurant.id)
        .await?
        .into_iter()
        .map(|s| Entry {
            url: super::section_path(restaurant.id, s.id),
            subtitle: s.description.clone(),
            title: s.name,
        })
        .collect();

    // Managers get their shareable waiter link on their own page.
    let waiter_link = match &user {
        Some(u) if restaurant.manager_id == Some(u.id) => {
            Some(invites::get_or_create_waiter_link(state.pool(), u, state.bot_username()).await?)
        }
        _ => None,
    };

    Ok(RestaurantTemplate {
        current_user: user.as_ref().map(CurrentUser::from),
        restaurant,
        sections,
        can_manage,
        waiter_link,
    })
}

/// Resolve the section from the URL, checking it belongs to the restaurant.
pub(super) async fn section_in_restaurant(
    state: &AppState,
    user: Option<&User>,
    r: i32,
    s: i32,
) -> Result<(Restaurant, Section), AppError> {
    let restaurant = access::viewable_restaurant(state.pool(), user, RestaurantId::new(r)).await?;
    let section = SectionRepository::new(state.pool())
        .get(SectionId::new(s))
        .await?
        .filter(|section| section.restaurant_id == restaurant.id)
        .ok_or_else(|| AppError::NotFound(format!("section {s}")))?;
    Ok((restaurant, section))
}

/// Resolve the category from the URL, checking the full chain.
pub(super) async fn category_in_section(
    state: &AppState,
    user: Option<&User>,
    r: i32,
    s: i32,
    c: i32,
) -> Result<(Restaurant, Section, Category), AppError> {
    let (restaurant, section) = section_in_restaurant(state, user, r, s).await?;
    let category = CategoryRepository::new(state.pool())
        .get(CategoryId::new(c))
        .await?
        .filter(|category| category.section_id == section.id)
        .ok_or_else(|| AppError::NotFound(format!("category {c}")))?;
    Ok((restaurant, section, category))
}

/// Resolve the product from the URL, checking the full chain.
pub(super) async fn product_in_category(
    state: &AppState,
    user: Option<&User>,
    r: i32,
    s: i32,
    c: i32,
    p: i32,
) -> Result<(Restaurant, Section, Category, Product), AppError> {
    let (restaurant, section, category) = category_in_section(state, user, r, s, c).await?;
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(p))
        .await?
        .filter(|product| product.category_id == category.id)
        .ok_or_else(|| AppError::NotFound(format!("product {p}")))?;
    Ok((restaurant, section, category, product))
}

/// `GET /restaurants/{r}/sections/{s}`
pub async fn section(
    State(state): State<AppState>,
    OptionalWebAuth(user): OptionalWebAuth,
    Path((r, s)): Path<(i32, i32)>,
) -> Result<SectionTemplate, WebError> {
    let (restaurant, section) = section_in_restaurant(&state, user.as_ref(), r, s).await?;
    let can_manage = user
        .as_ref()
        .is_some_and(|u| access::can_manage_restaurant(u, &restaurant));

    let categories = CategoryRepository::new(state.pool())
        .by_section(section.id)
        .await?
        .into_iter()
        .map(|c| Entry {
            url: super::category_path(restaurant.id, section.id, c.id),
            subtitle: c.description.clone(),
            title: c.title,
        })
        .collect();

    Ok(SectionTemplate {
        current_user: user.as_ref().map(CurrentUser::from),
        restaurant,
        section,
        categories,
        can_manage,
    })
}

/// `GET /restaurants/{r}/sections/{s}/categories/{c}`
pub async fn category(
    State(state): State<AppState>,
    OptionalWebAuth(user): OptionalWebAuth,
    Path((r, s, c)): Path<(i32, i32, i32)>,
) -> Result<CategoryTemplate, WebError> {
    let (restaurant, section, category) =
        category_in_section(&state, user.as_ref(), r, s, c).await?;
    let can_manage = user
        .as_ref()
        .is_some_and(|u| access::can_manage_restaurant(u, &restaurant));

    let products = ProductRepository::new(state.pool())
        .by_category(category.id)
        .await?
        .into_iter()
        .map(|p| Entry {
            url: super::product_path(restaurant.id, section.id, category.id, p.id),
            subtitle: p.weight.clone(),
            title: p.title,
        })
        .collect();

    Ok(CategoryTemplate {
        current_user: user.as_ref().map(CurrentUser::from),
        restaurant,
        section,
        category,
        products,
        can_manage,
    })
}

/// `GET /restaurants/{r}/sections/{s}/categories/{c}/products/{p}`
pub async fn product(
    State(state): State<AppState>,
    OptionalWebAuth(user): OptionalWebAuth,
    Path((r, s, c, p)): Path<(i32, i32, i32, i32)>,
) -> Result<ProductTemplate, WebError> {
    let (restaurant, section, category, product) =
        product_in_category(&state, user.as_ref(), r, s, c, p).await?;
    let can_manage = user
        .as_ref()
        .is_some_and(|u| access::can_manage_restaurant(u, &restaurant));

    Ok(ProductTemplate {
        current_user: user.as_ref().map(CurrentUser::from),
        restaurant,
        section,
        category,
        product,
        can_manage,
    })
}
