//! Management pages: create, edit, and delete within a restaurant.
//!
//! All handlers re-check ownership on the restaurant resolved from the
//! URL; the `/manage/` segment is routing convention, not authorization.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tablecraft_core::{RestaurantId, Role};

use crate::db::{
    CategoryRepository, NewRestaurant, ProductInput, ProductRepository, RestaurantRepository,
    SectionRepository,
};
use crate::error::AppError;
use crate::middleware::WebAuth;
use crate::services::{access, uploads};
use crate::state::AppState;

use super::browse::{category_in_section, product_in_category, section_in_restaurant};
use super::{CurrentUser, WebError};

/// Shared form template for name/description pairs (restaurants,
/// sections, categories).
#[derive(Template, WebTemplate)]
#[template(path = "manage/item_form.html")]
pub struct ItemFormTemplate {
    pub current_user: Option<CurrentUser>,
    pub heading: String,
    pub action: String,
    pub name_label: &'static str,
    pub name: String,
    pub description: String,
    pub back_url: String,
}

/// Product form template with the full menu-card field set.
#[derive(Template, WebTemplate)]
#[template(path = "manage/product_form.html")]
pub struct ProductFormTemplate {
    pub current_user: Option<CurrentUser>,
    pub heading: String,
    pub action: String,
    pub product: ProductInput,
    pub back_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ItemForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

fn blank_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn required(value: &str, label: &str) -> Result<String, AppError> {
    blank_to_none(value).ok_or_else(|| AppError::Validation(format!("{label} must not be empty")))
}

// =============================================================================
// Restaurants
// =============================================================================

/// `GET /restaurants/manage/new`
pub async fn new_restaurant_page(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
) -> Result<ItemFormTemplate, WebError> {
    ensure_can_create_restaurant(&state, &user).await?;
    Ok(ItemFormTemplate {
        current_user: Some(CurrentUser::from(&user)),
        heading: "New restaurant".to_owned(),
        action: "/restaurants/manage/new".to_owned(),
        name_label: "Name",
        name: String::new(),
        description: String::new(),
        back_url: "/restaurants".to_owned(),
    })
}

/// `POST /restaurants/manage/new`
pub async fn create_restaurant(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Form(form): Form<ItemForm>,
) -> Result<Redirect, WebError> {
    ensure_can_create_restaurant(&state, &user).await?;
    let restaurant = RestaurantRepository::new(state.pool())
        .create(&NewRestaurant {
            name: required(&form.name, "Name")?,
            concept: blank_to_none(&form.description),
            manager_id: Some(user.id),
        })
        .await?;
    Ok(Redirect::to(&super::restaurant_path(restaurant.id)))
}

async fn ensure_can_create_restaurant(
    state: &AppState,
    user: &crate::db::User,
) -> Result<(), AppError> {
    access::require_manager_role(user)?;
    if user.role == Role::Manager
        && !RestaurantRepository::new(state.pool())
            .by_manager(user.id)
            .await?
            .is_empty()
    {
        return Err(AppError::Conflict(
            "You already manage a restaurant".to_owned(),
        ));
    }
    Ok(())
}

/// `GET /restaurants/{r}/manage/edit`
pub async fn edit_restaurant_page(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path(r): Path<i32>,
) -> Result<ItemFormTemplate, WebError> {
    let restaurant =
        access::manageable_restaurant(state.pool(), &user, RestaurantId::new(r)).await?;
    Ok(ItemFormTemplate {
        current_user: Some(CurrentUser::from(&user)),
        heading: format!("Edit {}", restaurant.name),
        action: format!("/restaurants/{r}/manage/edit"),
        name_label: "Name",
        name: restaurant.name.clone(),
        description: restaurant.concept.clone().unwrap_or_default(),
        back_url: super::restaurant_path(restaurant.id),
    })
}

/// `POST /restaurants/{r}/manage/edit`
pub async fn update_restaurant(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path(r): Path<i32>,
    Form(form): Form<ItemForm>,
) -> Result<Redirect, WebError> {
    let restaurant =
        access::manageable_restaurant(state.pool(), &user, RestaurantId::new(r)).await?;
    RestaurantRepository::new(state.pool())
        .update(
            restaurant.id,
            &required(&form.name, "Name")?,
            blank_to_none(&form.description).as_deref(),
        )
        .await?;
    Ok(Redirect::to(&super::restaurant_path(restaurant.id)))
}

// =============================================================================
// Sections
// =============================================================================

/// `GET /restaurants/{r}/manage/sections/new`
pub async fn new_section_page(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path(r): Path<i32>,
) -> Result<ItemFormTemplate, WebError> {
    let restaurant =
        access::manageable_restaurant(state.pool(), &user, RestaurantId::new(r)).await?;
    Ok(ItemFormTemplate {
        current_user: Some(CurrentUser::from(&user)),
        heading: "New section".to_owned(),
        action: format!("/restaurants/{r}/manage/sections/new"),
        name_label: "Name",
        name: String::new(),
        description: String::new(),
        back_url: super::restaurant_path(restaurant.id),
    })
}

/// `POST /restaurants/{r}/manage/sections/new`
pub async fn create_section(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path(r): Path<i32>,
    Form(form): Form<ItemForm>,
) -> Result<Redirect, WebError> {
    let restaurant =
        access::manageable_restaurant(state.pool(), &user, RestaurantId::new(r)).await?;
    let section = SectionRepository::new(state.pool())
        .create(
            restaurant.id,
            &required(&form.name, "Name")?,
            blank_to_none(&form.description).as_deref(),
        )
        .await?;
    Ok(Redirect::to(&super::section_path(restaurant.id, section.id)))
}

/// `GET /restaurants/{r}/sections/{s}/manage/edit`
pub async fn edit_section_page(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path((r, s)): Path<(i32, i32)>,
) -> Result<ItemFormTemplate, WebError> {
    let (restaurant, section) = section_in_restaurant(&state, Some(&user), r, s).await?;
    access::require_manage(&user, &restaurant)?;
    Ok(ItemFormTemplate {
        current_user: Some(CurrentUser::from(&user)),
        heading: format!("Edit {}", section.name),
        action: format!("/restaurants/{r}/sections/{s}/manage/edit"),
        name_label: "Name",
        name: section.name.clone(),
        description: section.description.clone().unwrap_or_default(),
        back_url: super::section_path(restaurant.id, section.id),
    })
}

/// `POST /restaurants/{r}/sections/{s}/manage/edit`
pub async fn update_section(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path((r, s)): Path<(i32, i32)>,
    Form(form): Form<ItemForm>,
) -> Result<Redirect, WebError> {
    let (restaurant, section) = section_in_restaurant(&state, Some(&user), r, s).await?;
    access::require_manage(&user, &restaurant)?;
    SectionRepository::new(state.pool())
        .update(
            section.id,
            &required(&form.name, "Name")?,
            blank_to_none(&form.description).as_deref(),
        )
        .await?;
    Ok(Redirect::to(&super::section_path(restaurant.id, section.id)))
}

/// `POST /restaurants/{r}/sections/{s}/manage/delete`
pub async fn delete_section(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path((r, s)): Path<(i32, i32)>,
) -> Result<Redirect, WebError> {
    let (restaurant, section) = section_in_restaurant(&state, Some(&user), r, s).await?;
    access::require_manage(&user, &restaurant)?;
    SectionRepository::new(state.pool()).delete(section.id).await?;
    Ok(Redirect::to(&super::restaurant_path(restaurant.id)))
}

// =============================================================================
// Categories
// =============================================================================

/// `GET /restaurants/{r}/sections/{s}/manage/categories/new`
pub async fn new_category_page(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path((r, s)): Path<(i32, i32)>,
) -> Result<ItemFormTemplate, WebError> {
    let (restaurant, section) = section_in_restaurant(&state, Some(&user), r, s).await?;
    access::require_manage(&user, &restaurant)?;
    Ok(ItemFormTemplate {
        current_user: Some(CurrentUser::from(&user)),
        heading: "New category".to_owned(),
        action: format!("/restaurants/{r}/sections/{s}/manage/categories/new"),
        name_label: "Title",
        name: String::new(),
        description: String::new(),
        back_url: super::section_path(restaurant.id, section.id),
    })
}

/// `POST /restaurants/{r}/sections/{s}/manage/categories/new`
pub async fn create_category(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path((r, s)): Path<(i32, i32)>,
    Form(form): Form<ItemForm>,
) -> Result<Redirect, WebError> {
    let (restaurant, section) = section_in_restaurant(&state, Some(&user), r, s).await?;
    access::require_manage(&user, &restaurant)?;
    let category = CategoryRepository::new(state.pool())
        .create(
            section.id,
            restaurant.id,
            &required(&form.name, "Title")?,
            blank_to_none(&form.description).as_deref(),
        )
        .await?;
    Ok(Redirect::to(&super::category_path(
        restaurant.id,
        section.id,
        category.id,
    )))
}

/// `GET /restaurants/{r}/sections/{s}/categories/{c}/manage/edit`
pub async fn edit_category_page(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path((r, s, c)): Path<(i32, i32, i32)>,
) -> Result<ItemFormTemplate, WebError> {
    let (restaurant, section, category) = category_in_section(&state, Some(&user), r, s, c).await?;
    access::require_manage(&user, &restaurant)?;
    Ok(ItemFormTemplate {
        current_user: Some(CurrentUser::from(&user)),
        heading: format!("Edit {}", category.title),
        action: format!("/restaurants/{r}/sections/{s}/categories/{c}/manage/edit"),
        name_label: "Title",
        name: category.title.clone(),
        description: category.description.clone().unwrap_or_default(),
        back_url: super::category_path(restaurant.id, section.id, category.id),
    })
}

/// `POST /restaurants/{r}/sections/{s}/categories/{c}/manage/edit`
pub async fn update_category(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path((r, s, c)): Path<(i32, i32, i32)>,
    Form(form): Form<ItemForm>,
) -> Result<Redirect, WebError> {
    let (restaurant, section, category) = category_in_section(&state, Some(&user), r, s, c).await?;
    access::require_manage(&user, &restaurant)?;
    CategoryRepository::new(state.pool())
        .update(
            category.id,
            &required(&form.name, "Title")?,
            blank_to_none(&form.description).as_deref(),
        )
        .await?;
    Ok(Redirect::to(&super::category_path(
        restaurant.id,
        section.id,
        category.id,
    )))
}

/// `POST /restaurants/{r}/sections/{s}/categories/{c}/manage/delete`
pub async fn delete_category(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path((r, s, c)): Path<(i32, i32, i32)>,
) -> Result<Redirect, WebError> {
    let (restaurant, section, category) = category_in_section(&state, Some(&user), r, s, c).await?;
    access::require_manage(&user, &restaurant)?;
    CategoryRepository::new(state.pool()).delete(category.id).await?;
    Ok(Redirect::to(&super::section_path(restaurant.id, section.id)))
}

// =============================================================================
// Products
// =============================================================================

/// `GET /restaurants/{r}/sections/{s}/categories/{c}/manage/products/new`
pub async fn new_product_page(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path((r, s, c)): Path<(i32, i32, i32)>,
) -> Result<ProductFormTemplate, WebError> {
    let (restaurant, section, category) = category_in_section(&state, Some(&user), r, s, c).await?;
    access::require_manage(&user, &restaurant)?;
    Ok(ProductFormTemplate {
        current_user: Some(CurrentUser::from(&user)),
        heading: "New product".to_owned(),
        action: format!("/restaurants/{r}/sections/{s}/categories/{c}/manage/products/new"),
        product: ProductInput::default(),
        back_url: super::category_path(restaurant.id, section.id, category.id),
    })
}

/// `POST /restaurants/{r}/sections/{s}/categories/{c}/manage/products/new`
pub async fn create_product(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path((r, s, c)): Path<(i32, i32, i32)>,
    multipart: Multipart,
) -> Result<Redirect, WebError> {
    let (restaurant, section, category) = category_in_section(&state, Some(&user), r, s, c).await?;
    access::require_manage(&user, &restaurant)?;

    let input = read_product_form(&state, multipart).await?;
    if input.title.is_empty() {
        return Err(AppError::Validation("Title must not be empty".to_owned()).into());
    }
    let product = ProductRepository::new(state.pool())
        .create(category.id, restaurant.id, &input)
        .await?;
    Ok(Redirect::to(&super::product_path(
        restaurant.id,
        section.id,
        category.id,
        product.id,
    )))
}

/// `GET /restaurants/{r}/sections/{s}/categories/{c}/products/{p}/manage/edit`
pub async fn edit_product_page(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path((r, s, c, p)): Path<(i32, i32, i32, i32)>,
) -> Result<ProductFormTemplate, WebError> {
    let (restaurant, section, category, product) =
        product_in_category(&state, Some(&user), r, s, c, p).await?;
    access::require_manage(&user, &restaurant)?;
    Ok(ProductFormTemplate {
        current_user: Some(CurrentUser::from(&user)),
        heading: format!("Edit {}", product.title),
        action: format!(
            "/restaurants/{r}/sections/{s}/categories/{c}/products/{p}/manage/edit"
        ),
        product: ProductInput {
            title: product.title,
            weight: product.weight,
            ingredients: product.ingredients,
            allergens: product.allergens,
            description: product.description,
            features: product.features,
            table_setting: product.table_setting,
            gastronomic_pairings: product.gastronomic_pairings,
            image_path: product.image_path,
        },
        back_url: super::product_path(restaurant.id, section.id, category.id, product.id),
    })
}

/// `POST /restaurants/{r}/sections/{s}/categories/{c}/products/{p}/manage/edit`
pub async fn update_product(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path((r, s, c, p)): Path<(i32, i32, i32, i32)>,
    multipart: Multipart,
) -> Result<Redirect, WebError> {
    let (restaurant, section, category, product) =
        product_in_category(&state, Some(&user), r, s, c, p).await?;
    access::require_manage(&user, &restaurant)?;

    let input = read_product_form(&state, multipart).await?;
    if input.title.is_empty() {
        return Err(AppError::Validation("Title must not be empty".to_owned()).into());
    }
    ProductRepository::new(state.pool()).update(product.id, &input).await?;
    Ok(Redirect::to(&super::product_path(
        restaurant.id,
        section.id,
        category.id,
        product.id,
    )))
}

/// `POST /restaurants/{r}/sections/{s}/categories/{c}/products/{p}/manage/delete`
pub async fn delete_product(
    State(state): State<AppState>,
    WebAuth(user): WebAuth,
    Path((r, s, c, p)): Path<(i32, i32, i32, i32)>,
) -> Result<Redirect, WebError> {
    let (restaurant, section, category, product) =
        product_in_category(&state, Some(&user), r, s, c, p).await?;
    access::require_manage(&user, &restaurant)?;
    ProductRepository::new(state.pool()).soft_delete(product.id).await?;
    Ok(Redirect::to(&super::category_path(
        restaurant.id,
        section.id,
        category.id,
    )))
}

/// Read the multipart product form; an uploaded image is written to disk
/// and its stored filename placed in `image_path`.
async fn read_product_form(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<ProductInput, AppError> {
    let mut input = ProductInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed form: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        if name == "image" {
            let filename = field.file_name().unwrap_or_default().to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
            if filename.is_empty() || bytes.is_empty() {
                continue;
            }
            let config = state.config();
            let stored = uploads::save_image(
                &config.upload_dir,
                config.max_upload_bytes,
                &filename,
                &bytes,
            )
            .await?;
            input.image_path = Some(format!("/uploads/{stored}"));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("malformed form: {e}")))?;
        match name.as_str() {
            "title" => input.title = value.trim().to_owned(),
            "weight" => input.weight = blank_to_none(&value),
            "ingredients" => input.ingredients = value.trim().to_owned(),
            "allergens" => input.allergens = blank_to_none(&value),
            "description" => input.description = blank_to_none(&value),
            "features" => input.features = blank_to_none(&value),
            "table_setting" => input.table_setting = blank_to_none(&value),
            "gastronomic_pairings" => input.gastronomic_pairings = blank_to_none(&value),
            _ => {}
        }
    }

    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_become_none() {
        assert_eq!(blank_to_none("  "), None);
        assert_eq!(blank_to_none(""), None);
        assert_eq!(blank_to_none(" beef "), Some("beef".to_owned()));
    }

    #[test]
    fn required_rejects_blank() {
        assert!(required("", "Name").is_err());
        assert_eq!(required(" Bistro ", "Name").unwrap(), "Bistro");
    }
}
