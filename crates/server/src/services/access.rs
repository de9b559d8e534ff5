//! Hierarchical access control over the restaurant tree.
//!
//! Every section, category, and product inherits the access rule of the
//! restaurant it belongs to, so all checks bottom out in
//! [`can_view_restaurant`] and [`can_manage_restaurant`].

use sqlx::PgPool;
use tablecraft_core::{CategoryId, ProductId, RestaurantId, Role, SectionId};

use crate::db::{
    Category, CategoryRepository, Product, ProductRepository, Restaurant, RestaurantRepository,
    Section, SectionRepository, User,
};
use crate::error::AppError;

/// Whether a user may see a restaurant and its menu.
///
/// The demo restaurant is browsable by everyone, signed in or not. Admins
/// see everything; otherwise visibility requires being the restaurant's
/// manager or its waiter.
#[must_use]
pub fn can_view_restaurant(user: Option<&User>, restaurant: &Restaurant) -> bool {
    if restaurant.is_demo() {
        return true;
    }
    let Some(user) = user else {
        return false;
    };
    user.role == Role::Admin
        || restaurant.manager_id == Some(user.id)
        || restaurant.waiter_id == Some(user.id)
}

/// Whether a user may create, edit, or delete within a restaurant.
///
/// Managing requires the manager role (or admin); waiters never manage,
/// and nobody manages the demo restaurant except the admin.
#[must_use]
pub fn can_manage_restaurant(user: &User, restaurant: &Restaurant) -> bool {
    match user.role {
        Role::Admin => true,
        Role::Manager => restaurant.manager_id == Some(user.id),
        Role::Waiter => false,
    }
}

/// Reject unless the user may view the restaurant.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` for anonymous visitors and
/// `AppError::Forbidden` for signed-in users without access.
pub fn require_view(user: Option<&User>, restaurant: &Restaurant) -> Result<(), AppError> {
    if can_view_restaurant(user, restaurant) {
        Ok(())
    } else if user.is_none() {
        Err(AppError::Unauthorized)
    } else {
        Err(AppError::Forbidden(
            "You don't have access to this restaurant".to_owned(),
        ))
    }
}

/// Reject with `Forbidden` unless the user may manage the restaurant.
///
/// # Errors
///
/// Returns `AppError::Forbidden` when access is denied.
pub fn require_manage(user: &User, restaurant: &Restaurant) -> Result<(), AppError> {
    if can_manage_restaurant(user, restaurant) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the restaurant's manager can do that".to_owned(),
        ))
    }
}

/// Reject with `Forbidden` unless the user holds a managing role.
///
/// # Errors
///
/// Returns `AppError::Forbidden` for waiters.
pub fn require_manager_role(user: &User) -> Result<(), AppError> {
    if user.role.can_manage() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "This action requires a manager account".to_owned(),
        ))
    }
}

/// Fetch a restaurant the user may view.
///
/// # Errors
///
/// `AppError::NotFound` if it does not exist, `AppError::Forbidden` if the
/// user may not see it.
pub async fn viewable_restaurant(
    pool: &PgPool,
    user: Option<&User>,
    id: RestaurantId,
) -> Result<Restaurant, AppError> {
    let restaurant = RestaurantRepository::new(pool)
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("restaurant {id}")))?;
    require_view(user, &restaurant)?;
    Ok(restaurant)
}

/// Fetch a restaurant the user may manage.
///
/// # Errors
///
/// `AppError::NotFound` if it does not exist, `AppError::Forbidden` if the
/// user is not its manager.
pub async fn manageable_restaurant(
    pool: &PgPool,
    user: &User,
    id: RestaurantId,
) -> Result<Restaurant, AppError> {
    let restaurant = RestaurantRepository::new(pool)
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("restaurant {id}")))?;
    require_manage(user, &restaurant)?;
    Ok(restaurant)
}

/// Fetch a section along with its restaurant, checked for viewing.
///
/// # Errors
///
/// `AppError::NotFound` / `AppError::Forbidden` as for
/// [`viewable_restaurant`].
pub async fn viewable_section(
    pool: &PgPool,
    user: Option<&User>,
    id: SectionId,
) -> Result<(Section, Restaurant), AppError> {
    let section = SectionRepository::new(pool)
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("section {id}")))?;
    let restaurant = viewable_restaurant(pool, user, section.restaurant_id).await?;
    Ok((section, restaurant))
}

/// Fetch a section along with its restaurant, checked for managing.
///
/// # Errors
///
/// `AppError::NotFound` / `AppError::Forbidden` as for
/// [`manageable_restaurant`].
pub async fn manageable_section(
    pool: &PgPool,
    user: &User,
    id: SectionId,
) -> Result<(Section, Restaurant), AppError> {
    let section = SectionRepository::new(pool)
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("section {id}")))?;
    let restaurant = manageable_restaurant(pool, user, section.restaurant_id).await?;
    Ok((section, restaurant))
}

/// Fetch a category along with its restaurant, checked for viewing.
///
/// # Errors
///
/// `AppError::NotFound` / `AppError::Forbidden` as for
/// [`viewable_restaurant`].
pub async fn viewable_category(
    pool: &PgPool,
    user: Option<&User>,
    id: CategoryId,
) -> Result<(Category, Restaurant), AppError> {
    let category = CategoryRepository::new(pool)
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;
    let restaurant = viewable_restaurant(pool, user, category.restaurant_id).await?;
    Ok((category, restaurant))
}

/// Fetch a category along with its restaurant, checked for managing.
///
/// # Errors
///
/// `AppError::NotFound` / `AppError::Forbidden` as for
/// [`manageable_restaurant`].
pub async fn manageable_category(
    pool: &PgPool,
    user: &User,
    id: CategoryId,
) -> Result<(Category, Restaurant), AppError> {
    let category = CategoryRepository::new(pool)
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;
    let restaurant = manageable_restaurant(pool, user, category.restaurant_id).await?;
    Ok((category, restaurant))
}

/// Fetch a product along with its restaurant, checked for viewing.
///
/// # Errors
///
/// `AppError::NotFound` / `AppError::Forbidden` as for
/// [`viewable_restaurant`].
pub async fn viewable_product(
    pool: &PgPool,
    user: Option<&User>,
    id: ProductId,
) -> Result<(Product, Restaurant), AppError> {
    let product = ProductRepository::new(pool)
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let restaurant = viewable_restaurant(pool, user, product.restaurant_id).await?;
    Ok((product, restaurant))
}

/// Fetch a product along with its restaurant, checked for managing.
///
/// # Errors
///
/// `AppError::NotFound` / `AppError::Forbidden` as for
/// [`manageable_restaurant`].
pub async fn manageable_product(
    pool: &PgPool,
    user: &User,
    id: ProductId,
) -> Result<(Product, Restaurant), AppError> {
    let product = ProductRepository::new(pool)
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let restaurant = manageable_restaurant(pool, user, product.restaurant_id).await?;
    Ok((product, restaurant))
}

/// The restaurants a user can see: all for the admin, own for a manager,
/// assigned plus demo for a waiter.
///
/// `skip`/`limit` bound the admin's full listing; the per-user sets for
/// managers and waiters are a handful of rows at most.
///
/// # Errors
///
/// Returns `AppError::Database` if a query fails.
pub async fn visible_restaurants(
    pool: &PgPool,
    user: &User,
    skip: i64,
    limit: i64,
) -> Result<Vec<Restaurant>, AppError> {
    let repo = RestaurantRepository::new(pool);
    let mut restaurants = match user.role {
        Role::Admin => repo.list(skip, limit).await?,
        Role::Manager => repo.by_manager(user.id).await?,
        Role::Waiter => repo.by_waiter(user.id).await?,
    };
    if user.role != Role::Admin
        && let Some(demo) = repo.demo().await?
        && restaurants.iter().all(|r| r.id != demo.id)
    {
        restaurants.push(demo);
    }
    Ok(restaurants)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tablecraft_core::{RestaurantId, Role, UserId, Username};

    use super::*;

    fn user(id: i32, role: Role) -> User {
        User {
            id: UserId::new(id),
            username: Username::parse(&format!("user_{id}")).unwrap(),
            role,
            is_active: true,
            telegram_id: None,
            telegram_username: None,
            telegram_first_name: None,
            telegram_last_name: None,
            is_telegram_user: false,
            waiter_link: None,
            manager_id: None,
            created_at: Utc::now(),
        }
    }

    fn restaurant(manager: Option<i32>, waiter: Option<i32>) -> Restaurant {
        Restaurant {
            id: RestaurantId::new(1),
            name: "Trattoria".to_owned(),
            concept: None,
            manager_id: manager.map(UserId::new),
            waiter_id: waiter.map(UserId::new),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn admin_views_and_manages_everything() {
        let admin = user(1, Role::Admin);
        let r = restaurant(Some(2), Some(3));
        assert!(can_view_restaurant(Some(&admin), &r));
        assert!(can_manage_restaurant(&admin, &r));
    }

    #[test]
    fn demo_restaurant_is_visible_to_everyone() {
        let demo = restaurant(None, None);
        assert!(can_view_restaurant(None, &demo));
        for role in [Role::Admin, Role::Manager, Role::Waiter] {
            assert!(can_view_restaurant(Some(&user(9, role)), &demo));
        }
    }

    #[test]
    fn anonymous_visitors_get_unauthorized_elsewhere() {
        let r = restaurant(Some(2), Some(3));
        assert!(!can_view_restaurant(None, &r));
        assert!(matches!(
            require_view(None, &r),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn only_admin_manages_the_demo_restaurant() {
        let demo = restaurant(None, None);
        assert!(can_manage_restaurant(&user(1, Role::Admin), &demo));
        assert!(!can_manage_restaurant(&user(2, Role::Manager), &demo));
        assert!(!can_manage_restaurant(&user(3, Role::Waiter), &demo));
    }

    #[test]
    fn manager_sees_and_manages_own_restaurant_only() {
        let manager = user(2, Role::Manager);
        let own = restaurant(Some(2), None);
        let other = restaurant(Some(5), Some(6));
        assert!(can_view_restaurant(Some(&manager), &own));
        assert!(can_manage_restaurant(&manager, &own));
        assert!(!can_view_restaurant(Some(&manager), &other));
        assert!(!can_manage_restaurant(&manager, &other));
    }

    #[test]
    fn waiter_views_assigned_restaurant_but_never_manages() {
        let waiter = user(3, Role::Waiter);
        let assigned = restaurant(Some(2), Some(3));
        assert!(can_view_restaurant(Some(&waiter), &assigned));
        assert!(!can_manage_restaurant(&waiter, &assigned));
        assert!(require_manage(&waiter, &assigned).is_err());

        let other = restaurant(Some(2), Some(8));
        assert!(!can_view_restaurant(Some(&waiter), &other));
        assert!(matches!(
            require_view(Some(&waiter), &other),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn manager_role_gate() {
        assert!(require_manager_role(&user(1, Role::Admin)).is_ok());
        assert!(require_manager_role(&user(2, Role::Manager)).is_ok());
        assert!(require_manager_role(&user(3, Role::Waiter)).is_err());
    }
}
