//! Manager keyboard actions.

use tablecraft_server::db::{RestaurantRepository, User};
use tablecraft_server::routes::web::restaurant_path;
use tablecraft_server::services::invites;

use super::{BotContext, BotError};

/// The manager's permanent waiter invitation link, minting it on first use.
pub async fn invitation_link(ctx: &BotContext, user: &User, chat_id: i64) -> Result<(), BotError> {
    let link = invites::get_or_create_waiter_link(&ctx.pool, user, ctx.bot_username()).await?;
    ctx.send(
        chat_id,
        &format!("Share this link with your waiters. It can be used more than once:\n{link}"),
    )
    .await
}

/// List the manager's waiters.
pub async fn my_waiters(ctx: &BotContext, user: &User, chat_id: i64) -> Result<(), BotError> {
    let waiters = ctx.users().waiters_of_manager(user.id).await?;
    if waiters.is_empty() {
        return ctx
            .send(chat_id, "No waiters yet. Share your invitation link to get started.")
            .await;
    }

    let mut text = String::from("👥 Your waiters:\n\n");
    for waiter in &waiters {
        match &waiter.telegram_username {
            Some(handle) => {
                text.push_str(&format!("• {} (@{handle})\n", waiter.display_name()));
            }
            None => text.push_str(&format!("• {}\n", waiter.display_name())),
        }
    }
    ctx.send(chat_id, text.trim_end()).await
}

/// Waiter counts and registration dates for the manager's team.
pub async fn waiter_statistics(
    ctx: &BotContext,
    user: &User,
    chat_id: i64,
) -> Result<(), BotError> {
    let waiters = ctx.users().waiters_of_manager(user.id).await?;
    let mut text = format!("📊 Waiters: {}\n", waiters.len());
    if !waiters.is_empty() {
        text.push('\n');
        for waiter in &waiters {
            text.push_str(&format!(
                "{} - joined {}\n",
                waiter.display_name(),
                waiter.created_at.format("%Y-%m-%d"),
            ));
        }
    }
    ctx.send(chat_id, text.trim_end()).await
}

/// Point the manager at their restaurant's menu page on the web.
pub async fn work_with_menu(ctx: &BotContext, user: &User, chat_id: i64) -> Result<(), BotError> {
    let restaurants = RestaurantRepository::new(&ctx.pool)
        .by_manager(user.id)
        .await?;
    match restaurants.first() {
        Some(restaurant) => {
            let url = format!("{}{}", ctx.config.base_url, restaurant_path(restaurant.id));
            ctx.send(chat_id, &format!("Manage the menu of {} here:\n{url}", restaurant.name))
                .await
        }
        None => {
            ctx.send(chat_id, "You have no restaurant yet. Create one first.")
                .await
        }
    }
}

/// Start restaurant creation, which happens in the web UI.
pub async fn create_restaurant(ctx: &BotContext, user: &User, chat_id: i64) -> Result<(), BotError> {
    let restaurants = RestaurantRepository::new(&ctx.pool)
        .by_manager(user.id)
        .await?;
    if let Some(restaurant) = restaurants.first() {
        let url = format!("{}{}", ctx.config.base_url, restaurant_path(restaurant.id));
        return ctx
            .send(
                chat_id,
                &format!("You already manage {}. One restaurant per manager.\n{url}", restaurant.name),
            )
            .await;
    }

    let url = format!("{}/restaurants/manage/new", ctx.config.base_url);
    ctx.send(chat_id, &format!("Create your restaurant here:\n{url}"))
        .await
}
