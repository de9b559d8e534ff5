//! Waiter keyboard actions.

use tablecraft_server::db::User;
use tablecraft_server::routes::web::restaurant_path;
use tablecraft_server::services::access;

use super::{BotContext, BotError};

/// Web links to every restaurant the waiter can browse.
pub async fn menu(ctx: &BotContext, user: &User, chat_id: i64) -> Result<(), BotError> {
    let restaurants = access::visible_restaurants(&ctx.pool, user, 0, 500).await?;
    if restaurants.is_empty() {
        return ctx
            .send(chat_id, "No restaurants are available to you yet.")
            .await;
    }

    let mut text = String::from("🍽 Your menu:\n\n");
    for restaurant in &restaurants {
        let url = format!("{}{}", ctx.config.base_url, restaurant_path(restaurant.id));
        text.push_str(&format!("{}\n{url}\n\n", restaurant.name));
    }
    ctx.send(chat_id, text.trim_end()).await
}
