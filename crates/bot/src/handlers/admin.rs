//! Admin keyboard actions.

use tablecraft_core::Role;
use tablecraft_server::db::User;
use tablecraft_server::services::invites;

use super::{BotContext, BotError};

/// Issue a one-shot manager invitation and hand the admin the deep link.
pub async fn invite_manager(ctx: &BotContext, user: &User, chat_id: i64) -> Result<(), BotError> {
    let link = invites::create_admin_manager_invite(&ctx.pool, user.id, ctx.bot_username()).await?;
    ctx.send(
        chat_id,
        &format!("One-shot manager invitation, valid for a single registration:\n{link}"),
    )
    .await
}

/// Platform statistics: role counts plus a per-manager summary.
pub async fn statistics(ctx: &BotContext, chat_id: i64) -> Result<(), BotError> {
    let users = ctx.users();
    let managers = users.count_by_role(Role::Manager).await?;
    let waiters = users.count_by_role(Role::Waiter).await?;
    let overview = users.manager_overview().await?;

    let mut text = format!("📊 Platform statistics\n\nManagers: {managers}\nWaiters: {waiters}\n");
    if !overview.is_empty() {
        text.push('\n');
        for manager in &overview {
            let name = manager
                .telegram_first_name
                .as_deref()
                .unwrap_or(&manager.username);
            text.push_str(&format!(
                "{name} ({}) - {} waiters, since {}\n",
                manager.username,
                manager.waiters_count,
                manager.created_at.format("%Y-%m-%d"),
            ));
        }
    }

    ctx.send(chat_id, text.trim_end()).await
}
