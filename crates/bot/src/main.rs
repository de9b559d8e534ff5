//! Tablecraft Telegram bot binary.
//!
//! Long-polls the Bot API and drives the registration dialogue against the
//! same database the web server uses.

mod handlers;
mod keyboards;
mod telegram;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tablecraft_server::config::ServerConfig;
use tablecraft_server::db;

use crate::handlers::BotContext;
use crate::telegram::TelegramClient;

#[tokio::main]
async fn main() {
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tablecraft_bot=info,tablecraft_server=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    let client = TelegramClient::new(&config.telegram.bot_token);
    let identity = client.get_me().await.expect("Failed to reach the Bot API");
    tracing::info!(
        bot = identity.username.as_deref().unwrap_or("?"),
        "Bot connected"
    );

    let ctx = BotContext {
        client,
        pool,
        config: Arc::new(config),
    };

    // getUpdates long-poll loop. Transient API errors back off and retry;
    // per-update failures are contained inside handle_update.
    let mut offset = 0_i64;
    loop {
        let updates = match ctx.client.get_updates(offset).await {
            Ok(updates) => updates,
            Err(error) => {
                tracing::error!(%error, "getUpdates failed, retrying");
                tokio::time::sleep(std::time::Duration::from_secs(3)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            handlers::handle_update(&ctx, update).await;
        }
    }
}
