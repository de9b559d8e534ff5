//! Minimal Telegram Bot API client: long polling and message sending.

pub mod client;
pub mod types;

pub use client::{TelegramClient, TelegramError};
