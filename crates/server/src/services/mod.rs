//! Business logic shared by the web server, the REST API, and the bot.

pub mod access;
pub mod auth;
pub mod invites;
pub mod provisioning;
pub mod uploads;
