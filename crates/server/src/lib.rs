//! Tablecraft server: REST API and server-rendered web UI for
//! restaurant menu management.
//!
//! The bot crate links against this library for the shared config, data
//! access, and provisioning services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ServerConfig;
pub use error::AppError;
pub use state::AppState;
