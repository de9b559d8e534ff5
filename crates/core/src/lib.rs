//! Tablecraft Core - Shared types library.
//!
//! This crate provides common types used across all Tablecraft components:
//! - `server` - REST API and server-rendered menu site
//! - `bot` - Telegram onboarding bot
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, usernames, and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
