//! Core types for Tablecraft.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod role;
pub mod username;

pub use id::*;
pub use role::Role;
pub use username::{Username, UsernameError};
