//! Request middleware and extractors.

pub mod auth;

pub use auth::{ApiAuth, OptionalWebAuth, WebAuth};
