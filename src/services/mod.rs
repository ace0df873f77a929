//! Domain services behind the auth context and HTTP routes.

pub mod auth;
pub mod profile;
