//! HTTP request handlers, one module per resource.

pub mod admin;
pub mod auth;
pub mod comments;
pub mod generation;
pub mod health;
pub mod me;
pub mod notifications;
pub mod posts;
pub mod sitemap;
pub mod users;
