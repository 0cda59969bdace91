//! Clients for services outside this process.

mod api_store;
pub mod client;
pub mod llm;

pub use api_store::ApiNotificationStore;
