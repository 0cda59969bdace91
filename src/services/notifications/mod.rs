//! Notification subsystem.
//!
//! [`NotificationService`] owns the `notifications` table and publishes
//! change events; [`NotificationFeed`] keeps a local copy of one scope in
//! sync with any [`NotificationStore`].

mod feed;
mod notification_service;
mod retry;
mod store;

pub use feed::{FeedOptions, FeedSnapshot, FeedWaker, NotificationFeed};
pub use notification_service::NotificationService;
pub use retry::RetryPolicy;
pub use store::{NotificationChange, NotificationStore};
