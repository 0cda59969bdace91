//! Repository layer for data access operations.

mod comment_repo;
mod notification_repo;
mod post_repo;
mod user_repo;

pub use comment_repo::CommentRepository;
pub use notification_repo::{NotificationRepository, Resolution};
pub use post_repo::PostRepository;
pub use user_repo::UserRepository;

use crate::db::AsyncDbPool;

/// Aggregates all repositories; cloning only bumps the pool's reference count.
#[derive(Clone)]
pub struct Repositories {
    pub users: UserRepository,
    pub posts: PostRepository,
    pub comments: CommentRepository,
    pub notifications: NotificationRepository,
}

impl Repositories {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            posts: PostRepository::new(pool.clone()),
            comments: CommentRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool),
        }
    }
}
