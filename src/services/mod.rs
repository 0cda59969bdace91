//! Service layer for business logic operations.
//!
//! Services encapsulate business logic and coordinate between
//! repositories, the LLM chain and the notification broadcaster.

mod comment_service;
mod content_service;
pub mod notifications;
mod post_service;
mod sitemap_service;
mod stats_service;
mod user_service;

pub use comment_service::{CommentDraft, CommentService};
pub use content_service::{
    ContentService, DEFAULT_KEYWORD_COUNT, Generated, GeneratedPost, pick_topic,
};
pub use notifications::NotificationService;
pub use post_service::{Actor, PostDraft, PostService, normalize_tags};
pub use sitemap_service::{STATIC_PAGES, SitemapService, StaticPage, render_sitemap};
pub use stats_service::{SiteStats, StatsService};
pub use user_service::UserService;

use crate::config::Settings;
use crate::external::llm::LlmChain;
use crate::repositories::Repositories;

/// Aggregates all services for convenient access.
///
/// This struct is designed to be used as Axum application state.
/// Cloning is cheap: every service holds pool handles and one shared
/// broadcast sender.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub posts: PostService,
    pub comments: CommentService,
    pub notifications: NotificationService,
    pub content: ContentService,
    pub sitemap: SitemapService,
    pub stats: StatsService,
}

impl Services {
    pub fn new(repos: Repositories, settings: &Settings) -> Self {
        let notifications = NotificationService::new(
            repos.notifications,
            settings.notifications.channel_capacity,
        );
        let users = UserService::new(repos.users, notifications.clone());
        let posts = PostService::new(repos.posts.clone(), notifications.clone());
        let comments = CommentService::new(repos.comments, repos.posts.clone(), notifications.clone());
        let content = ContentService::new(
            LlmChain::from_settings(&settings.llm),
            posts.clone(),
            notifications.clone(),
        );
        let sitemap = SitemapService::new(repos.posts, settings.site.base_url.clone());
        let stats = StatsService::new(
            users.clone(),
            posts.clone(),
            comments.clone(),
            notifications.clone(),
        );

        Self {
            users,
            posts,
            comments,
            notifications,
            content,
            sitemap,
            stats,
        }
    }
}
