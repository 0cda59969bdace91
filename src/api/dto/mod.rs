//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain. The notification DTOs double as the wire
//! format of `ApiNotificationStore`.

mod auth;
mod comment;
mod error;
mod generation;
mod health;
mod notification;
mod pagination;
mod post;
mod user;

pub use auth::{
    AuthResponse, LoginRequest, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest,
    UserInfo,
};
pub use comment::CreateCommentRequest;
pub use error::ErrorResponse;
pub use generation::{
    AudienceRequest, AudienceResponse, BlogPostRequest, BlogPostResponse, DailyPostRequest,
    KeywordsRequest, KeywordsResponse, TagsRequest, TagsResponse,
};
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use notification::{
    CreateNotificationRequest, MarkAllReadResponse, NotificationListResponse, NotificationQuery,
    RejectRequest, ScopeQuery, UnreadCountResponse,
};
pub use pagination::{PagedResponse, PaginationMeta, PaginationParams};
pub use post::{CreatePostRequest, PostListQuery, UpdatePostRequest};
pub use user::{UpdateRoleRequest, UserResponse};
