mod comment;
mod notification;
mod post;
mod user;

pub use comment::{Comment, CommentStatus, NewComment};
pub use notification::{
    Decision, NewNotification, Notification, NotificationRow, NotificationStatus,
    NotificationType, TARGET_COMMENT, TARGET_POST, decision_notice,
};
pub use post::{BlogPost, NewBlogPost, PostStatus, UpdateBlogPost, slugify};
pub use user::{NewUser, UpdateUser, User, UserRole};
