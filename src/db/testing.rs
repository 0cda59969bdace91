//! Database fixtures for tests that need a real PostgreSQL.
//!
//! Those tests call [`test_pool`] and return early when `DATABASE_URL` is
//! not set, so the suite stays green on machines without a database.

use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::{AsyncConnection, AsyncPgConnection, SimpleAsyncConnection};
use tokio::sync::OnceCell;

use super::{AsyncDbPool, get_connection, run_pending_migrations};
use crate::models::{BlogPost, NewBlogPost, NewUser, PostStatus, User, UserRole};
use crate::repositories::{PostRepository, UserRepository};

/// Notifications carrying this value as `comment` or `from_user_name` are
/// refused by a trigger, to make an insert fail inside a transaction.
pub const REFUSED_MARKER: &str = "refuse-this-notification";

static PREPARED: OnceCell<String> = OnceCell::const_new();

const REFUSE_TRIGGER: &str = r#"
CREATE OR REPLACE FUNCTION test_refuse_marked_notification() RETURNS trigger AS $$
BEGIN
    RAISE EXCEPTION 'notification refused by test trigger';
END
$$ LANGUAGE plpgsql;

DROP TRIGGER IF EXISTS test_refuse_marked_notification ON notifications;
CREATE TRIGGER test_refuse_marked_notification
    BEFORE INSERT ON notifications
    FOR EACH ROW
    WHEN (NEW.comment = 'refuse-this-notification'
          OR NEW.from_user_name = 'refuse-this-notification')
    EXECUTE FUNCTION test_refuse_marked_notification();
"#;

/// A migrated pool, or `None` when `DATABASE_URL` is unset.
pub async fn test_pool() -> Option<AsyncDbPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    let prepared = PREPARED
        .get_or_init(|| async move {
            run_pending_migrations(&url)
                .await
                .expect("migrations apply to the test database");
            let mut conn = AsyncPgConnection::establish(&url)
                .await
                .expect("test database reachable");
            conn.batch_execute(REFUSE_TRIGGER)
                .await
                .expect("test trigger installs");
            url
        })
        .await;

    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(prepared.as_str());
    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .await
        .expect("test pool builds");
    // Fail here rather than inside the test body
    drop(get_connection(&pool).await.expect("test database reachable"));
    Some(pool)
}

/// Suffix that keeps unique columns apart across tests and runs
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

pub async fn create_user(pool: &AsyncDbPool) -> User {
    let name = unique("user");
    UserRepository::new(pool.clone())
        .create(NewUser {
            username: name.clone(),
            email: format!("{}@example.com", name),
            password: "not-a-real-hash".to_string(),
            role: UserRole::User,
        })
        .await
        .expect("test user inserts")
}

pub async fn create_published_post(pool: &AsyncDbPool) -> BlogPost {
    let slug = unique("post");
    PostRepository::new(pool.clone())
        .create(NewBlogPost {
            title: "Local SEO".to_string(),
            slug,
            excerpt: String::new(),
            content: "Body".to_string(),
            tags: Vec::new(),
            status: PostStatus::Published,
            author_id: None,
            published_at: Some(chrono::Utc::now()),
        })
        .await
        .expect("test post inserts")
}
