//! Blog post repository.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::{AsyncDbPool, get_connection};
use crate::error::AppError;
use crate::models::{BlogPost, NewBlogPost, PostStatus, UpdateBlogPost};

#[derive(Clone)]
pub struct PostRepository {
    pool: AsyncDbPool,
}

impl PostRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_post: NewBlogPost) -> Result<BlogPost, AppError> {
        use crate::schema::blog_posts::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::insert_into(blog_posts)
            .values(&new_post)
            .returning(BlogPost::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn find_by_id(&self, post_id: i32) -> Result<Option<BlogPost>, AppError> {
        use crate::schema::blog_posts::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        blog_posts
            .find(post_id)
            .select(BlogPost::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn find_by_slug(&self, post_slug: &str) -> Result<Option<BlogPost>, AppError> {
        use crate::schema::blog_posts::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        blog_posts
            .filter(slug.eq(post_slug))
            .select(BlogPost::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Whether any post already uses the slug
    pub async fn slug_exists(&self, post_slug: &str) -> Result<bool, AppError> {
        use crate::schema::blog_posts::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::select(diesel::dsl::exists(blog_posts.filter(slug.eq(post_slug))))
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Lists one page of posts, optionally narrowed to a status.
    ///
    /// Published posts are ordered by publication date, everything else by
    /// creation date, newest first.
    ///
    /// # Returns
    /// The page and the total matching count
    pub async fn list(
        &self,
        status_filter: Option<PostStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<BlogPost>, i64), AppError> {
        use crate::schema::blog_posts::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let mut count_query = blog_posts.into_boxed();
        let mut page_query = blog_posts.into_boxed();
        if let Some(wanted) = status_filter {
            count_query = count_query.filter(status.eq(wanted));
            page_query = page_query.filter(status.eq(wanted));
        }

        let total = count_query.count().get_result::<i64>(&mut conn).await?;
        let page = page_query
            .order((published_at.desc().nulls_last(), created_at.desc()))
            .offset(offset)
            .limit(limit)
            .select(BlogPost::as_select())
            .load(&mut conn)
            .await?;

        Ok((page, total))
    }

    /// `(slug, updated_at)` of every published post, for the sitemap
    pub async fn published_slugs(&self) -> Result<Vec<(String, DateTime<Utc>)>, AppError> {
        use crate::schema::blog_posts::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        blog_posts
            .filter(status.eq(PostStatus::Published))
            .order(published_at.desc().nulls_last())
            .select((slug, updated_at))
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn update(
        &self,
        post_id: i32,
        mut changes: UpdateBlogPost,
    ) -> Result<BlogPost, AppError> {
        use crate::schema::blog_posts::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        changes.updated_at = Some(Utc::now());
        diesel::update(blog_posts.find(post_id))
            .set(&changes)
            .returning(BlogPost::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Atomically increments the like counter.
    pub async fn increment_likes(&self, post_id: i32) -> Result<Option<BlogPost>, AppError> {
        use crate::schema::blog_posts::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::update(blog_posts.find(post_id))
            .set(likes.eq(likes + 1))
            .returning(BlogPost::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn delete(&self, post_id: i32) -> Result<usize, AppError> {
        use crate::schema::blog_posts::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::delete(blog_posts.find(post_id))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// `(total, published)` counts
    pub async fn counts(&self) -> Result<(i64, i64), AppError> {
        use crate::schema::blog_posts::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let total = blog_posts.count().get_result::<i64>(&mut conn).await?;
        let published = blog_posts
            .filter(status.eq(PostStatus::Published))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;

        Ok((total, published))
    }
}
