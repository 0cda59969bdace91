//! User repository for async database operations.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::{AsyncDbPool, get_connection};
use crate::error::AppError;
use crate::models::{NewUser, UpdateUser, User};

#[derive(Clone)]
pub struct UserRepository {
    pool: AsyncDbPool,
}

impl UserRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database.
    ///
    /// # Returns
    /// The created user with generated id and timestamps
    pub async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::insert_into(users)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, AppError> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        users
            .filter(id.eq(user_id))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Finds a user by email or username, the two login identifiers.
    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        users
            .filter(email.eq(login).or(username.eq(login)))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Lists one page of users, newest first.
    ///
    /// # Returns
    /// The page and the total number of users
    pub async fn list(&self, offset: i64, limit: i64) -> Result<(Vec<User>, i64), AppError> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let total = users.count().get_result::<i64>(&mut conn).await?;
        let page = users
            .order(created_at.desc())
            .offset(offset)
            .limit(limit)
            .select(User::as_select())
            .load(&mut conn)
            .await?;

        Ok((page, total))
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        users
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn update(&self, user_id: i32, mut changes: UpdateUser) -> Result<User, AppError> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        changes.updated_at = Some(chrono::Utc::now());
        diesel::update(users.filter(id.eq(user_id)))
            .set(&changes)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Returns the number of affected rows (0 or 1)
    pub async fn delete(&self, user_id: i32) -> Result<usize, AppError> {
        use crate::schema::users::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::delete(users.filter(id.eq(user_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
