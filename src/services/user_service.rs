//! User service for registration, authentication and lookups.

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{
    NewNotification, NewUser, NotificationStatus, NotificationType, UpdateUser, User, UserRole,
};
use crate::repositories::UserRepository;
use crate::services::NotificationService;
use crate::utils::password::{hash_password, verify_password};

/// User service; cloning only bumps the pool's reference count.
#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
    notifications: NotificationService,
}

impl UserService {
    pub fn new(repo: UserRepository, notifications: NotificationService) -> Self {
        Self {
            repo,
            notifications,
        }
    }

    /// Registers a regular user and tells the admin inbox about it.
    ///
    /// The password is hashed here; callers pass it in plain text.
    pub async fn register(&self, username: String, email: String, password: String) -> AppResult<User> {
        let user = self
            .repo
            .create(NewUser {
                username,
                email,
                password: hash_password(&password)?,
                role: UserRole::User,
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "User registered");

        let notice = NewNotification::new(
            NotificationType::UserRegistered,
            NotificationStatus::Unread,
            "New user registered",
            format!("{} ({}) created an account.", user.username, user.email),
        )
        .from_user(user.id, user.username.clone());

        // The account exists either way
        if let Err(err) = self.notifications.notify(notice).await {
            warn!(user_id = user.id, error = %err, "Failed to record registration notice");
        }

        Ok(user)
    }

    /// Checks credentials; `login` is an email address or a username.
    ///
    /// # Errors
    /// `Unauthorized` with the same message whether the user is unknown or
    /// the password is wrong
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<User> {
        let invalid = || AppError::Unauthorized {
            message: "Invalid credentials".to_string(),
        };

        let user = self.repo.find_by_login(login).await?.ok_or_else(invalid)?;
        if !verify_password(password, &user.password)? {
            warn!(user_id = user.id, "Failed login attempt");
            return Err(invalid());
        }
        Ok(user)
    }

    pub async fn get_user(&self, id: i32) -> AppResult<User> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("user", id))
    }

    /// # Returns
    /// A tuple of (users, total_count)
    pub async fn list_users(&self, offset: i64, limit: i64) -> AppResult<(Vec<User>, i64)> {
        self.repo.list(offset, limit).await
    }

    pub async fn count(&self) -> AppResult<i64> {
        self.repo.count().await
    }

    /// Promotes or demotes a user.
    pub async fn set_role(&self, id: i32, role: UserRole) -> AppResult<User> {
        self.get_user(id).await?;
        let user = self
            .repo
            .update(
                id,
                UpdateUser {
                    role: Some(role),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = id, role = role.as_str(), "User role changed");
        Ok(user)
    }

    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        if self.repo.delete(id).await? == 0 {
            return Err(AppError::not_found("user", id));
        }
        info!(user_id = id, "User deleted");
        Ok(())
    }
}
