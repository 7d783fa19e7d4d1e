use crate::contract::model::{NewUser, User, UserPatch};
use async_trait::async_trait;
use thiserror::Error;

/// Failures reported by a repository implementation.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The store's uniqueness constraint on `email` rejected the write.
    #[error("email '{email}' violates the unique constraint")]
    DuplicateEmail { email: String },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Load a user by id.
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>>;
    /// Load a user by exact email.
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// All users, newest first (`created_at` desc, then `id` desc).
    async fn list_all(&self) -> RepoResult<Vec<User>>;
    /// Insert and return the row as stored; the store assigns id and timestamps.
    async fn insert(&self, new_user: NewUser) -> RepoResult<User>;
    /// Write the `Some` fields of `patch`. `None` when no row has this id.
    async fn update(&self, id: i64, patch: UserPatch) -> RepoResult<Option<User>>;
    /// Delete by id. Returns true if a row was deleted.
    async fn delete(&self, id: i64) -> RepoResult<bool>;
}
