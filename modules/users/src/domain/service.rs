use std::sync::Arc;

use crate::contract::model::{NewUser, User, UserPatch};
use crate::domain::error::DomainError;
use crate::domain::repo::UsersRepository;
use tracing::{debug, info, instrument};

/// Domain service with business rules for user management.
/// Depends only on the repository port, not on infra types.
///
/// Shape validation (lengths, email format) belongs to the caller; this
/// layer enforces existence and email uniqueness. The pre-checks only give a
/// friendly early answer: the store's unique constraint is what actually
/// guarantees uniqueness, and its violation surfaces as the same conflict.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
}

impl Service {
    pub fn new(repo: Arc<dyn UsersRepository>) -> Self {
        Self { repo }
    }

    #[instrument(name = "users.service.list", skip(self))]
    pub async fn list(&self) -> Result<Vec<User>, DomainError> {
        debug!("Listing users");
        let users = self.repo.list_all().await?;
        debug!("Successfully listed {} users", users.len());
        Ok(users)
    }

    #[instrument(name = "users.service.get_by_id", skip(self), fields(user_id = id))]
    pub async fn get_by_id(&self, id: i64) -> Result<User, DomainError> {
        debug!("Getting user by id");
        let user = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))?;
        debug!("Successfully retrieved user");
        Ok(user)
    }

    /// Absence is a normal outcome here, not an error.
    #[instrument(name = "users.service.get_by_email", skip(self), fields(email = %email))]
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        debug!("Getting user by email");
        Ok(self.repo.find_by_email(email).await?)
    }

    #[instrument(
        name = "users.service.create",
        skip(self),
        fields(email = %new_user.email, name = %new_user.name)
    )]
    pub async fn create(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");

        if self.repo.find_by_email(&new_user.email).await?.is_some() {
            debug!("Email already taken");
            return Err(DomainError::email_already_exists(new_user.email));
        }

        let user = self.repo.insert(new_user).await?;

        info!("Successfully created user with id={}", user.id);
        Ok(user)
    }

    #[instrument(name = "users.service.update", skip(self, patch), fields(user_id = id))]
    pub async fn update(&self, id: i64, patch: UserPatch) -> Result<User, DomainError> {
        info!("Updating user");

        let current = self.get_by_id(id).await?;
        let changes = patch.effective_against(&current);

        if let Some(ref new_email) = changes.email {
            if let Some(owner) = self.repo.find_by_email(new_email).await? {
                if owner.id != id {
                    debug!(owner_id = owner.id, "Email owned by another user");
                    return Err(DomainError::email_already_exists(new_email.clone()));
                }
            }
        }

        if changes.is_empty() {
            debug!("No effective changes, skipping write");
            return Ok(current);
        }

        let updated = self
            .repo
            .update(id, changes)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        info!("Successfully updated user");
        Ok(updated)
    }

    #[instrument(name = "users.service.delete", skip(self), fields(user_id = id))]
    pub async fn delete(&self, id: i64) -> Result<(), DomainError> {
        info!("Deleting user");

        self.get_by_id(id).await?;

        // lost a race with a concurrent delete
        if !self.repo.delete(id).await? {
            return Err(DomainError::user_not_found(id));
        }

        info!("Successfully deleted user");
        Ok(())
    }
}
