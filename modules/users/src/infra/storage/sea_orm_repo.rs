//! SeaORM-backed repository implementation for the domain port.
//!
//! This struct is generic over `C: ConnectionTrait`, so you can construct it
//! with a `DatabaseConnection` **or** a transactional connection.

use anyhow::Context;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, Unchanged,
};

use crate::contract::model::{NewUser, User, UserPatch};
use crate::domain::repo::{RepoError, RepoResult, UsersRepository};
use crate::infra::storage::entity::{ActiveModel as UserAM, Column, Entity as UserEntity};

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

/// A unique violation on a write that carried `email` is a duplicate email;
/// anything else is a store fault.
fn classify_write_error(err: DbErr, email: Option<&str>, op: &'static str) -> RepoError {
    match email {
        Some(email) if db::is_unique_violation(&err) => RepoError::DuplicateEmail {
            email: email.to_string(),
        },
        _ => RepoError::Store(anyhow::Error::new(err).context(op)),
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        let found = UserEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let found = UserEntity::find()
            .filter(Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("find_by_email failed")?;
        Ok(found.map(Into::into))
    }

    async fn list_all(&self) -> RepoResult<Vec<User>> {
        let rows = UserEntity::find()
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.conn)
            .await
            .context("list_all failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, new_user: NewUser) -> RepoResult<User> {
        let email = new_user.email.clone();
        let m = UserAM {
            name: Set(new_user.name),
            email: Set(new_user.email),
            ..Default::default()
        };
        let row = m
            .insert(&self.conn)
            .await
            .map_err(|e| classify_write_error(e, Some(&email), "insert failed"))?;
        Ok(row.into())
    }

    async fn update(&self, id: i64, patch: UserPatch) -> RepoResult<Option<User>> {
        let mut m = UserAM {
            id: Unchanged(id),
            ..Default::default()
        };
        if let Some(name) = patch.name {
            m.name = Set(name);
        }
        if let Some(ref email) = patch.email {
            m.email = Set(email.clone());
        }

        match m.update(&self.conn).await {
            Ok(row) => Ok(Some(row.into())),
            Err(DbErr::RecordNotUpdated | DbErr::RecordNotFound(_)) => Ok(None),
            Err(e) => Err(classify_write_error(
                e,
                patch.email.as_deref(),
                "update failed",
            )),
        }
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let res = UserEntity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete failed")?;
        Ok(res.rows_affected > 0)
    }
}
