use std::sync::Arc;

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::config::UsersConfig;
use crate::domain::service::Service;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::SeaOrmUsersRepository;

/// Wires the users module onto an already opened database handle.
///
/// The handle stays owned by the caller, which also closes it; the module
/// only keeps a cloned SeaORM connection inside its repository.
#[derive(Clone)]
pub struct UsersModule {
    service: Service,
    config: UsersConfig,
}

impl UsersModule {
    /// Run migrations, then build the service over the handle's connection.
    pub async fn init(db: &db::DbHandle, config: UsersConfig) -> anyhow::Result<Self> {
        info!("Initializing users module");
        debug!(
            "Loaded users config: max_name_length={}, max_email_length={}",
            config.max_name_length, config.max_email_length
        );

        Self::migrate(db).await?;

        // Wire repository (infra) to domain service (port)
        let repo = SeaOrmUsersRepository::new(db.sea());
        let service = Service::new(Arc::new(repo));

        Ok(Self { service, config })
    }

    pub async fn migrate(db: &db::DbHandle) -> anyhow::Result<()> {
        info!("Running users database migrations");
        Migrator::up(db.seaorm(), None)
            .await
            .context("users migrations failed")?;
        info!("Users database migrations completed successfully");
        Ok(())
    }

    pub fn service(&self) -> &Service {
        &self.service
    }

    pub fn config(&self) -> &UsersConfig {
        &self.config
    }
}
