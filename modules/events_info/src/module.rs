use std::sync::Arc;

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::api::rest::{openapi::ApiDoc, routes};
use crate::config::EventsInfoConfig;
use crate::contract::client::EventsInfoApi;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::EventsInfoLocalClient;
use crate::infra::storage::{
    migrations::Migrator, SeaOrmEventsRepository, SeaOrmUsersRepository,
};

/// Wires storage, domain service, REST routes and the in-process client together.
#[derive(Clone)]
pub struct EventsInfo {
    db: DatabaseConnection,
    service: Arc<Service>,
}

impl EventsInfo {
    pub fn new(db: DatabaseConnection, cfg: &EventsInfoConfig) -> Self {
        info!("Initializing events_info module");
        debug!(
            "Loaded events_info config: default_page_size={}, max_page_size={}",
            cfg.default_page_size, cfg.max_page_size
        );

        // Wire repositories (infra) to domain service (ports)
        let events = SeaOrmEventsRepository::new(db.clone());
        let users = SeaOrmUsersRepository::new(db.clone());
        let service = Service::new(Arc::new(events), Arc::new(users), ServiceConfig::from(cfg));

        Self {
            db,
            service: Arc::new(service),
        }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        info!("Running events_info database migrations");
        Migrator::up(&self.db, None).await?;
        info!("events_info database migrations completed successfully");
        Ok(())
    }

    pub fn register_rest(&self, router: axum::Router) -> axum::Router {
        info!("Registering events_info REST routes");
        routes::register_routes(router, self.service.clone())
    }

    /// Local in-process client for other modules.
    pub fn client(&self) -> Arc<dyn EventsInfoApi> {
        Arc::new(EventsInfoLocalClient::new(self.service.clone()))
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn openapi() -> utoipa::openapi::OpenApi {
        ApiDoc::openapi()
    }
}
