use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use bistro_core::clients::{discovery_feed, ClientRepositoryTrait};
use bistro_core::favorites::FavoriteRepositoryTrait;
use bistro_core::reports::ReportRepositoryTrait;
use bistro_core::restaurants::{RestaurantRepositoryTrait, RestaurantSummary};
use bistro_core::reviews::ReviewRepositoryTrait;
use bistro_core::sync::{SyncEngine, SyncScheduler};
use bistro_storage::clients::ClientRepository;
use bistro_storage::favorites::FavoriteRepository;
use bistro_storage::reports::ReportRepository;
use bistro_storage::restaurants::RestaurantRepository;
use bistro_storage::reviews::ReviewRepository;
use bistro_storage::{db, ensure_local_schema, PgSyncStore, RemotePool, SqliteSyncStore};

use crate::config::Config;

/// Replication pieces, present only when a remote store is configured.
pub struct SyncRuntime {
    pub remote_pool: RemotePool,
    pub engine: Arc<SyncEngine>,
    pub scheduler: SyncScheduler,
}

pub struct ServiceContext {
    pub restaurant_repository: Arc<dyn RestaurantRepositoryTrait>,
    pub client_repository: Arc<dyn ClientRepositoryTrait>,
    pub favorite_repository: Arc<dyn FavoriteRepositoryTrait>,
    pub review_repository: Arc<dyn ReviewRepositoryTrait>,
    pub report_repository: Arc<dyn ReportRepositoryTrait>,
    pub sync: Option<SyncRuntime>,
}

impl ServiceContext {
    pub fn discovery_feed(&self, client_id: i32) -> bistro_core::Result<Vec<RestaurantSummary>> {
        discovery_feed(
            self.client_repository.as_ref(),
            self.restaurant_repository.as_ref(),
            client_id,
        )
    }
}

/// Opens the local store, applies its schema and wires replication.
pub fn initialize_context(config: &Config) -> Result<ServiceContext> {
    let db_path = db::init(&config.data_dir).context("Failed to prepare the data directory")?;
    let pool = db::create_pool(&db_path).context("Failed to open the local database")?;

    let schema = ensure_local_schema(&pool);
    if !schema.is_clean() {
        warn!("Local schema finished with {} error(s)", schema.errors.len());
    }

    let writer = db::spawn_writer(pool.as_ref().clone());
    let restaurant_repository = Arc::new(RestaurantRepository::new(
        Arc::clone(&pool),
        writer.clone(),
    ));
    let client_repository = Arc::new(ClientRepository::new(Arc::clone(&pool), writer.clone()));
    let favorite_repository = Arc::new(FavoriteRepository::new(Arc::clone(&pool), writer.clone()));
    let review_repository = Arc::new(ReviewRepository::new(Arc::clone(&pool), writer.clone()));
    let report_repository = Arc::new(ReportRepository::new(Arc::clone(&pool), writer.clone()));

    let sync = config.remote.as_ref().map(|remote| {
        let remote_pool = RemotePool::new(remote);
        let engine = Arc::new(SyncEngine::with_retry_policy(
            Arc::new(SqliteSyncStore::new(Arc::clone(&pool), writer.clone())),
            Arc::new(PgSyncStore::new(remote_pool.clone())),
            config.sync.retry,
        ));
        let scheduler = SyncScheduler::new(Arc::clone(&engine), config.sync.schedule);
        info!(
            "Remote sync enabled: pool max {} connections, export every {:?}",
            remote_pool.max_size(),
            config.sync.schedule.interval()
        );
        SyncRuntime {
            remote_pool,
            engine,
            scheduler,
        }
    });

    Ok(ServiceContext {
        restaurant_repository,
        client_repository,
        favorite_repository,
        review_repository,
        report_repository,
        sync,
    })
}
