use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bistro_core::restaurants::RestaurantQuery;
use bistro_storage::ensure_remote_schema;

use bistro_server::config::Config;
use bistro_server::context::{initialize_context, ServiceContext};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn start_sync(ctx: &ServiceContext) {
    let Some(sync) = &ctx.sync else {
        warn!("PG_CONNECTION_STRING is not set, running on the local store only");
        return;
    };

    let schema = ensure_remote_schema(&sync.remote_pool).await;
    if !schema.is_clean() {
        warn!("Remote schema finished with {} error(s)", schema.errors.len());
    }

    let import = sync.engine.import_all().await;
    if import.is_completed() {
        info!(
            "Startup import: {} rows written, {} skipped",
            import.written(),
            import.failed()
        );
    } else {
        error!("Startup import did not complete: {:?}", import.status);
    }

    sync.scheduler.start().await;
}

async fn shutdown(ctx: &ServiceContext) {
    let Some(sync) = &ctx.sync else {
        return;
    };
    sync.scheduler.stop().await;

    let report = sync.engine.export_all().await;
    if report.is_completed() {
        info!(
            "Final export: {} rows written, {} failed",
            report.written(),
            report.failed()
        );
    } else {
        warn!("Final export did not complete: {:?}", report.status);
    }
    info!(
        "Remote connections still checked out: {}",
        sync.remote_pool.active_connections()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    info!("Starting bistro-server with data dir {}", config.data_dir);
    let ctx = initialize_context(&config)?;

    start_sync(&ctx).await;

    let restaurants = ctx
        .restaurant_repository
        .search(&RestaurantQuery::default())?
        .len();
    info!("Local store ready with {} restaurants", restaurants);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    shutdown(&ctx).await;
    Ok(())
}
