use cabbuddy::config::AppConfig;
use cabbuddy::db::{init_pool, run_migrations};
use cabbuddy::error::AppError;
use cabbuddy::routes::create_router;
use cabbuddy::state::AppState;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;

    let state = if config.uses_memory_store() {
        warn!("DATABASE_URL=memory, entries will not survive a restart");
        AppState::in_memory(&config)
    } else {
        let db = init_pool(&config.database_url).await?;
        if let Err(err) = run_migrations(&db).await {
            error!("migration failed: {err:?}");
            return Err(err);
        }
        AppState::new(&config, db)
    };

    let stored = state.engine.store().count().await?;
    info!(stored, retention_months = config.retention_months, "entry store ready");

    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,cabbuddy=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
