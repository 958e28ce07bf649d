use std::sync::Arc;

use invoice_review_rust::api::{self, AppState};
use invoice_review_rust::{
    create_pool, AppConfig, DraftReconciler, IngestionBoard, LineMatcher, PgStore, PipelineClient,
    ReadinessEngine, ReviewStore,
};
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::from_env();
    info!("Starting server with config: {:?}", config);

    let pool = create_pool(&config.database.url).await?;
    info!("Database pool created");

    let store: Arc<dyn ReviewStore> = Arc::new(PgStore::new(pool));
    let state = AppState {
        matcher: Arc::new(LineMatcher::new(store.clone())),
        readiness: Arc::new(ReadinessEngine::new(store.clone())),
        reconciler: Arc::new(DraftReconciler::new(store.clone())),
        board: Arc::new(IngestionBoard::new(store)),
        pipeline: Arc::new(PipelineClient::new(&config.pipeline)),
    };

    let app = api::router(state).layer(ServiceBuilder::new());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /api/ingestions/list                          - review queue");
    info!("  GET  /api/ingestions/metrics                       - dashboard counters");
    info!("  GET  /api/ingestions/:id                           - enriched detail");
    info!("  GET  /api/ingestions/:id/items                     - catalog search");
    info!("  POST /api/ingestions/:id/ready                     - request ready");
    info!("  POST /api/ingestions/:id/start                     - pipeline trigger");
    info!("  POST /api/ingestions/:id/lines/:line_id/assign     - assign catalog item");
    info!("  POST /api/ingestions/:id/lines/:line_id/needs-create - flag for creation");
    info!("  GET  /api/lines/:line_id/candidates                - match suggestions");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
