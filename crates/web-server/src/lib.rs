use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use configuration::Config;
use database::SalesRepository;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub repository: SalesRepository,
}

/// The main function to configure and run the web server.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    // Tracing is initialized by the binary; this function only uses it.
    dotenvy::dotenv().ok();
    let db_pool = database::connect().await?;
    database::run_migrations(&db_pool).await?;
    let repository = SalesRepository::new(db_pool);

    let app_state = Arc::new(AppState { repository });
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    // --- DEFINE THE APPLICATION ROUTES ---
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/years", get(handlers::get_years))
        .route("/api/sections", get(handlers::get_sections))
        .route("/api/comparison", get(handlers::get_comparison))
        .route(
            "/api/comparison/sections",
            get(handlers::get_section_comparison),
        )
        .route(
            "/api/series/monthly-revenue",
            get(handlers::get_monthly_revenue),
        )
        .route(
            "/api/series/monthly-average-ticket",
            get(handlers::get_monthly_average_ticket),
        )
        .route("/api/heatmap", get(handlers::get_heatmap))
        .route("/api/days", get(handlers::get_daily_summaries))
        .route("/api/days/top", get(handlers::get_top_days))
        .route("/api/uploads", post(handlers::upload_workbook))
        .route("/api/records", delete(handlers::clear_records))
        .with_state(app_state)
        .layer(cors)
        // This middleware will automatically log information about every
        // incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config.upload.max_body_bytes));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
