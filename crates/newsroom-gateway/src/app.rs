use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use newsroom_core::NewsroomConfig;
use newsroom_dedup::DedupService;
use newsroom_llm::OllamaClient;
use newsroom_logstore::LogManager;
use newsroom_pipeline::JobRunner;
use newsroom_store::RecordStore;
use newsroom_vector::QdrantClient;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: NewsroomConfig,
    pub store: Arc<RecordStore>,
    pub llm: Arc<OllamaClient>,
    pub vector: Arc<QdrantClient>,
    pub dedup: Arc<DedupService>,
    pub runner: Arc<JobRunner>,
    pub logs: Arc<LogManager>,
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/statistics", get(crate::http::statistics::statistics_handler))
        .route("/comparison", get(crate::http::comparison::comparison_handler))
        .route("/scrape/{source_kind}", post(crate::http::scrape::submit_handler))
        .route("/scrape/status/{job_id}", get(crate::http::scrape::status_handler))
        .route(
            "/scrape/jobs",
            get(crate::http::scrape::list_handler).delete(crate::http::scrape::cleanup_handler),
        )
        .route(
            "/logs",
            get(crate::http::logs::get_logs_handler)
                .delete(crate::http::logs::clear_logs_handler),
        )
        .route("/sessions", get(crate::http::logs::sessions_handler))
        .route("/{source}/records", get(crate::http::records::raw_handler))
        .route("/{source}/processed", get(crate::http::records::processed_handler))
        .route("/{source}/short-form", get(crate::http::records::short_form_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
