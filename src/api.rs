// 🌐 REST API - corporation search endpoints (Axum)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::record::CorporateRecord;
use crate::service::CorporationService;

/// Body of the liveness endpoint
pub const HEALTH_MESSAGE: &str = "API server is running";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: CorporationService,
}

impl AppState {
    pub fn new(service: CorporationService) -> Self {
        AppState { service }
    }
}

/// Error body for 404 / 500
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Store failure inside a handler; rendered as 500
pub struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Request failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("{:#}", self.0),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Run a store-backed call on the blocking pool; SQLite access is synchronous
async fn run_blocking<T, F>(service: CorporationService, f: F) -> ApiResult<T>
where
    F: FnOnce(&CorporationService) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| anyhow::anyhow!("Query task failed: {}", e))?;

    Ok(result?)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/corporations/search?q= - Search by name or english name
async fn search_corporations(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<CorporateRecord>>> {
    let found = run_blocking(state.service, move |s| s.search_by_name(params.q.as_deref())).await?;
    Ok(Json(found))
}

/// GET /api/corporations/:code - Single corporation by code
async fn get_corporation(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Response> {
    let lookup = code.clone();
    let found = run_blocking(state.service, move |s| s.get_by_code(&lookup)).await?;

    let response = match found {
        Some(record) => Json(record).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Corporation {} not found", code),
            }),
        )
            .into_response(),
    };

    Ok(response)
}

/// GET /api/corporations/stock/:stock_code - Corporations with this stock code
async fn get_corporations_by_stock_code(
    State(state): State<AppState>,
    Path(stock_code): Path<String>,
) -> ApiResult<Json<Vec<CorporateRecord>>> {
    let found =
        run_blocking(state.service, move |s| s.search_by_short_code(Some(&stock_code))).await?;
    Ok(Json(found))
}

/// GET /api/corporations/count - Total number of corporations
async fn get_total_count(State(state): State<AppState>) -> ApiResult<Json<i64>> {
    let count = run_blocking(state.service, |s| s.count()).await?;
    Ok(Json(count))
}

/// GET /api/corporations/health - Liveness check
async fn health_check() -> &'static str {
    HEALTH_MESSAGE
}

// ============================================================================
// Pages
// ============================================================================

/// GET / - Main page
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

/// GET /search - Search page
async fn serve_search() -> impl IntoResponse {
    Html(include_str!("../web/search.html"))
}

// ============================================================================
// Router
// ============================================================================

/// Build the full application router
///
/// `web_dir` is served under `/static`.
pub fn build_router(state: AppState, web_dir: &FsPath) -> Router {
    let api_routes = Router::new()
        .route("/search", get(search_corporations))
        .route("/count", get(get_total_count))
        .route("/health", get(health_check))
        .route("/stock/:stock_code", get(get_corporations_by_stock_code))
        .route("/:code", get(get_corporation))
        .layer(CorsLayer::permissive())
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .route("/search", get(serve_search))
        .nest("/api/corporations", api_routes)
        .nest_service("/static", ServeDir::new(web_dir))
        .layer(TraceLayer::new_for_http())
}
