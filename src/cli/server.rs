//! HTTP server mode for read-only access to the analytical store

use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::query::{self, Limit, QueryContext};
use crate::store::Store;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Store file to query
    pub db_path: PathBuf,
    /// Port to listen on
    pub port: u16,
    /// CORS origins; "*" allows any
    pub allowed_origins: Vec<String>,
    /// Borough and anomaly settings for the queries
    pub context: QueryContext,
}

impl ServerConfig {
    /// Derive server settings from the pipeline configuration
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self {
            db_path: config.store.path.clone(),
            port: config.server.port,
            allowed_origins: config.server.allowed_origins.clone(),
            context: QueryContext::from_config(config),
        }
    }
}

/// App state shared across handlers
struct AppState {
    config: ServerConfig,
}

/// Optional `?limit=` parameter, validated by [`Limit`]
#[derive(Debug, Deserialize)]
struct LimitParam {
    limit: Option<String>,
}

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Build the router
pub fn router(config: ServerConfig) -> Result<Router> {
    let cors = cors_layer(&config.allowed_origins)?;
    let state = AppState { config };

    Ok(Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/api/zones/top-pickup", get(top_pickup))
        .route("/api/zones/top-dropoff", get(top_dropoff))
        .route("/api/temporal/hourly", get(hourly))
        .route("/api/temporal/day-of-week", get(day_of_week))
        .route("/api/temporal/heatmap", get(heatmap))
        .route("/api/fare-structure/breakdown", get(fare_breakdown))
        .route("/api/fare-structure/surcharges", get(surcharges))
        .route("/api/airport/comparison", get(airport_comparison))
        .route("/api/airport/top-origins", get(airport_origins))
        .route("/api/od-flows/top-routes", get(top_routes))
        .route("/api/vendors/performance", get(vendors))
        .route("/api/payment-tipping/by-payment-type", get(tipping))
        .route("/api/anomalies/high-fare-per-mile", get(high_fare_per_mile))
        .route("/api/anomalies/summary", get(anomaly_summary))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(Arc::new(state)))
}

/// Start the HTTP server
pub async fn serve(config: ServerConfig) -> Result<()> {
    let port = config.port;
    if !config.db_path.exists() {
        tracing::warn!(
            store = %config.db_path.display(),
            "Store not found; queries will fail until the pipeline has run"
        );
    }
    let app = router(config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return Ok(layer.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|e| Error::invalid_value("server.allowed_origins", format!("'{o}': {e}")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

// ============================================================================
// Response plumbing
// ============================================================================

fn respond<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::success(data))).into_response(),
        Err(e) => {
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                tracing::error!(error = %e, "Query failed");
            }
            (status, Json(ApiResponse::<()>::error(e.to_string()))).into_response()
        }
    }
}

/// Run a query on a fresh read-only connection off the async runtime
async fn run_query<T, F>(state: &AppState, query: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce(&Store, &QueryContext) -> Result<T> + Send + 'static,
{
    let path = state.config.db_path.clone();
    let context = state.config.context.clone();

    let result = tokio::task::spawn_blocking(move || {
        let store = Store::open_read_only(&path)?;
        query(&store, &context)
    })
    .await
    .unwrap_or_else(|e| Err(Error::Other(format!("Query task failed: {e}"))));

    respond(result)
}

/// Validate `limit` or answer 400
macro_rules! limit_or_reject {
    ($param:expr, $default:expr) => {
        match Limit::parse_or($param.limit.as_deref(), $default) {
            Ok(limit) => limit,
            Err(e) => return respond::<()>(Err(e)),
        }
    };
}

// ============================================================================
// Handlers
// ============================================================================

/// Endpoint index
async fn index() -> impl IntoResponse {
    Json(json!({
        "message": "Taxi Analytics API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/stats": "Overall statistics",
            "/api/zones": "Zone popularity",
            "/api/temporal": "Temporal demand",
            "/api/fare-structure": "Fare breakdown",
            "/api/airport": "Airport trips",
            "/api/od-flows": "Origin-destination flows",
            "/api/vendors": "Vendor performance",
            "/api/payment-tipping": "Payment and tipping",
            "/api/anomalies": "Outliers and anomalies"
        }
    }))
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn stats(State(state): State<Arc<AppState>>) -> Response {
    run_query(&state, |store, _| query::summary(store)).await
}

async fn top_pickup(State(state): State<Arc<AppState>>, Query(p): Query<LimitParam>) -> Response {
    let limit = limit_or_reject!(p, 20);
    run_query(&state, move |store, ctx| {
        Ok(json!({ "zones": query::top_pickup_zones(store, ctx, limit)? }))
    })
    .await
}

async fn top_dropoff(State(state): State<Arc<AppState>>, Query(p): Query<LimitParam>) -> Response {
    let limit = limit_or_reject!(p, 20);
    run_query(&state, move |store, ctx| {
        Ok(json!({ "zones": query::top_dropoff_zones(store, ctx, limit)? }))
    })
    .await
}

async fn hourly(State(state): State<Arc<AppState>>) -> Response {
    run_query(&state, |store, _| {
        Ok(json!({ "hourly_data": query::hourly_demand(store)? }))
    })
    .await
}

async fn day_of_week(State(state): State<Arc<AppState>>) -> Response {
    run_query(&state, |store, _| {
        Ok(json!({ "day_of_week_data": query::day_of_week_demand(store)? }))
    })
    .await
}

async fn heatmap(State(state): State<Arc<AppState>>) -> Response {
    run_query(&state, |store, _| {
        Ok(json!({ "heatmap_data": query::temporal_heatmap(store)? }))
    })
    .await
}

async fn fare_breakdown(State(state): State<Arc<AppState>>) -> Response {
    run_query(&state, query::fare_breakdown).await
}

async fn surcharges(State(state): State<Arc<AppState>>) -> Response {
    run_query(&state, query::surcharge_frequency).await
}

async fn airport_comparison(State(state): State<Arc<AppState>>) -> Response {
    run_query(&state, |store, ctx| {
        Ok(json!({ "comparison": query::airport_comparison(store, ctx)? }))
    })
    .await
}

async fn airport_origins(
    State(state): State<Arc<AppState>>,
    Query(p): Query<LimitParam>,
) -> Response {
    let limit = limit_or_reject!(p, 20);
    run_query(&state, move |store, ctx| {
        Ok(json!({ "top_origins": query::top_airport_origins(store, ctx, limit)? }))
    })
    .await
}

async fn top_routes(State(state): State<Arc<AppState>>, Query(p): Query<LimitParam>) -> Response {
    let limit = limit_or_reject!(p, 50);
    run_query(&state, move |store, ctx| {
        Ok(json!({ "top_routes": query::top_routes(store, ctx, limit)? }))
    })
    .await
}

async fn vendors(State(state): State<Arc<AppState>>) -> Response {
    run_query(&state, |store, _| {
        Ok(json!({ "vendors": query::vendor_performance(store)? }))
    })
    .await
}

async fn tipping(State(state): State<Arc<AppState>>) -> Response {
    run_query(&state, |store, ctx| {
        Ok(json!({ "payment_types": query::tipping_by_payment_type(store, ctx)? }))
    })
    .await
}

async fn high_fare_per_mile(
    State(state): State<Arc<AppState>>,
    Query(p): Query<LimitParam>,
) -> Response {
    let limit = limit_or_reject!(p, 100);
    run_query(&state, move |store, ctx| {
        Ok(json!({ "anomalies": query::high_fare_per_mile(store, ctx, limit)? }))
    })
    .await
}

async fn anomaly_summary(State(state): State<Arc<AppState>>) -> Response {
    run_query(&state, query::anomaly_summary).await
}
