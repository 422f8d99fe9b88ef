use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tilecount_core::{
    EstimateError, EstimateResult, Estimator, FloorConfig, FloorResult, PatternLayout,
    SurfaceConfig,
};
use tokio::sync::Mutex;
use tokio::task::JoinError;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// One estimator, and with it one cache, for the whole server.
type SharedEstimator = Arc<Mutex<Estimator<PatternLayout>>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Tile Estimator API");

    let app = app(Arc::new(Mutex::new(Estimator::new(PatternLayout::new()))));

    let addr = std::env::var("TILECOUNT_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on http://{}", addr);
    info!("Try: curl http://{}/api/health", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app(estimator: SharedEstimator) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/estimate", post(estimate))
        .route("/api/floor", post(estimate_floor))
        .route("/api/cache/invalidate", post(invalidate_cache))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(estimator)
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "tilecount-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Single surface estimate
async fn estimate(
    State(estimator): State<SharedEstimator>,
    Json(config): Json<SurfaceConfig>,
) -> Result<Json<EstimateResult>, AppError> {
    info!(
        "Received estimate request for surface {:?}",
        config.surface.as_ref().map(|s| s.id.as_str())
    );

    let result = tokio::task::spawn_blocking(move || {
        estimator.blocking_lock().compute_for_surface(&config)
    })
    .await??;

    info!(
        "Estimate complete: {} tiles to buy, {:.2}% waste",
        result.summary.purchased_with_reserve, result.summary.waste_percentage
    );

    Ok(Json(result))
}

/// Floor estimate, surfaces in request order
async fn estimate_floor(
    State(estimator): State<SharedEstimator>,
    Json(floor): Json<FloorConfig>,
) -> Result<Json<FloorResult>, AppError> {
    info!(
        "Received floor request with {} surfaces (sharing offcuts: {})",
        floor.surfaces.len(),
        floor.share_offcuts
    );

    let result =
        tokio::task::spawn_blocking(move || estimator.blocking_lock().compute_for_floor(&floor))
            .await??;

    info!(
        "Floor complete: {} tiles to buy, {} surfaces failed",
        result.totals.purchased_with_reserve, result.totals.surfaces_failed
    );

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct InvalidateRequest {
    /// Surface to forget; all surfaces when absent
    #[serde(default)]
    surface_id: Option<String>,
}

async fn invalidate_cache(
    State(estimator): State<SharedEstimator>,
    Json(request): Json<InvalidateRequest>,
) -> Json<serde_json::Value> {
    let removed = estimator
        .lock()
        .await
        .invalidate(request.surface_id.as_deref());

    info!("Invalidated {} cached estimates", removed);

    Json(json!({ "removed": removed }))
}

/// Application error type
struct AppError(anyhow::Error);

impl From<EstimateError> for AppError {
    fn from(err: EstimateError) -> Self {
        AppError(err.into())
    }
}

impl From<JoinError> for AppError {
    fn from(err: JoinError) -> Self {
        AppError(err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request error: {}", self.0);

        let status = match self.0.downcast_ref::<EstimateError>() {
            Some(EstimateError::NoTileableArea(_) | EstimateError::TileGenerationFailed(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Some(_) => StatusCode::BAD_REQUEST,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(json!({
                "error": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app() -> Router {
        app(Arc::new(Mutex::new(Estimator::new(PatternLayout::new()))))
    }

    async fn post_json(
        app: Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn room(id: &str, width: f64, height: f64) -> serde_json::Value {
        json!({
            "surface": {
                "id": id,
                "boundary": [[0.0, 0.0], [width, 0.0], [width, height], [0.0, height]],
            },
            "tile": {"width": 30.0, "height": 30.0},
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_estimate_grid_room() {
        let (status, body) =
            post_json(test_app(), "/api/estimate", room("hall", 90.0, 60.0)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["surface_id"], "hall");
        assert_eq!(body["summary"]["full_tiles"], 6);
        assert_eq!(body["summary"]["purchased_with_reserve"], 6);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let mut missing = room("hall", 90.0, 60.0);
        missing["surface"] = serde_json::Value::Null;
        let (status, body) = post_json(test_app(), "/api/estimate", missing).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No surface selected");

        let mut hexagon = room("hall", 90.0, 60.0);
        hexagon["tile"]["shape"] = json!("hexagon");
        let (status, _) = post_json(test_app(), "/api/estimate", hexagon).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_oversized_layout_is_rejected_and_server_stays_responsive() {
        let app = test_app();

        let mut tiny = room("hall", 100.0, 100.0);
        tiny["tile"] = json!({"width": 1e-6, "height": 1e-6});
        let (status, body) = post_json(app.clone(), "/api/estimate", tiny).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("tile positions"));

        let (status, _) = post_json(app, "/api/estimate", room("hall", 90.0, 60.0)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_floor_and_invalidate_share_one_cache() {
        let app = test_app();

        let floor = json!({
            "id": "ground",
            "surfaces": [room("a", 60.0, 60.0), room("b", 45.0, 30.0)],
        });
        let (status, body) = post_json(app.clone(), "/api/floor", floor).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totals"]["surfaces_computed"], 2);
        assert_eq!(body["surfaces"][0]["status"], "computed");

        let (_, body) = post_json(
            app.clone(),
            "/api/cache/invalidate",
            json!({"surface_id": "a"}),
        )
        .await;
        assert_eq!(body["removed"], 1);

        let (_, body) = post_json(app, "/api/cache/invalidate", json!({})).await;
        assert_eq!(body["removed"], 1);
    }
}
